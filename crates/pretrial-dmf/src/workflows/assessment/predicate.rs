use serde::{Deserialize, Serialize};

use super::domain::{AgeBracket, Count, Flag, OrdinalScale, RiskFactorResponses};

/// Declarative condition over a response record and, once scored, its scales.
///
/// Consistency rules, the NVCA overlay and override triggers are all expressed with this
/// type so that jurisdictions can ship them as configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Flag { flag: Flag },
    CountAtLeast { count: Count, min: u32 },
    AgeBracket { bracket: AgeBracket },
    NvcaFlag,
    ScaleAtMost { scale: OrdinalScale, max: u8 },
    ScaleAtLeast { scale: OrdinalScale, min: u8 },
    Not { predicate: Box<Predicate> },
    All { predicates: Vec<Predicate> },
    Any { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn flag(flag: Flag) -> Self {
        Predicate::Flag { flag }
    }

    pub fn count_at_least(count: Count, min: u32) -> Self {
        Predicate::CountAtLeast { count, min }
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All {
            predicates: predicates.into_iter().collect(),
        }
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any {
            predicates: predicates.into_iter().collect(),
        }
    }

    /// Whether this predicate, or any nested one, reads the scored scales.
    pub fn reads_scales(&self) -> bool {
        match self {
            Predicate::NvcaFlag | Predicate::ScaleAtMost { .. } | Predicate::ScaleAtLeast { .. } => {
                true
            }
            Predicate::Flag { .. } | Predicate::CountAtLeast { .. } | Predicate::AgeBracket { .. } => {
                false
            }
            Predicate::Not { predicate } => predicate.reads_scales(),
            Predicate::All { predicates } | Predicate::Any { predicates } => {
                predicates.iter().any(Predicate::reads_scales)
            }
        }
    }

    /// Scale predicates are false while `facts` carries no scale readout, so predicates run
    /// before scoring must not read scales (see [`Predicate::reads_scales`]).
    pub fn evaluate(&self, facts: &Facts<'_>) -> bool {
        match self {
            Predicate::Flag { flag } => facts.responses.flag(*flag),
            Predicate::CountAtLeast { count, min } => facts.responses.count(*count) >= *min,
            Predicate::AgeBracket { bracket } => facts.responses.age_bracket == *bracket,
            Predicate::NvcaFlag => facts.scales.is_some_and(|scales| scales.nvca_flag),
            Predicate::ScaleAtMost { scale, max } => facts
                .scales
                .is_some_and(|scales| scales.ordinal(*scale) <= *max),
            Predicate::ScaleAtLeast { scale, min } => facts
                .scales
                .is_some_and(|scales| scales.ordinal(*scale) >= *min),
            Predicate::Not { predicate } => !predicate.evaluate(facts),
            Predicate::All { predicates } => predicates.iter().all(|p| p.evaluate(facts)),
            Predicate::Any { predicates } => predicates.iter().any(|p| p.evaluate(facts)),
        }
    }
}

/// Scored scales as seen by override predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleReadout {
    pub nca_scale: u8,
    pub fta_scale: u8,
    pub nvca_flag: bool,
}

impl ScaleReadout {
    pub fn ordinal(&self, scale: OrdinalScale) -> u8 {
        match scale {
            OrdinalScale::Nca => self.nca_scale,
            OrdinalScale::Fta => self.fta_scale,
        }
    }
}

/// Evaluation context for predicates.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    responses: &'a RiskFactorResponses,
    scales: Option<ScaleReadout>,
}

impl<'a> Facts<'a> {
    pub fn responses(responses: &'a RiskFactorResponses) -> Self {
        Self {
            responses,
            scales: None,
        }
    }

    pub fn scored(responses: &'a RiskFactorResponses, scales: ScaleReadout) -> Self {
        Self {
            responses,
            scales: Some(scales),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses() -> RiskFactorResponses {
        RiskFactorResponses {
            age_bracket: AgeBracket::TwentyThreeOrOlder,
            current_violent_offense: true,
            current_violent_offense_and_young: false,
            pending_charge: false,
            prior_misdemeanor: true,
            prior_felony: false,
            prior_conviction: true,
            prior_violent_conviction_count: 2,
            prior_fta_recent_count: 0,
            prior_fta_old: false,
            prior_sentence_to_incarceration: false,
            extradited: false,
            dmf_step2_charges: false,
            dmf_step4_charges: false,
            dmf_secondary_release_charges: false,
        }
    }

    #[test]
    fn composite_predicates_follow_boolean_logic() {
        let responses = responses();
        let facts = Facts::responses(&responses);

        let overlay = Predicate::all([
            Predicate::flag(Flag::CurrentViolentOffense),
            Predicate::count_at_least(Count::PriorViolentConvictionCount, 1),
        ]);
        assert!(overlay.evaluate(&facts));
        assert!(!Predicate::not(overlay).evaluate(&facts));
        assert!(!Predicate::any(Vec::new()).evaluate(&facts));
        assert!(Predicate::all(Vec::new()).evaluate(&facts));
    }

    #[test]
    fn scale_predicates_need_a_readout() {
        let responses = responses();
        let unscored = Facts::responses(&responses);
        let scored = Facts::scored(
            &responses,
            ScaleReadout {
                nca_scale: 3,
                fta_scale: 5,
                nvca_flag: true,
            },
        );

        let low_nca = Predicate::ScaleAtMost {
            scale: OrdinalScale::Nca,
            max: 3,
        };
        assert!(!low_nca.evaluate(&unscored));
        assert!(low_nca.evaluate(&scored));
        assert!(!Predicate::NvcaFlag.evaluate(&unscored));
        assert!(Predicate::NvcaFlag.evaluate(&scored));
        assert!(!Predicate::ScaleAtMost {
            scale: OrdinalScale::Fta,
            max: 4
        }
        .evaluate(&scored));
    }

    #[test]
    fn nested_scale_reads_are_detected() {
        let negated_flag = Predicate::not(Predicate::NvcaFlag);
        let response_only = Predicate::all([
            Predicate::flag(Flag::Extradited),
            Predicate::not(Predicate::count_at_least(Count::PriorFtaRecentCount, 2)),
        ]);

        assert!(negated_flag.reads_scales());
        assert!(Predicate::any([response_only.clone(), negated_flag]).reads_scales());
        assert!(!response_only.reads_scales());
    }

    #[test]
    fn predicates_deserialize_from_tagged_json() {
        let raw = r#"{
            "kind": "any",
            "predicates": [
                { "kind": "flag", "flag": "dmfStep2Charges" },
                { "kind": "all", "predicates": [
                    { "kind": "nvca_flag" },
                    { "kind": "scale_at_least", "scale": "fta", "min": 4 }
                ] },
                { "kind": "age_bracket", "bracket": 0 }
            ]
        }"#;

        let predicate: Predicate = serde_json::from_str(raw).expect("predicate parses");
        assert_eq!(
            predicate,
            Predicate::any([
                Predicate::flag(Flag::DmfStep2Charges),
                Predicate::all([
                    Predicate::NvcaFlag,
                    Predicate::ScaleAtLeast {
                        scale: OrdinalScale::Fta,
                        min: 4
                    },
                ]),
                Predicate::AgeBracket {
                    bracket: AgeBracket::TwentyOrYounger
                },
            ])
        );
    }
}
