use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for scored assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat key-value record as produced by intake-form submission, before schema checks.
pub type RawResponses = serde_json::Map<String, serde_json::Value>;

/// Age at current arrest, collapsed into the three brackets the instrument scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AgeBracket {
    TwentyOrYounger,
    TwentyOneToTwentyTwo,
    TwentyThreeOrOlder,
}

impl AgeBracket {
    pub const fn ordinal(self) -> u8 {
        match self {
            AgeBracket::TwentyOrYounger => 0,
            AgeBracket::TwentyOneToTwentyTwo => 1,
            AgeBracket::TwentyThreeOrOlder => 2,
        }
    }

    pub const fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(AgeBracket::TwentyOrYounger),
            1 => Some(AgeBracket::TwentyOneToTwentyTwo),
            2 => Some(AgeBracket::TwentyThreeOrOlder),
            _ => None,
        }
    }
}

impl TryFrom<u8> for AgeBracket {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or_else(|| format!("age bracket {value} is outside 0..=2"))
    }
}

impl From<AgeBracket> for u8 {
    fn from(value: AgeBracket) -> Self {
        value.ordinal()
    }
}

/// Factors that can carry points on one of the three scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskFactor {
    AgeBracket,
    CurrentViolentOffense,
    CurrentViolentOffenseAndYoung,
    PendingCharge,
    PriorMisdemeanor,
    PriorFelony,
    PriorConviction,
    PriorViolentConvictionCount,
    #[serde(rename = "priorFTARecentCount")]
    PriorFtaRecentCount,
    #[serde(rename = "priorFTAOld")]
    PriorFtaOld,
    PriorSentenceToIncarceration,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 11] = [
        RiskFactor::AgeBracket,
        RiskFactor::CurrentViolentOffense,
        RiskFactor::CurrentViolentOffenseAndYoung,
        RiskFactor::PendingCharge,
        RiskFactor::PriorMisdemeanor,
        RiskFactor::PriorFelony,
        RiskFactor::PriorConviction,
        RiskFactor::PriorViolentConvictionCount,
        RiskFactor::PriorFtaRecentCount,
        RiskFactor::PriorFtaOld,
        RiskFactor::PriorSentenceToIncarceration,
    ];
}

/// Boolean facts addressable from predicates: scored flags plus the auxiliary charge flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    CurrentViolentOffense,
    CurrentViolentOffenseAndYoung,
    PendingCharge,
    PriorMisdemeanor,
    PriorFelony,
    PriorConviction,
    #[serde(rename = "priorFTAOld")]
    PriorFtaOld,
    PriorSentenceToIncarceration,
    Extradited,
    DmfStep2Charges,
    DmfStep4Charges,
    DmfSecondaryReleaseCharges,
}

/// Count-valued facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Count {
    PriorViolentConvictionCount,
    #[serde(rename = "priorFTARecentCount")]
    PriorFtaRecentCount,
}

/// Value side of a `(factor, value)` weight key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Flag(bool),
    Level(u32),
}

impl fmt::Display for FactorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorValue::Flag(value) => write!(f, "{value}"),
            FactorValue::Level(value) => write!(f, "{value}"),
        }
    }
}

/// Typed risk-factor record. Only the schema check builds these from intake data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactorResponses {
    pub age_bracket: AgeBracket,
    pub current_violent_offense: bool,
    pub current_violent_offense_and_young: bool,
    pub pending_charge: bool,
    pub prior_misdemeanor: bool,
    pub prior_felony: bool,
    pub prior_conviction: bool,
    pub prior_violent_conviction_count: u32,
    #[serde(rename = "priorFTARecentCount")]
    pub prior_fta_recent_count: u32,
    #[serde(rename = "priorFTAOld")]
    pub prior_fta_old: bool,
    pub prior_sentence_to_incarceration: bool,
    pub extradited: bool,
    pub dmf_step2_charges: bool,
    pub dmf_step4_charges: bool,
    #[serde(default)]
    pub dmf_secondary_release_charges: bool,
}

impl RiskFactorResponses {
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::CurrentViolentOffense => self.current_violent_offense,
            Flag::CurrentViolentOffenseAndYoung => self.current_violent_offense_and_young,
            Flag::PendingCharge => self.pending_charge,
            Flag::PriorMisdemeanor => self.prior_misdemeanor,
            Flag::PriorFelony => self.prior_felony,
            Flag::PriorConviction => self.prior_conviction,
            Flag::PriorFtaOld => self.prior_fta_old,
            Flag::PriorSentenceToIncarceration => self.prior_sentence_to_incarceration,
            Flag::Extradited => self.extradited,
            Flag::DmfStep2Charges => self.dmf_step2_charges,
            Flag::DmfStep4Charges => self.dmf_step4_charges,
            Flag::DmfSecondaryReleaseCharges => self.dmf_secondary_release_charges,
        }
    }

    pub fn count(&self, count: Count) -> u32 {
        match count {
            Count::PriorViolentConvictionCount => self.prior_violent_conviction_count,
            Count::PriorFtaRecentCount => self.prior_fta_recent_count,
        }
    }

    /// Weight-table key for `factor`; counts are clamped to `cap` first.
    pub fn factor_value(&self, factor: RiskFactor, cap: u32) -> FactorValue {
        match factor {
            RiskFactor::AgeBracket => FactorValue::Level(u32::from(self.age_bracket.ordinal())),
            RiskFactor::CurrentViolentOffense => FactorValue::Flag(self.current_violent_offense),
            RiskFactor::CurrentViolentOffenseAndYoung => {
                FactorValue::Flag(self.current_violent_offense_and_young)
            }
            RiskFactor::PendingCharge => FactorValue::Flag(self.pending_charge),
            RiskFactor::PriorMisdemeanor => FactorValue::Flag(self.prior_misdemeanor),
            RiskFactor::PriorFelony => FactorValue::Flag(self.prior_felony),
            RiskFactor::PriorConviction => FactorValue::Flag(self.prior_conviction),
            RiskFactor::PriorViolentConvictionCount => {
                FactorValue::Level(self.prior_violent_conviction_count.min(cap))
            }
            RiskFactor::PriorFtaRecentCount => {
                FactorValue::Level(self.prior_fta_recent_count.min(cap))
            }
            RiskFactor::PriorFtaOld => FactorValue::Flag(self.prior_fta_old),
            RiskFactor::PriorSentenceToIncarceration => {
                FactorValue::Flag(self.prior_sentence_to_incarceration)
            }
        }
    }
}

/// A record that passed both the schema and the logical-consistency checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidResponses(RiskFactorResponses);

impl ValidResponses {
    pub(crate) fn new(responses: RiskFactorResponses) -> Self {
        Self(responses)
    }

    pub fn responses(&self) -> &RiskFactorResponses {
        &self.0
    }

    pub fn into_inner(self) -> RiskFactorResponses {
        self.0
    }
}

/// The three scales produced by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Nca,
    Fta,
    Nvca,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::Nca, Scale::Fta, Scale::Nvca];

    pub const fn label(self) -> &'static str {
        match self {
            Scale::Nca => "nca",
            Scale::Fta => "fta",
            Scale::Nvca => "nvca",
        }
    }
}

/// Scales reported on the 1-6 ordinal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdinalScale {
    Nca,
    Fta,
}

/// Release recommendation: a tier identifier plus condition keys for the reporting layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub release_type: String,
    pub conditions: Vec<String>,
}
