use std::collections::BTreeMap;

use serde_json::Value;

use super::domain::{
    AgeBracket, Count, FactorValue, Flag, RawResponses, RiskFactorResponses, ValidResponses,
};
use super::error::{EvaluationError, MalformedInput, SchemaError, ValidationError};
use super::predicate::{Facts, Predicate};

/// Declared domain of an intake field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Flag,
    Ordinal { max: u32 },
    Count,
}

impl FieldKind {
    fn expected(self) -> &'static str {
        match self {
            FieldKind::Flag => "a boolean",
            FieldKind::Ordinal { .. } => "an ordinal category",
            FieldKind::Count => "a non-negative integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Value used when the key is absent. Fields without one are required.
    pub default: Option<FactorValue>,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    const fn optional_flag(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Flag,
            default: Some(FactorValue::Flag(false)),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// An implication checked against every record: `when` holding without `require` is illogical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyRule {
    pub id: &'static str,
    pub when: Predicate,
    pub require: Predicate,
}

impl ConsistencyRule {
    fn violated_by(&self, facts: &Facts<'_>) -> bool {
        self.when.evaluate(facts) && !self.require.evaluate(facts)
    }
}

/// Closed description of the intake record plus its ordered consistency rules.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    fields: Vec<FieldSpec>,
    rules: Vec<ConsistencyRule>,
}

impl Default for ResponseSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl ResponseSchema {
    pub fn standard() -> Self {
        Self {
            fields: standard_fields(),
            rules: standard_rules(),
        }
    }

    /// Append a consistency rule; rules run in insertion order.
    pub fn with_rule(mut self, rule: ConsistencyRule) -> Result<Self, SchemaError> {
        if rule.when.reads_scales() || rule.require.reads_scales() {
            return Err(SchemaError::ScaleReference {
                rule_id: rule.id.to_string(),
            });
        }
        self.rules.push(rule);
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn rules(&self) -> &[ConsistencyRule] {
        &self.rules
    }

    /// Logical-consistency check for an already typed record.
    pub fn check(&self, responses: RiskFactorResponses) -> Result<ValidResponses, ValidationError> {
        let facts = Facts::responses(&responses);
        if let Some(rule) = self.rules.iter().find(|rule| rule.violated_by(&facts)) {
            return Err(ValidationError::IllogicalCombination {
                rule_id: rule.id.to_string(),
            });
        }
        Ok(ValidResponses::new(responses))
    }

    fn normalize(
        &self,
        raw: &RawResponses,
    ) -> Result<BTreeMap<&'static str, FactorValue>, MalformedInput> {
        if let Some(unknown) = raw
            .keys()
            .find(|key| !self.fields.iter().any(|field| field.name == key.as_str()))
        {
            return Err(MalformedInput::UnknownField(unknown.clone()));
        }

        let mut normalized = BTreeMap::new();
        for field in &self.fields {
            let value = match (raw.get(field.name), field.default) {
                (Some(value), _) => normalize_value(field, value)?,
                (None, Some(default)) => default,
                (None, None) => return Err(MalformedInput::MissingField(field.name.to_string())),
            };
            normalized.insert(field.name, value);
        }
        Ok(normalized)
    }
}

/// Schema check followed by the logical-consistency check. All or nothing.
pub fn validate(
    raw: &RawResponses,
    schema: &ResponseSchema,
) -> Result<ValidResponses, EvaluationError> {
    let normalized = schema.normalize(raw)?;
    let responses = typed_record(&normalized)?;
    Ok(schema.check(responses)?)
}

/// Same as [`validate`] for callers holding an arbitrary JSON document.
pub fn validate_value(
    value: &Value,
    schema: &ResponseSchema,
) -> Result<ValidResponses, EvaluationError> {
    match value {
        Value::Object(raw) => validate(raw, schema),
        _ => Err(MalformedInput::NotAnObject.into()),
    }
}

fn normalize_value(field: &FieldSpec, value: &Value) -> Result<FactorValue, MalformedInput> {
    let normalized = match (field.kind, value) {
        (FieldKind::Flag, Value::Bool(flag)) => Some(FactorValue::Flag(*flag)),
        (FieldKind::Flag, Value::String(text)) => parse_flag(text).map(FactorValue::Flag),
        (FieldKind::Ordinal { max }, _) => {
            integer_of(value).filter(|level| *level <= max).map(FactorValue::Level)
        }
        (FieldKind::Count, _) => integer_of(value).map(FactorValue::Level),
        _ => None,
    };

    normalized.ok_or_else(|| MalformedInput::InvalidValue {
        field: field.name.to_string(),
        expected: field.kind.expected(),
        found: value.to_string(),
    })
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

fn integer_of(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn typed_record(
    normalized: &BTreeMap<&'static str, FactorValue>,
) -> Result<RiskFactorResponses, MalformedInput> {
    let flag = |name: &'static str| match normalized.get(name) {
        Some(FactorValue::Flag(value)) => Ok(*value),
        _ => Err(MalformedInput::MissingField(name.to_string())),
    };
    let level = |name: &'static str| match normalized.get(name) {
        Some(FactorValue::Level(value)) => Ok(*value),
        _ => Err(MalformedInput::MissingField(name.to_string())),
    };

    let age = level(AGE_BRACKET)?;
    let age_bracket = u8::try_from(age)
        .ok()
        .and_then(AgeBracket::from_ordinal)
        .ok_or_else(|| MalformedInput::InvalidValue {
            field: AGE_BRACKET.to_string(),
            expected: "an ordinal category",
            found: age.to_string(),
        })?;

    Ok(RiskFactorResponses {
        age_bracket,
        current_violent_offense: flag("currentViolentOffense")?,
        current_violent_offense_and_young: flag("currentViolentOffenseAndYoung")?,
        pending_charge: flag("pendingCharge")?,
        prior_misdemeanor: flag("priorMisdemeanor")?,
        prior_felony: flag("priorFelony")?,
        prior_conviction: flag("priorConviction")?,
        prior_violent_conviction_count: level("priorViolentConvictionCount")?,
        prior_fta_recent_count: level("priorFTARecentCount")?,
        prior_fta_old: flag("priorFTAOld")?,
        prior_sentence_to_incarceration: flag("priorSentenceToIncarceration")?,
        extradited: flag("extradited")?,
        dmf_step2_charges: flag("dmfStep2Charges")?,
        dmf_step4_charges: flag("dmfStep4Charges")?,
        dmf_secondary_release_charges: flag("dmfSecondaryReleaseCharges")?,
    })
}

const AGE_BRACKET: &str = "ageBracket";

fn standard_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(AGE_BRACKET, FieldKind::Ordinal { max: 2 }),
        FieldSpec::new("currentViolentOffense", FieldKind::Flag),
        FieldSpec::new("currentViolentOffenseAndYoung", FieldKind::Flag),
        FieldSpec::new("pendingCharge", FieldKind::Flag),
        FieldSpec::new("priorMisdemeanor", FieldKind::Flag),
        FieldSpec::new("priorFelony", FieldKind::Flag),
        FieldSpec::new("priorConviction", FieldKind::Flag),
        FieldSpec::new("priorViolentConvictionCount", FieldKind::Count),
        FieldSpec::new("priorFTARecentCount", FieldKind::Count),
        FieldSpec::new("priorFTAOld", FieldKind::Flag),
        FieldSpec::new("priorSentenceToIncarceration", FieldKind::Flag),
        FieldSpec::new("extradited", FieldKind::Flag),
        FieldSpec::new("dmfStep2Charges", FieldKind::Flag),
        FieldSpec::new("dmfStep4Charges", FieldKind::Flag),
        FieldSpec::optional_flag("dmfSecondaryReleaseCharges"),
    ]
}

fn standard_rules() -> Vec<ConsistencyRule> {
    let prior_offense = || {
        Predicate::any([
            Predicate::flag(Flag::PriorMisdemeanor),
            Predicate::flag(Flag::PriorFelony),
        ])
    };

    vec![
        ConsistencyRule {
            id: "prior_conviction_requires_prior_offense",
            when: Predicate::flag(Flag::PriorConviction),
            require: prior_offense(),
        },
        ConsistencyRule {
            id: "prior_offense_requires_prior_conviction",
            when: prior_offense(),
            require: Predicate::flag(Flag::PriorConviction),
        },
        ConsistencyRule {
            id: "violent_conviction_requires_prior_conviction",
            when: Predicate::count_at_least(Count::PriorViolentConvictionCount, 1),
            require: Predicate::flag(Flag::PriorConviction),
        },
        ConsistencyRule {
            id: "young_violent_offense_requires_violent_offense",
            when: Predicate::flag(Flag::CurrentViolentOffenseAndYoung),
            require: Predicate::flag(Flag::CurrentViolentOffense),
        },
        ConsistencyRule {
            id: "young_violent_offense_requires_youngest_bracket",
            when: Predicate::flag(Flag::CurrentViolentOffenseAndYoung),
            require: Predicate::AgeBracket {
                bracket: AgeBracket::TwentyOrYounger,
            },
        },
        ConsistencyRule {
            id: "incarceration_requires_prior_conviction",
            when: Predicate::flag(Flag::PriorSentenceToIncarceration),
            require: Predicate::flag(Flag::PriorConviction),
        },
        ConsistencyRule {
            id: "violent_offense_while_young_requires_flag",
            when: Predicate::all([
                Predicate::flag(Flag::CurrentViolentOffense),
                Predicate::AgeBracket {
                    bracket: AgeBracket::TwentyOrYounger,
                },
            ]),
            require: Predicate::flag(Flag::CurrentViolentOffenseAndYoung),
        },
    ]
}
