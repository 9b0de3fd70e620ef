use super::domain::{FactorValue, RiskFactor, Scale};

/// Structural problems with an intake record, raised before any logical check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedInput {
    #[error("responses must be a flat JSON object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` expected {expected}, found {found}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        found: String,
    },
}

/// Cross-field consistency failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("illogical combination of responses (rule `{rule_id}`)")]
    IllogicalCombination { rule_id: String },
}

/// Problems with a response schema assembled by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("consistency rule `{rule_id}` tests scored scales, which do not exist during validation")]
    ScaleReference { rule_id: String },
}

/// Faults in the jurisdiction configuration detected while evaluating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("decision matrix has no cell for nca={nca}, fta={fta}, nvca={nvca}")]
    MissingCell { nca: u8, fta: u8, nvca: bool },
    #[error("{} weight table has no entry for {factor:?} = {value}", .scale.label())]
    MissingWeight {
        scale: Scale,
        factor: RiskFactor,
        value: FactorValue,
    },
    #[error("{} weights overflow the raw total", .scale.label())]
    ScoreOverflow { scale: Scale },
    #[error("release tier `{tier}` is not declared in the tier ordering")]
    UnknownTier { tier: String },
}

/// Everything an evaluation can fail with. An evaluation yields a result or one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Type(#[from] MalformedInput),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
