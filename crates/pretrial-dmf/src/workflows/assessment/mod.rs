//! Pretrial risk assessment: response validation, PSA-style scale scoring, decision-matrix
//! lookup and recommendation overrides, plus the service, router and batch intake that
//! host the engine.

pub mod domain;
pub mod error;
pub mod evaluation;
pub mod intake;
pub mod predicate;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AgeBracket, AssessmentId, Count, FactorValue, Flag, OrdinalScale, RawResponses,
    Recommendation, RiskFactor, RiskFactorResponses, Scale, ValidResponses,
};
pub use error::{
    ConfigurationError, EvaluationError, MalformedInput, SchemaError, ValidationError,
};
pub use evaluation::{
    DecisionMatrixConfig, DmfEngine, MatrixDocumentError, OverrideId, ScoringResult,
};
pub use intake::{read_batch, read_batch_path, BatchError, BatchRow};
pub use predicate::{Facts, Predicate, ScaleReadout};
pub use repository::{AssessmentRecord, AssessmentRepository, RepositoryError};
pub use router::assessment_router;
pub use service::{AssessmentService, AssessmentServiceError};
pub use validation::{validate, validate_value, ConsistencyRule, ResponseSchema};
