use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::AssessmentId;
use super::evaluation::ScoringResult;

/// Cached scoring result keyed by assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: AssessmentId,
    pub scored_at: DateTime<Utc>,
    pub result: ScoringResult,
}

impl AssessmentRecord {
    pub fn summary(&self) -> String {
        format!("{}: {}", self.assessment_id, self.result.summary())
    }
}

/// Result cache owned by the host application.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError>;
    fn replace(&self, record: AssessmentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    fn recent(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("assessment already scored")]
    Conflict,
    #[error("assessment not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
