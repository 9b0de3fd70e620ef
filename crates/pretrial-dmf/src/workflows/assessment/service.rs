use std::sync::Arc;

use chrono::Utc;

use super::domain::{AssessmentId, RawResponses};
use super::error::EvaluationError;
use super::evaluation::{DecisionMatrixConfig, DmfEngine, ScoringResult};
use super::repository::{AssessmentRecord, AssessmentRepository, RepositoryError};
use super::validation::ResponseSchema;

/// Service composing the response schema, the DMF engine and the result cache.
pub struct AssessmentService<R> {
    schema: Arc<ResponseSchema>,
    engine: Arc<DmfEngine>,
    repository: Arc<R>,
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: DecisionMatrixConfig) -> Self {
        Self::with_engine(
            repository,
            Arc::new(DmfEngine::new(config)),
            ResponseSchema::standard(),
        )
    }

    pub fn with_engine(repository: Arc<R>, engine: Arc<DmfEngine>, schema: ResponseSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            engine,
            repository,
        }
    }

    pub fn engine(&self) -> &DmfEngine {
        &self.engine
    }

    /// Evaluate without caching.
    pub fn evaluate(&self, raw: &RawResponses) -> Result<ScoringResult, AssessmentServiceError> {
        Ok(self.engine.assess(raw, &self.schema)?)
    }

    /// Score a new assessment and cache the result.
    pub fn score(
        &self,
        assessment_id: AssessmentId,
        raw: &RawResponses,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let result = self.evaluate(raw)?;
        let record = AssessmentRecord {
            assessment_id,
            scored_at: Utc::now(),
            result,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Re-run an existing assessment, replacing the cached result.
    pub fn rescore(
        &self,
        assessment_id: &AssessmentId,
        raw: &RawResponses,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        if self.repository.fetch(assessment_id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let result = self.evaluate(raw)?;
        let record = AssessmentRecord {
            assessment_id: assessment_id.clone(),
            scored_at: Utc::now(),
            result,
        };

        self.repository.replace(record.clone())?;
        Ok(record)
    }

    pub fn get(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentRecord, AssessmentServiceError> {
        let record = self
            .repository
            .fetch(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Most recently scored assessments, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AssessmentRecord>, AssessmentServiceError> {
        Ok(self.repository.recent(limit)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
