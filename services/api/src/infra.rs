use metrics_exporter_prometheus::PrometheusHandle;
use pretrial_dmf::config::MatrixSource;
use pretrial_dmf::error::AppError;
use pretrial_dmf::workflows::assessment::{
    AssessmentId, AssessmentRecord, AssessmentRepository, DecisionMatrixConfig, RepositoryError,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

type Records = HashMap<AssessmentId, AssessmentRecord>;

/// Process-local result cache; contents are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    records: Arc<Mutex<Records>>,
}

impl InMemoryAssessmentRepository {
    fn guard(&self) -> Result<MutexGuard<'_, Records>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.assessment_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.assessment_id.clone(), record.clone());
        Ok(record)
    }

    fn replace(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.assessment_id) {
            guard.insert(record.assessment_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let mut records: Vec<_> = self.guard()?.values().cloned().collect();
        records.sort_by(|a, b| {
            b.scored_at
                .cmp(&a.scored_at)
                .then_with(|| a.assessment_id.cmp(&b.assessment_id))
        });
        records.truncate(limit);
        Ok(records)
    }
}

/// An explicit `--matrix` path wins over the configured source.
pub(crate) fn load_matrix(
    path: Option<PathBuf>,
    source: &MatrixSource,
) -> Result<DecisionMatrixConfig, AppError> {
    let config = match path {
        Some(path) => DecisionMatrixConfig::from_path(path)?,
        None => source.load()?,
    };

    info!(
        jurisdiction = %config.jurisdiction,
        cells = config.matrix.len(),
        tiers = config.tiers.len(),
        "decision matrix loaded"
    );
    Ok(config)
}
