use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::assessment::domain::{
    AgeBracket, AssessmentId, FactorValue, RawResponses, RiskFactor, RiskFactorResponses,
    ValidResponses,
};
use crate::workflows::assessment::evaluation::{
    Cutpoints, DecisionMatrixConfig, DmfEngine, ScoringResult, WeightEntry,
};
use crate::workflows::assessment::repository::{
    AssessmentRecord, AssessmentRepository, RepositoryError,
};
use crate::workflows::assessment::validation::ResponseSchema;
use crate::workflows::assessment::{assessment_router, AssessmentService};

pub(super) fn reference_config() -> DecisionMatrixConfig {
    DecisionMatrixConfig::reference().expect("reference document parses")
}

/// Zero points everywhere except age, which puts one NCA point on the two youngest brackets.
pub(super) fn age_only_config() -> DecisionMatrixConfig {
    let mut config = reference_config();
    let zeroed = |factor: RiskFactor| -> Vec<WeightEntry> {
        factor_values(factor)
            .into_iter()
            .map(|value| WeightEntry {
                factor,
                value,
                points: 0,
            })
            .collect()
    };

    config.weights.nca = RiskFactor::ALL
        .into_iter()
        .flat_map(|factor| {
            let mut entries = zeroed(factor);
            if factor == RiskFactor::AgeBracket {
                for entry in &mut entries {
                    if entry.value != FactorValue::Level(2) {
                        entry.points = 1;
                    }
                }
            }
            entries
        })
        .collect();
    config.weights.fta = RiskFactor::ALL.into_iter().flat_map(zeroed).collect();
    config.weights.nvca = RiskFactor::ALL.into_iter().flat_map(zeroed).collect();
    config.cutpoints.nca = Cutpoints([1, 3, 5, 7, 9, 11]);
    config.cutpoints.fta = Cutpoints([1, 3, 5, 7, 9, 11]);
    config
}

fn factor_values(factor: RiskFactor) -> Vec<FactorValue> {
    match factor {
        RiskFactor::AgeBracket => (0..=2).map(FactorValue::Level).collect(),
        RiskFactor::PriorViolentConvictionCount | RiskFactor::PriorFtaRecentCount => {
            (0..=3).map(FactorValue::Level).collect()
        }
        _ => vec![FactorValue::Flag(true), FactorValue::Flag(false)],
    }
}

pub(super) fn reference_engine() -> DmfEngine {
    DmfEngine::new(reference_config())
}

pub(super) fn minimal_responses() -> RiskFactorResponses {
    RiskFactorResponses {
        age_bracket: AgeBracket::TwentyOrYounger,
        current_violent_offense: false,
        current_violent_offense_and_young: false,
        pending_charge: false,
        prior_misdemeanor: false,
        prior_felony: false,
        prior_conviction: false,
        prior_violent_conviction_count: 0,
        prior_fta_recent_count: 0,
        prior_fta_old: false,
        prior_sentence_to_incarceration: false,
        extradited: false,
        dmf_step2_charges: false,
        dmf_step4_charges: false,
        dmf_secondary_release_charges: false,
    }
}

/// Every aggravating factor at its maximum.
pub(super) fn maximal_responses() -> RiskFactorResponses {
    RiskFactorResponses {
        age_bracket: AgeBracket::TwentyOrYounger,
        current_violent_offense: true,
        current_violent_offense_and_young: true,
        pending_charge: true,
        prior_misdemeanor: true,
        prior_felony: true,
        prior_conviction: true,
        prior_violent_conviction_count: 3,
        prior_fta_recent_count: 2,
        prior_fta_old: true,
        prior_sentence_to_incarceration: true,
        ..minimal_responses()
    }
}

pub(super) fn valid(responses: RiskFactorResponses) -> ValidResponses {
    ResponseSchema::standard()
        .check(responses)
        .expect("responses are consistent")
}

pub(super) fn evaluate(engine: &DmfEngine, responses: RiskFactorResponses) -> ScoringResult {
    engine
        .evaluate(&valid(responses))
        .expect("evaluation succeeds")
}

pub(super) fn raw(responses: &RiskFactorResponses) -> RawResponses {
    match serde_json::to_value(responses).expect("responses serialize") {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub(super) fn build_service(
    config: DecisionMatrixConfig,
) -> (AssessmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AssessmentService::new(repository.clone(), config);
    (service, repository)
}

pub(super) fn router_with_config(config: DecisionMatrixConfig) -> axum::Router {
    let (service, _) = build_service(config);
    assessment_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<AssessmentId, AssessmentRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.assessment_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.assessment_id.clone(), record.clone());
        Ok(record)
    }

    fn replace(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.assessment_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|a, b| b.scored_at.cmp(&a.scored_at));
        records.truncate(limit);
        Ok(records)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
