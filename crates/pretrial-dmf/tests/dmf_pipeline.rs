//! End-to-end scoring through the public engine, batch intake and HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use pretrial_dmf::workflows::assessment::{
        AssessmentId, AssessmentRecord, AssessmentRepository, RawResponses, RepositoryError,
    };

    pub(super) fn intake(overrides: Value) -> RawResponses {
        let mut record = json!({
            "ageBracket": 0,
            "currentViolentOffense": false,
            "currentViolentOffenseAndYoung": false,
            "pendingCharge": false,
            "priorMisdemeanor": false,
            "priorFelony": false,
            "priorConviction": false,
            "priorViolentConvictionCount": 0,
            "priorFTARecentCount": 0,
            "priorFTAOld": false,
            "priorSentenceToIncarceration": false,
            "extradited": false,
            "dmfStep2Charges": false,
            "dmfStep4Charges": false,
            "dmfSecondaryReleaseCharges": false
        });
        if let (Value::Object(base), Value::Object(patch)) = (&mut record, overrides) {
            base.extend(patch);
        }
        match record {
            Value::Object(map) => map,
            _ => unreachable!("intake template is an object"),
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryRepository {
        records: Mutex<HashMap<AssessmentId, AssessmentRecord>>,
    }

    impl AssessmentRepository for MemoryRepository {
        fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("mutex poisoned");
            if guard.contains_key(&record.assessment_id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.assessment_id.clone(), record.clone());
            Ok(record)
        }

        fn replace(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
            self.records
                .lock()
                .expect("mutex poisoned")
                .insert(record.assessment_id.clone(), record);
            Ok(())
        }

        fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
            Ok(self.records.lock().expect("mutex poisoned").get(id).cloned())
        }

        fn recent(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
            let mut records: Vec<_> = self
                .records
                .lock()
                .expect("mutex poisoned")
                .values()
                .cloned()
                .collect();
            records.sort_by(|a, b| b.scored_at.cmp(&a.scored_at));
            records.truncate(limit);
            Ok(records)
        }
    }

    pub(super) fn shared_repository() -> Arc<MemoryRepository> {
        Arc::new(MemoryRepository::default())
    }
}

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::*;
use pretrial_dmf::workflows::assessment::{
    assessment_router, read_batch, AssessmentRepository, AssessmentService, BatchError,
    DecisionMatrixConfig, DmfEngine, EvaluationError, OverrideId, ResponseSchema,
    ValidationError,
};

#[test]
fn reference_engine_scores_a_form_submission() {
    let engine = DmfEngine::new(DecisionMatrixConfig::reference().expect("reference parses"));
    let schema = ResponseSchema::standard();

    let result = engine
        .assess(
            &intake(json!({
                "ageBracket": "2",
                "pendingCharge": "yes",
                "dmfSecondaryReleaseCharges": "yes"
            })),
            &schema,
        )
        .expect("assessment succeeds");

    assert_eq!((result.nca_scale(), result.fta_scale()), (3, 2));
    assert!(!result.nvca_flag());
    assert_eq!(
        result.base_recommendation().release_type,
        "release_minimum_conditions"
    );
    assert_eq!(
        result.recommendation().release_type,
        "release_own_recognizance"
    );
    assert_eq!(
        result.triggered_overrides(),
        &[OverrideId::SecondaryReleaseDecrease]
    );
}

#[test]
fn inconsistent_submission_never_reaches_scoring() {
    let engine = DmfEngine::new(DecisionMatrixConfig::reference().expect("reference parses"));

    let err = engine
        .assess(
            &intake(json!({ "priorConviction": true })),
            &ResponseSchema::standard(),
        )
        .expect_err("rejected");

    assert_eq!(
        err,
        EvaluationError::Validation(ValidationError::IllogicalCombination {
            rule_id: "prior_conviction_requires_prior_offense".into()
        })
    );
}

#[test]
fn matrix_document_loads_from_disk() {
    let config = DecisionMatrixConfig::reference().expect("reference parses");
    let path = std::env::temp_dir().join(format!("dmf-pipeline-{}.json", std::process::id()));
    std::fs::write(
        &path,
        serde_json::to_vec_pretty(&config).expect("serialize config"),
    )
    .expect("write document");

    let loaded = DecisionMatrixConfig::from_path(&path).expect("document loads");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
}

#[test]
fn batch_rows_score_independently() {
    let document = "\
assessmentId,ageBracket,currentViolentOffense,currentViolentOffenseAndYoung,pendingCharge,priorMisdemeanor,priorFelony,priorConviction,priorViolentConvictionCount,priorFTARecentCount,priorFTAOld,priorSentenceToIncarceration,extradited,dmfStep2Charges,dmfStep4Charges,dmfSecondaryReleaseCharges
a-1,0,false,false,false,false,false,false,0,0,false,false,false,false,false,false
a-2,0,false,false,false,false,false,true,0,0,false,false,false,false,false,false
a-3,2,no,no,yes,no,no,no,0,0,no,no,yes,no,no,no
";
    let rows = read_batch(Cursor::new(document)).expect("batch parses");
    let engine = DmfEngine::new(DecisionMatrixConfig::reference().expect("reference parses"));
    let schema = ResponseSchema::standard();

    let outcomes: Vec<_> = rows
        .iter()
        .map(|row| engine.assess(&row.responses, &schema))
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].assessment_id.0, "a-3");
    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], Err(EvaluationError::Validation(_))));
    let third = outcomes[2].as_ref().expect("third row scores");
    assert_eq!(third.triggered_overrides(), &[OverrideId::StepTwoIncrease]);
}

#[test]
fn batch_without_id_column_is_rejected() {
    let err = read_batch(Cursor::new("ageBracket\n0\n")).expect_err("no id column");

    assert!(matches!(err, BatchError::MissingIdColumn));
}

#[tokio::test]
async fn router_scores_and_caches_assessments() {
    let repository = shared_repository();
    let service = AssessmentService::new(
        repository.clone(),
        DecisionMatrixConfig::reference().expect("reference parses"),
    );
    let app = assessment_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/assessments/int-1")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::Value::Object(intake(json!({}))).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/assessments/int-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(payload["assessment_id"], "int-1");
    assert_eq!(
        payload["result"]["recommendation"]["releaseType"],
        "release_own_recognizance"
    );

    let recent = repository.recent(10).expect("recent");
    assert_eq!(recent.len(), 1);
}
