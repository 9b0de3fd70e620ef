use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::domain::{AssessmentId, RawResponses};
use super::error::{EvaluationError, MalformedInput, ValidationError};
use super::repository::{AssessmentRecord, AssessmentRepository, RepositoryError};
use super::service::{AssessmentService, AssessmentServiceError};

const RECENT_LIMIT: usize = 25;

/// HTTP endpoints for scoring and retrieving assessments.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/score", post(evaluate_handler::<R>))
        .route("/api/v1/assessments", get(recent_handler::<R>))
        .route(
            "/api/v1/assessments/:assessment_id",
            post(score_handler::<R>)
                .put(rescore_handler::<R>)
                .get(status_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let raw = match intake_record(body) {
        Ok(raw) => raw,
        Err(response) => return response,
    };
    match service.evaluate(&raw) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(assessment_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let raw = match intake_record(body) {
        Ok(raw) => raw,
        Err(response) => return response,
    };
    match service.score(AssessmentId(assessment_id), &raw) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rescore_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(assessment_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let raw = match intake_record(body) {
        Ok(raw) => raw,
        Err(response) => return response,
    };
    match service.rescore(&AssessmentId(assessment_id), &raw) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.get(&AssessmentId(assessment_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn recent_handler<R>(State(service): State<Arc<AssessmentService<R>>>) -> Response
where
    R: AssessmentRepository + 'static,
{
    match service.recent(RECENT_LIMIT) {
        Ok(records) => {
            let summaries: Vec<String> = records.iter().map(AssessmentRecord::summary).collect();
            (StatusCode::OK, Json(json!({ "assessments": summaries }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Unwrap a request body into a flat record, answering in the error payload shape otherwise.
fn intake_record(body: Result<Json<Value>, JsonRejection>) -> Result<RawResponses, Response> {
    match body {
        Ok(Json(Value::Object(raw))) => Ok(raw),
        Ok(Json(_)) => Err(error_response(
            EvaluationError::from(MalformedInput::NotAnObject).into(),
        )),
        Err(rejection) => Err((
            rejection.status(),
            Json(json!({ "error": rejection.body_text(), "kind": "malformed_input" })),
        )
            .into_response()),
    }
}

fn error_response(err: AssessmentServiceError) -> Response {
    let (status, payload) = match &err {
        AssessmentServiceError::Evaluation(EvaluationError::Type(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": err.to_string(), "kind": "malformed_input" }),
        ),
        AssessmentServiceError::Evaluation(EvaluationError::Validation(
            ValidationError::IllogicalCombination { rule_id },
        )) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": err.to_string(),
                "kind": "illogical_combination",
                "rule_id": rule_id,
            }),
        ),
        AssessmentServiceError::Evaluation(EvaluationError::Configuration(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string(), "kind": "configuration" }),
        ),
        AssessmentServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "assessment already scored" }),
        ),
        AssessmentServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "assessment not found" }),
        ),
        AssessmentServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
