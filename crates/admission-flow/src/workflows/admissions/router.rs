use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{Category, Fragment, FragmentSource, Step};
use super::reconciler::ErrorMap;
use super::repository::{RepositoryError, SessionRepository};
use super::service::{AdmissionSessionService, OpenSession, SessionServiceError};
use super::session::SessionId;
use super::submission::{SubmissionTransport, SubmissionVariant};
use super::validation::missing_fields_message;
use super::wizard::WizardError;

#[derive(Debug, Deserialize)]
pub(crate) struct FragmentRequest {
    pub(crate) source: String,
    #[serde(default)]
    pub(crate) values: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValidateRequest {
    #[serde(default)]
    pub(crate) step: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    pub(crate) variant: String,
    #[serde(default)]
    pub(crate) handoff: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentValidationRequest {
    #[serde(default)]
    pub(crate) document: Value,
    pub(crate) step: String,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

/// Router exposing wizard session operations as JSON endpoints.
pub fn admission_router<R, T>(service: Arc<AdmissionSessionService<R, T>>) -> Router
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    Router::new()
        .route("/api/v1/admissions/sessions", post(open_handler::<R, T>))
        .route(
            "/api/v1/admissions/sessions/:session_id",
            get(view_handler::<R, T>).delete(close_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/fragments",
            post(fragment_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/validate",
            post(validate_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/check",
            post(check_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/external-errors",
            axum::routing::put(external_errors_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/external-errors/:field",
            delete(clear_external_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/touched/:field",
            post(touched_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/advance",
            post(advance_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/retreat",
            post(retreat_handler::<R, T>),
        )
        .route(
            "/api/v1/admissions/sessions/:session_id/submit",
            post(submit_handler::<R, T>),
        )
        .route("/api/v1/admissions/validate", post(document_handler::<R, T>))
        .with_state(service)
}

fn error_response(error: SessionServiceError) -> Response {
    let status = match &error {
        SessionServiceError::NotFound(_)
        | SessionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SessionServiceError::Wizard(
            WizardError::SubmissionInFlight
            | WizardError::NotPersisted
            | WizardError::AtTerminalState
            | WizardError::CannotRetreat(_),
        )
        | SessionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SessionServiceError::IncompleteHandoff(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionServiceError::Aggregation(_) => StatusCode::BAD_REQUEST,
        SessionServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn parse_step(raw: &str) -> Result<Step, Response> {
    Step::parse(raw).ok_or_else(|| bad_request(format!("unknown step '{raw}'")))
}

pub(crate) async fn open_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Json(request): Json<OpenSession>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.open(request) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.view(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn close_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.close(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fragment_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
    Json(request): Json<FragmentRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    let Some(source) = FragmentSource::parse(&request.source) else {
        return bad_request(format!("unknown fragment source '{}'", request.source));
    };
    let fragment = Fragment::from_json(source, request.values);
    match service.merge_fragment(&SessionId(session_id), fragment) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validate_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
    request: Option<Json<ValidateRequest>>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let step = match request.step.as_deref().map(parse_step).transpose() {
        Ok(step) => step,
        Err(response) => return response,
    };
    match service.validate(&SessionId(session_id), step) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.check_before_payment(&SessionId(session_id)) {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn external_errors_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
    Json(errors): Json<ErrorMap>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.push_external_errors(&SessionId(session_id), errors) {
        Ok(visible) => (StatusCode::OK, Json(json!({ "visible_errors": visible }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clear_external_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path((session_id, field)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.clear_external_error(&SessionId(session_id), &field) {
        Ok(cleared) => (
            StatusCode::OK,
            Json(json!({ "field": field, "cleared": cleared })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn touched_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path((session_id, field)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.mark_touched(&SessionId(session_id), &field) {
        Ok(visible) => (StatusCode::OK, Json(json!({ "visible_errors": visible }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.advance(&SessionId(session_id)) {
        Ok(state) => (StatusCode::OK, Json(json!({ "step": state }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    match service.retreat(&SessionId(session_id)) {
        Ok(state) => (StatusCode::OK, Json(json!({ "step": state }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    let Some(variant) = SubmissionVariant::parse(&request.variant) else {
        return bad_request(format!("unknown submission variant '{}'", request.variant));
    };
    match service
        .submit(&SessionId(session_id), variant, request.handoff)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_handler<R, T>(
    State(service): State<Arc<AdmissionSessionService<R, T>>>,
    Json(request): Json<DocumentValidationRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    T: SubmissionTransport + 'static,
{
    let step = match parse_step(&request.step) {
        Ok(step) => step,
        Err(response) => return response,
    };
    let category = Category::resolve([request.category.as_deref()]);
    let result = service
        .orchestrator()
        .validate_document(&request.document, step, category);
    let summary = missing_fields_message(&result);
    (
        StatusCode::OK,
        Json(json!({
            "is_valid": result.is_valid(),
            "errors": result.messages(),
            "summary": summary,
        })),
    )
        .into_response()
}
