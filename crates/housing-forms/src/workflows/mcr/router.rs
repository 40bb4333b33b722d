use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{FormId, FormStatus, McrSubmission};
use super::notification::MailTransport;
use super::repository::FormRepository;
use super::service::{FormServiceError, McrFormService};

/// Header carrying the caller's verified identity for decide requests.
/// Authentication itself is an upstream collaborator concern.
pub const ACTING_IDENTITY_HEADER: &str = "x-acting-identity";

/// Decision payload for the status transition route.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: FormStatus,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Router builder exposing the MCR form REST surface.
pub fn mcr_router<R, M>(service: Arc<McrFormService<R, M>>) -> Router
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    Router::new()
        .route(
            "/api/v1/mcr",
            get(list_handler::<R, M>).post(submit_handler::<R, M>),
        )
        .route(
            "/api/v1/mcr/:form_id",
            get(get_handler::<R, M>)
                .put(replace_handler::<R, M>)
                .delete(delete_handler::<R, M>),
        )
        .route("/api/v1/mcr/:form_id/status", put(decide_handler::<R, M>))
        .with_state(service)
}

pub(crate) async fn submit_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
    axum::Json(submission): axum::Json<McrSubmission>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    match service.submit(submission).await {
        Ok(form) => (StatusCode::CREATED, axum::Json(form)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    match service.list() {
        Ok(forms) => (StatusCode::OK, axum::Json(forms)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
    Path(form_id): Path<i64>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    match service.get(FormId(form_id)) {
        Ok(form) => (StatusCode::OK, axum::Json(form)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn replace_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
    Path(form_id): Path<i64>,
    axum::Json(submission): axum::Json<McrSubmission>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    match service.replace(FormId(form_id), submission).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decide_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
    Path(form_id): Path<i64>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    let acting_identity = headers
        .get(ACTING_IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok());

    match service
        .decide(
            FormId(form_id),
            request.status,
            acting_identity,
            request.comments.as_deref(),
        )
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, M>(
    State(service): State<Arc<McrFormService<R, M>>>,
    Path(form_id): Path<i64>,
) -> Response
where
    R: FormRepository + 'static,
    M: MailTransport + 'static,
{
    match service.delete(FormId(form_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: FormServiceError) -> Response {
    match err {
        FormServiceError::Validation { fields } => {
            let payload = json!({
                "error": "validation failed",
                "fields": fields,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        FormServiceError::NotFound => {
            let payload = json!({ "error": "form not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        FormServiceError::Unauthorized => {
            let payload = json!({ "error": "not authorized to decide forms" });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        FormServiceError::InvalidTransition { current } => {
            let payload = json!({
                "error": "form has already been decided",
                "currentStatus": current.label(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        FormServiceError::Conflict => {
            let payload = json!({ "error": "status changed concurrently; re-fetch and retry" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        FormServiceError::Repository(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
