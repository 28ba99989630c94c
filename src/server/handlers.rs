use super::types::{HealthResponse, WorkerStatus};
use crate::worker::{ResponseEnvelope, Worker};
use crate::{Error, Result};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<Worker>,
}

type EnvelopeResponse = (StatusCode, Json<ResponseEnvelope>);

/// Job-queue shape: `{"id": ..., "input": {"images": [...], "seed": ...}}`.
pub async fn run_job(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> EnvelopeResponse {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return reject(rejection),
    };

    let job_id = body
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let input = body.get("input").cloned().unwrap_or(Value::Null);

    info!("Received job {}", job_id);
    respond(state.worker.process(&job_id, &input).await)
}

/// Managed-platform scoring shape: the body is the job input itself.
pub async fn score(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> EnvelopeResponse {
    let input = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return reject(rejection),
    };

    let job_id = Uuid::new_v4().to_string();
    info!("Received scoring request {}", job_id);
    respond(state.worker.process(&job_id, &input).await)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.worker.model() {
        Some(model) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: WorkerStatus::Ready,
                device: Some(model.device().to_string()),
                model: Some(model.location().to_string()),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: WorkerStatus::NotInitialized,
                device: None,
                model: None,
            }),
        ),
    }
}

fn respond(result: Result<crate::worker::Asset>) -> EnvelopeResponse {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ResponseEnvelope::from(&result)))
}

fn reject(rejection: JsonRejection) -> EnvelopeResponse {
    warn!("Rejected request body: {}", rejection.body_text());
    let error = Error::validation(format!("Invalid JSON body: {}", rejection.body_text()));
    (rejection.status(), Json(ResponseEnvelope::failure(&error)))
}
