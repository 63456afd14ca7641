//! HTTP request handlers.

use super::error::ApiError;
use super::AppState;
use crate::types::patient::PatientRecord;
use crate::types::prediction::PredictionResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Liveness message returned by `GET /`
pub const LIVENESS_MESSAGE: &str = "HealthAI Guardian – Live for Chronic Disease Prediction";

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
}

async fn home() -> Json<Value> {
    Json(serde_json::json!({ "message": LIVENESS_MESSAGE }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let record = payload
        .map_err(ApiError::from)
        .and_then(|Json(payload)| PatientRecord::from_json(&payload).map_err(ApiError::from))
        .inspect_err(|e| {
            state.metrics.record_rejection();
            debug!(request_id = %request_id, error = ?e, "Rejected prediction request");
        })?;

    let assessment = state
        .engine
        .assess_blocking(record)
        .await
        .inspect_err(|e| {
            state.metrics.record_failure();
            error!(request_id = %request_id, error = %e, "Inference failed");
        })?;

    let processing_time = start.elapsed();
    state.metrics.record_prediction(
        processing_time,
        assessment.probability,
        assessment.response.risk_level,
    );

    info!(
        request_id = %request_id,
        risk_level = %assessment.response.risk_level,
        risk_probability = assessment.response.risk_probability,
        processing_time_us = processing_time.as_micros() as u64,
        "Prediction served"
    );

    Ok(Json(assessment.response))
}
