use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::domain::price::CycleOutcome;
use crate::export;

use super::AppState;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub(super) async fn current_price(State(state): State<AppState>) -> Response {
    match state.tracker.current_price() {
        Some(reading) => Json(reading).into_response(),
        None => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "no gold price has been fetched yet",
        ),
    }
}

pub(super) async fn refresh(State(state): State<AppState>) -> Response {
    match state.tracker.run_cycle().await {
        Ok(CycleOutcome::FetchFailed(reason)) => error_response(
            StatusCode::BAD_GATEWAY,
            format!("failed to fetch gold price: {}", reason),
        ),
        Ok(outcome) => {
            let label = match &outcome {
                CycleOutcome::Baseline(_) => "baseline",
                CycleOutcome::Changed { .. } => "changed",
                CycleOutcome::Unchanged(_) => "unchanged",
                CycleOutcome::FetchFailed(_) | CycleOutcome::Skipped => "skipped",
            };
            Json(json!({ "outcome": label, "reading": outcome.reading() })).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub(super) async fn history_json(State(state): State<AppState>) -> Response {
    match export::to_json(&state.tracker.history_snapshot()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("❌ JSON export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "JSON export failed")
        }
    }
}

pub(super) async fn history_csv(State(state): State<AppState>) -> Response {
    match export::to_csv(&state.tracker.history_snapshot()) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", export::CSV_FILENAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("❌ CSV export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed")
        }
    }
}

pub(super) async fn status(State(state): State<AppState>) -> Response {
    Json(state.tracker.stats()).into_response()
}
