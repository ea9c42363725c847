//! Device and automation toggles.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use super::error_response;
use crate::farm::Farm;
use crate::models::{AutomationSettings, DeviceState};

// ---

pub fn router() -> Router<Farm> {
    // ---
    Router::new()
        .route("/devices", get(devices))
        .route("/devices/{id}/toggle", post(toggle_device))
        .route("/automation", get(automation))
        .route("/automation/{id}/toggle", post(toggle_automation))
}

async fn devices(State(farm): State<Farm>) -> Json<DeviceState> {
    Json(farm.devices())
}

/// `POST /devices/{id}/toggle` — 404 for ids outside the fixed set.
async fn toggle_device(State(farm): State<Farm>, Path(id): Path<String>) -> Response {
    // ---
    info!("POST /devices/{}/toggle", id);
    match farm.toggle_device(&id).await {
        Ok(state) => (StatusCode::OK, Json(state)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn automation(State(farm): State<Farm>) -> Json<AutomationSettings> {
    Json(farm.automation())
}

/// `POST /automation/{id}/toggle` — flags are inert; this only records them.
async fn toggle_automation(State(farm): State<Farm>, Path(id): Path<String>) -> Response {
    // ---
    info!("POST /automation/{}/toggle", id);
    match farm.toggle_automation(&id).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => error_response(e),
    }
}
