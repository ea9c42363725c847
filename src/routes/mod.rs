//! HTTP gateway over the telemetry core.
//!
//! Each sibling module exports a subrouter; this gateway merges them and
//! attaches the shared [`Farm`] handle as state, so `main.rs` never needs to
//! know about individual endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::CoreError;
use crate::farm::Farm;

mod alerts;
mod devices;
mod health;
mod telemetry;

// ---

pub fn router(farm: Farm) -> Router {
    // ---
    Router::new()
        .merge(telemetry::router())
        .merge(alerts::router())
        .merge(devices::router())
        .merge(health::router())
        .with_state(farm)
}

/// JSON error body shared by every endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Map a core error to its HTTP status and JSON body.
fn error_response(err: CoreError) -> Response {
    // ---
    let status = match err {
        CoreError::UnknownDevice { .. } | CoreError::UnknownAutomation { .. } => {
            StatusCode::NOT_FOUND
        }
        CoreError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    tracing::debug!(%status, error = %err, "request rejected");
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}
