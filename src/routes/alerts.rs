//! Alert endpoints: listing, acknowledgement and the report intent.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::farm::Farm;
use crate::models::{Alert, AlertId};

// ---

pub fn router() -> Router<Farm> {
    // ---
    Router::new()
        .route("/alerts", get(list))
        .route("/alerts/{id}/ack", post(acknowledge))
        .route("/reports", post(request_report))
}

#[derive(Serialize)]
struct AlertsResponse {
    /// Unacknowledged alert count.
    active: usize,
    /// Newest first.
    alerts: Vec<Alert>,
}

#[derive(Serialize)]
struct AckResponse {
    active: usize,
}

/// `GET /alerts`
async fn list(State(farm): State<Farm>) -> Json<AlertsResponse> {
    // ---
    let snapshot = farm.alerts();
    let alerts: Vec<Alert> = snapshot.iter().rev().cloned().collect();
    let active = alerts.iter().filter(|a| !a.acknowledged).count();
    Json(AlertsResponse { active, alerts })
}

/// `POST /alerts/{id}/ack`
///
/// Always 200. An id that is unknown, already acknowledged, or not even a
/// valid id leaves the log untouched.
async fn acknowledge(State(farm): State<Farm>, Path(id): Path<String>) -> Json<AckResponse> {
    // ---
    let active = match id.parse::<AlertId>() {
        Ok(id) => farm.acknowledge_alert(&id).await,
        Err(e) => {
            debug!("POST /alerts/{}/ack - ignoring malformed id: {}", id, e);
            farm.active_alert_count()
        }
    };
    Json(AckResponse { active })
}

/// `POST /reports` — labeled "Export Report" intent; no file is generated.
async fn request_report(State(farm): State<Farm>) -> impl IntoResponse {
    // ---
    info!("POST /reports");
    let alert = farm.request_report(Utc::now()).await;
    (StatusCode::ACCEPTED, Json(alert))
}
