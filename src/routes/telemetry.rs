//! Reading endpoints: current telemetry, the live SSE stream, and the
//! external-input ingestion point for soil and supply values.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::stream::{Stream, StreamExt};
use tracing::info;

use crate::farm::{Farm, Telemetry};
use crate::models::ExternalInputs;

// ---

pub fn router() -> Router<Farm> {
    // ---
    Router::new()
        .route("/telemetry", get(current))
        .route("/readings/stream", get(stream))
        .route("/inputs", put(update_inputs))
}

/// `GET /telemetry` — the current reading with its classification.
async fn current(State(farm): State<Farm>) -> Json<Telemetry> {
    Json(Telemetry::clone(&farm.telemetry()))
}

/// `GET /readings/stream` — one `reading` SSE event per accepted tick.
///
/// The stream ends when the farm shuts down.
async fn stream(State(farm): State<Farm>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // ---
    info!("GET /readings/stream - subscriber attached");
    let events = farm.subscribe_telemetry().map(|telemetry| {
        let event = Event::default()
            .event("reading")
            .id(telemetry.sequence.to_string());
        Ok(event
            .json_data(&*telemetry)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// `PUT /inputs` — apply externally fed NPK, pH and voltage values.
async fn update_inputs(
    State(farm): State<Farm>,
    Json(inputs): Json<ExternalInputs>,
) -> Json<Telemetry> {
    // ---
    info!("PUT /inputs - {:?}", inputs);
    let telemetry = farm.update_inputs(inputs, Utc::now()).await;
    Json(Telemetry::clone(&telemetry))
}
