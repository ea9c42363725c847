use std::net::SocketAddr;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use smartfarm_telemetry::{routes, Farm, FarmSeed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceState {
    water_pump: bool,
    #[serde(rename = "motor3Phase")]
    motor_3_phase: bool,
}

#[derive(Debug, Deserialize)]
struct AlertView {
    id: String,
    kind: String,
    message: String,
    acknowledged: bool,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    active: usize,
    alerts: Vec<AlertView>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    active: usize,
}

/// Serve the routes for `farm` on an ephemeral local port.
async fn spawn_app(farm: Farm) -> Result<String> {
    // ---
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, routes::router(farm)).await;
    });
    Ok(format!("http://{}", addr))
}

fn farm() -> Farm {
    Farm::new(FarmSeed::standard(Utc::now()))
}

#[tokio::test]
async fn health_endpoint_ok() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let body: Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn telemetry_reports_reading_and_status() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let body: Value = Client::new()
        .get(format!("{}/telemetry", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["sequence"], 0);
    assert_eq!(body["reading"]["soilMoisture"], 45.0);
    assert_eq!(body["status"]["soilMoisture"], "warning");
    assert_eq!(body["status"]["nitrogen"], "good");
    assert_eq!(body["source"]["state"], "live");
    Ok(())
}

#[tokio::test]
async fn device_toggle_round_trip() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let client = Client::new();
    let url = format!("{}/devices/waterPump/toggle", base);

    let on: DeviceState = client.post(&url).send().await?.json().await?;
    assert!(on.water_pump);
    assert!(on.motor_3_phase, "motor untouched by pump toggle");

    let off: DeviceState = client.post(&url).send().await?.json().await?;
    assert!(!off.water_pump);

    let current: DeviceState = client
        .get(format!("{}/devices", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(!current.water_pump);
    Ok(())
}

#[tokio::test]
async fn unknown_device_is_404() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let resp = Client::new()
        .post(format!("{}/devices/sprinkler/toggle", base))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("sprinkler"));
    Ok(())
}

#[tokio::test]
async fn acknowledge_reduces_active_count_once() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let client = Client::new();

    let listing: AlertsResponse = client
        .get(format!("{}/alerts", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing.active, 2);
    assert_eq!(listing.alerts.len(), 3);
    // Newest first: the soil warning is two minutes old, the report an hour.
    assert_eq!(listing.alerts[0].kind, "warning");
    assert!(listing.alerts[0].message.starts_with("Soil moisture"));
    assert_eq!(listing.alerts[2].kind, "info");

    let target = listing
        .alerts
        .iter()
        .find(|a| a.message.starts_with("Water level 1"))
        .expect("seeded water level alert");
    assert!(!target.acknowledged);

    let ack_url = format!("{}/alerts/{}/ack", base, target.id);
    let first: AckResponse = client.post(&ack_url).send().await?.json().await?;
    assert_eq!(first.active, 1);

    let second: AckResponse = client.post(&ack_url).send().await?.json().await?;
    assert_eq!(second.active, 1, "acknowledge is idempotent");
    Ok(())
}

#[tokio::test]
async fn acknowledge_unknown_id_is_a_no_op() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let client = Client::new();

    for id in ["00000000-0000-4000-8000-000000000000", "not-an-id"] {
        let resp = client
            .post(format!("{}/alerts/{}/ack", base, id))
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AckResponse = resp.json().await?;
        assert_eq!(body.active, 2);
    }
    Ok(())
}

#[tokio::test]
async fn report_intent_adds_info_alert() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let client = Client::new();

    let resp = client.post(format!("{}/reports", base)).send().await?;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let listing: AlertsResponse = client
        .get(format!("{}/alerts", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing.alerts.len(), 4);
    assert_eq!(listing.active, 3);
    Ok(())
}

#[tokio::test]
async fn inputs_are_clamped_and_reclassified() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let body: Value = Client::new()
        .put(format!("{}/inputs", base))
        .json(&serde_json::json!({ "ph": 5.2, "potassium": 200.0 }))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["reading"]["ph"], 5.2);
    assert_eq!(body["status"]["ph"], "warning");
    assert_eq!(body["status"]["potassium"], "optimal");
    assert_eq!(body["sequence"], 1);
    Ok(())
}

#[tokio::test]
async fn automation_toggle_and_unknown_flag() -> Result<()> {
    // ---
    let base = spawn_app(farm()).await?;
    let client = Client::new();

    let flags: Value = client
        .post(format!("{}/automation/autoIrrigation/toggle", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(flags["autoIrrigation"], false);
    assert_eq!(flags["autoVentilation"], true);

    let resp = client
        .post(format!("{}/automation/autoHarvest/toggle", base))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
