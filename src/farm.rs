//! The process-wide state store.
//!
//! `Farm` owns the current reading and its classification, the alert log,
//! device flags and automation flags. Every mutation (ticks and operator
//! intents alike) goes through one async mutex, and each change is published
//! to `watch` channels before the lock is released. Readers therefore always
//! see a reading paired with its own `Status`, and no two writes to the same
//! entity can interleave or be lost.
//!
//! Subscriptions are `watch`-backed streams: a new subscriber gets the
//! current value first, and a slow subscriber sees the latest value rather
//! than a backlog. All streams end once [`Farm::shutdown`] is called.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::future;
use futures_util::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::{escalations, AlertLog};
use crate::classifier::{classify, Status, Thresholds};
use crate::devices::DeviceController;
use crate::error::CoreError;
use crate::models::{
    Alert, AlertId, AlertKind, AutomationId, AutomationSettings, DeviceState, ExternalInputs,
    SensorReading, SourceStatus,
};
use crate::simulator::ReadingSource;

// ---

/// Message of the labeled report intent.
pub const REPORT_MESSAGE: &str = "NPK analysis report generated successfully";

/// A reading together with everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    // ---
    /// Increments on every accepted reading, starting at 0 for the seed.
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub reading: SensorReading,
    pub status: Status,
    pub source: SourceStatus,
}

/// Startup values for a [`Farm`].
#[derive(Debug, Clone)]
pub struct FarmSeed {
    pub reading: SensorReading,
    pub devices: DeviceState,
    pub automation: AutomationSettings,
    pub alerts: Vec<Alert>,
    pub thresholds: Thresholds,
    pub started_at: DateTime<Utc>,
}

impl FarmSeed {
    /// The dashboard's out-of-the-box state, timestamped relative to `now`.
    pub fn standard(now: DateTime<Utc>) -> Self {
        // ---
        let reading = SensorReading {
            temperature: 26.5,
            humidity: 68.0,
            soil_moisture: 45.0,
            water_level_1: 75.0,
            water_level_2: 82.0,
            nitrogen: 120.0,
            phosphorus: 85.0,
            potassium: 160.0,
            ph: 6.8,
            voltage: 415.0,
            current: 12.5,
            power: 8.9,
        };

        let devices = DeviceState {
            water_pump: false,
            motor_3_phase: true,
            irrigation: false,
            ventilation: true,
        };

        // Oldest first, so insertion order matches `created_at`.
        let alerts = vec![
            Alert::new(AlertKind::Info, REPORT_MESSAGE, now - Duration::hours(1)).acknowledged(),
            Alert::new(
                AlertKind::Critical,
                "Water level 1 critically low (15%)",
                now - Duration::minutes(5),
            ),
            Alert::new(
                AlertKind::Warning,
                "Soil moisture level below optimal range (45%)",
                now - Duration::minutes(2),
            ),
        ];

        Self {
            reading,
            devices,
            automation: AutomationSettings::default(),
            alerts,
            thresholds: Thresholds::default(),
            started_at: now,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Everything guarded by the store lock.
struct FarmState {
    telemetry: Telemetry,
    thresholds: Thresholds,
    alerts: AlertLog,
    devices: DeviceController,
    automation: AutomationSettings,
}

struct FarmInner {
    state: Mutex<FarmState>,
    telemetry_tx: watch::Sender<Arc<Telemetry>>,
    alerts_tx: watch::Sender<Arc<Vec<Alert>>>,
    devices_tx: watch::Sender<DeviceState>,
    automation_tx: watch::Sender<AutomationSettings>,
    shutdown: CancellationToken,
}

/// Cheaply cloneable handle to the shared store.
#[derive(Clone)]
pub struct Farm {
    inner: Arc<FarmInner>,
}

impl Farm {
    pub fn new(seed: FarmSeed) -> Self {
        // ---
        let reading = seed.reading.sanitized();
        let telemetry = Telemetry {
            sequence: 0,
            recorded_at: seed.started_at,
            status: classify(&reading, &seed.thresholds),
            reading,
            source: SourceStatus::Live,
        };

        let mut alerts = AlertLog::new();
        alerts.seed(seed.alerts);

        let (telemetry_tx, _) = watch::channel(Arc::new(telemetry.clone()));
        let (alerts_tx, _) = watch::channel(Arc::new(alerts.entries().to_vec()));
        let (devices_tx, _) = watch::channel(seed.devices);
        let (automation_tx, _) = watch::channel(seed.automation);

        info!(
            alerts = alerts.len(),
            active = alerts.active_count(),
            "farm state initialized"
        );

        Self {
            inner: Arc::new(FarmInner {
                state: Mutex::new(FarmState {
                    telemetry,
                    thresholds: seed.thresholds,
                    alerts,
                    devices: DeviceController::new(seed.devices),
                    automation: seed.automation,
                }),
                telemetry_tx,
                alerts_tx,
                devices_tx,
                automation_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Pull the next reading from `source` and fold it into the store.
    ///
    /// On success the reading is classified, rising severities raise alerts
    /// and a recovering source is flagged live again. On failure the last
    /// reading is kept, the telemetry is marked unavailable and a critical
    /// alert is raised once per outage.
    pub async fn advance<S>(&self, source: &mut S, now: DateTime<Utc>) -> Arc<Telemetry>
    where
        S: ReadingSource + ?Sized,
    {
        // ---
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;
        let previous = state.telemetry.reading;
        let logged = state.alerts.len();

        match source.next_reading(&previous) {
            Ok(reading) => {
                if let SourceStatus::Unavailable { since, .. } = &state.telemetry.source {
                    info!(since = %since, "reading source recovered");
                    log_raised(&state.alerts.raise(AlertKind::Info, "Sensor feed restored", now));
                }
                state.telemetry.source = SourceStatus::Live;
                self.record(state, reading.sanitized(), now);
                self.publish_telemetry(state);
            }
            Err(e) => {
                warn!(error = %e, "reading source failed");
                let reason = match e {
                    CoreError::SourceUnavailable { reason } => reason,
                    other => other.to_string(),
                };
                // Telemetry only changes on the first failed tick of an outage.
                if state.telemetry.source.is_live() {
                    log_raised(&state.alerts.raise(
                        AlertKind::Critical,
                        format!("Sensor feed unavailable: {reason}"),
                        now,
                    ));
                    state.telemetry.source = SourceStatus::Unavailable { reason, since: now };
                    self.publish_telemetry(state);
                }
            }
        }

        if state.alerts.len() != logged {
            self.publish_alerts(state);
        }
        self.inner.telemetry_tx.borrow().clone()
    }

    /// Apply externally fed soil and supply values to the current reading.
    pub async fn update_inputs(&self, inputs: ExternalInputs, now: DateTime<Utc>) -> Arc<Telemetry> {
        // ---
        let mut state = self.inner.state.lock().await;
        let reading = state.telemetry.reading.with_inputs(&inputs).sanitized();
        info!(?inputs, "external inputs applied");
        let logged = state.alerts.len();
        self.record(&mut state, reading, now);
        self.publish_telemetry(&state);
        if state.alerts.len() != logged {
            self.publish_alerts(&state);
        }
        self.inner.telemetry_tx.borrow().clone()
    }

    /// Classify `reading`, raise alerts for rising severities and make it current.
    fn record(&self, state: &mut FarmState, reading: SensorReading, now: DateTime<Utc>) {
        // ---
        let status = classify(&reading, &state.thresholds);
        for escalation in escalations(&state.telemetry.status, &status, &reading) {
            log_raised(&state.alerts.push(escalation.into_alert(now)));
        }

        state.telemetry.sequence += 1;
        state.telemetry.recorded_at = now;
        state.telemetry.reading = reading;
        state.telemetry.status = status;
        debug!(
            sequence = state.telemetry.sequence,
            overall = ?status.overall(),
            "reading recorded"
        );
    }

    // ── Intents ──────────────────────────────────────────────────────

    /// Append an alert and return it.
    pub async fn raise_alert(
        &self,
        kind: AlertKind,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Alert {
        // ---
        let mut state = self.inner.state.lock().await;
        let alert = state.alerts.raise(kind, message, at);
        log_raised(&alert);
        self.publish_alerts(&state);
        alert
    }

    /// Acknowledge `id`; unknown ids are ignored. Returns the active count.
    pub async fn acknowledge_alert(&self, id: &AlertId) -> usize {
        // ---
        let mut state = self.inner.state.lock().await;
        if state.alerts.acknowledge(id) {
            info!(id = %id, "alert acknowledged");
            self.publish_alerts(&state);
        } else {
            debug!(id = %id, "acknowledge ignored: unknown or already acknowledged");
        }
        state.alerts.active_count()
    }

    /// The "Export Report" intent. Records an info alert; no file is produced.
    pub async fn request_report(&self, at: DateTime<Utc>) -> Alert {
        info!("NPK report requested");
        self.raise_alert(AlertKind::Info, REPORT_MESSAGE, at).await
    }

    pub async fn toggle_device(&self, id: &str) -> Result<DeviceState, CoreError> {
        // ---
        let mut state = self.inner.state.lock().await;
        let devices = state.devices.toggle(id)?;
        self.inner.devices_tx.send_replace(devices);
        Ok(devices)
    }

    pub async fn device(&self, id: &str) -> Result<bool, CoreError> {
        self.inner.state.lock().await.devices.get(id)
    }

    pub async fn toggle_automation(&self, id: &str) -> Result<AutomationSettings, CoreError> {
        // ---
        let flag: AutomationId = id.parse()?;
        let mut state = self.inner.state.lock().await;
        let settings = state.automation.toggle(flag);
        info!(?flag, ?settings, "automation setting toggled");
        self.inner.automation_tx.send_replace(settings);
        Ok(settings)
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.inner.telemetry_tx.borrow().clone()
    }

    /// Alerts in insertion order.
    pub fn alerts(&self) -> Arc<Vec<Alert>> {
        self.inner.alerts_tx.borrow().clone()
    }

    pub fn active_alert_count(&self) -> usize {
        self.inner
            .alerts_tx
            .borrow()
            .iter()
            .filter(|a| !a.acknowledged)
            .count()
    }

    pub fn devices(&self) -> DeviceState {
        *self.inner.devices_tx.borrow()
    }

    pub fn automation(&self) -> AutomationSettings {
        *self.inner.automation_tx.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// One reading per accepted tick.
    ///
    /// Outage ticks yield nothing here since the reading did not change; use
    /// [`Farm::subscribe_telemetry`] to observe the source status.
    pub fn subscribe_readings(&self) -> BoxStream<'static, SensorReading> {
        // ---
        let mut last = None;
        self.subscribe_telemetry()
            .filter_map(move |t| {
                let fresh = last != Some(t.sequence);
                last = Some(t.sequence);
                future::ready(fresh.then_some(t.reading))
            })
            .boxed()
    }

    pub fn subscribe_telemetry(&self) -> BoxStream<'static, Arc<Telemetry>> {
        self.until_shutdown(WatchStream::new(self.inner.telemetry_tx.subscribe()))
    }

    pub fn subscribe_alerts(&self) -> BoxStream<'static, Arc<Vec<Alert>>> {
        self.until_shutdown(WatchStream::new(self.inner.alerts_tx.subscribe()))
    }

    pub fn subscribe_devices(&self) -> BoxStream<'static, DeviceState> {
        self.until_shutdown(WatchStream::new(self.inner.devices_tx.subscribe()))
    }

    pub fn subscribe_automation(&self) -> BoxStream<'static, AutomationSettings> {
        self.until_shutdown(WatchStream::new(self.inner.automation_tx.subscribe()))
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// End every subscription and stop any ticker driven by this store.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("farm state shutting down");
            self.inner.shutdown.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn until_shutdown<T>(&self, stream: WatchStream<T>) -> BoxStream<'static, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        stream
            .take_until(self.inner.shutdown.clone().cancelled_owned())
            .boxed()
    }

    fn publish_telemetry(&self, state: &FarmState) {
        self.inner
            .telemetry_tx
            .send_replace(Arc::new(state.telemetry.clone()));
    }

    fn publish_alerts(&self, state: &FarmState) {
        self.inner
            .alerts_tx
            .send_replace(Arc::new(state.alerts.entries().to_vec()));
    }
}

fn log_raised(alert: &Alert) {
    match alert.kind {
        AlertKind::Critical => warn!(id = %alert.id, "{}", alert.message),
        _ => info!(id = %alert.id, "{}", alert.message),
    }
}
