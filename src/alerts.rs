//! Alert log and edge-triggered alert detection.
//!
//! The log is append-only and insertion-ordered. Entries are created by
//! [`AlertLog::raise`] or installed by [`AlertLog::seed`], and the only
//! mutation is the one-way `acknowledged` flag. Nothing is ever removed.
//!
//! [`escalations`] compares two consecutive classifications and reports
//! only metrics whose severity *rose*. A metric parked at `Critical` for a
//! hundred ticks therefore produces one alert, not a hundred.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classifier::Status;
use crate::models::{Alert, AlertCause, AlertId, AlertKind, Metric, SensorReading, Severity};

// ---

/// Ordered, append-only alert storage.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install startup alerts, appended in the given order.
    pub fn seed(&mut self, initial: impl IntoIterator<Item = Alert>) {
        self.entries.extend(initial);
    }

    /// Append a fresh unacknowledged alert and return a copy of it.
    pub fn raise(
        &mut self,
        kind: AlertKind,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Alert {
        self.push(Alert::new(kind, message, timestamp))
    }

    /// Append a pre-built alert. Its `acknowledged` flag is reset so every
    /// raised alert starts active.
    pub fn push(&mut self, mut alert: Alert) -> Alert {
        // ---
        alert.acknowledged = false;
        debug!(id = %alert.id, kind = ?alert.kind, "alert appended");
        self.entries.push(alert.clone());
        alert
    }

    /// Mark `id` acknowledged.
    ///
    /// Unknown or already-acknowledged ids are a silent no-op. Returns
    /// whether this call changed anything.
    pub fn acknowledge(&mut self, id: &AlertId) -> bool {
        // ---
        match self.entries.iter_mut().find(|a| &a.id == id) {
            Some(alert) if !alert.acknowledged => {
                alert.acknowledged = true;
                true
            }
            _ => false,
        }
    }

    /// Number of unacknowledged alerts.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|a| !a.acknowledged).count()
    }

    pub fn get(&self, id: &AlertId) -> Option<&Alert> {
        self.entries.iter().find(|a| &a.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alerts in insertion order.
    pub fn entries(&self) -> &[Alert] {
        &self.entries
    }

    /// Alerts newest first, for display.
    pub fn newest_first(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter().rev()
    }
}

// ---

/// A metric that moved to a worse severity between two classifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    pub cause: AlertCause,
    pub message: String,
}

impl Escalation {
    pub fn kind(&self) -> AlertKind {
        self.cause.severity.into()
    }

    pub fn into_alert(self, at: DateTime<Utc>) -> Alert {
        Alert::new(self.kind(), self.message, at).with_cause(self.cause)
    }
}

/// Metrics whose severity rose from `previous` to `current`.
pub fn escalations(previous: &Status, current: &Status, reading: &SensorReading) -> Vec<Escalation> {
    // ---
    current
        .severities()
        .filter(|&(metric, severity)| severity > previous.severity(metric))
        .map(|(metric, severity)| Escalation {
            cause: AlertCause { metric, severity },
            message: describe(metric, severity, metric.value_in(reading)),
        })
        .collect()
}

/// Operator-facing message for a metric entering `severity`.
fn describe(metric: Metric, severity: Severity, value: f64) -> String {
    // ---
    let critical = severity == Severity::Critical;
    match metric {
        Metric::Temperature if critical => format!("Temperature critically high ({value:.1}°C)"),
        Metric::Temperature => format!("Temperature above optimal range ({value:.1}°C)"),
        Metric::Humidity => format!("Humidity above optimal range ({value:.0}%)"),
        Metric::SoilMoisture if critical => format!("Soil moisture critically low ({value:.0}%)"),
        Metric::SoilMoisture => {
            format!("Soil moisture level below optimal range ({value:.0}%)")
        }
        Metric::Ph => format!("Soil pH outside optimal range ({value:.1})"),
        Metric::WaterLevel1 | Metric::WaterLevel2 => {
            let tank = if metric == Metric::WaterLevel1 { 1 } else { 2 };
            if critical {
                format!("Water level {tank} critically low ({value:.0}%)")
            } else {
                format!("Water level {tank} below half capacity ({value:.0}%)")
            }
        }
    }
}
