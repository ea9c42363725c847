//! Data models shared by every component of the telemetry core.
//!
//! These are plain values: readings, severities, alerts and device flags.
//! Behaviour lives in the component modules (`simulator`, `classifier`,
//! `alerts`, `devices`); this module only defines shapes, conversions and
//! the ingestion-boundary clamp.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ---

/// One immutable snapshot of every sensor on the farm.
///
/// A new value is produced on every tick and replaces the previous one as
/// "current"; nothing mutates a reading in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    // ---
    /// Air temperature, °C.
    pub temperature: f64,
    /// Relative humidity, %.
    pub humidity: f64,
    /// Soil moisture, %.
    pub soil_moisture: f64,
    /// Primary tank fill level, %.
    pub water_level_1: f64,
    /// Secondary tank fill level, %.
    pub water_level_2: f64,
    /// Soil nitrogen, ppm.
    pub nitrogen: f64,
    /// Soil phosphorus, ppm.
    pub phosphorus: f64,
    /// Soil potassium, ppm.
    pub potassium: f64,
    pub ph: f64,
    /// Motor supply voltage, V.
    pub voltage: f64,
    /// Motor current draw, A.
    pub current: f64,
    /// Motor power, kW.
    pub power: f64,
}

impl SensorReading {
    // ---
    /// Clamp every field into its physical range.
    ///
    /// Applied at the ingestion boundary (external inputs, real feeds) so the
    /// classifier never sees out-of-range values and stays error-free.
    /// Percentages land in `[0, 100]`, pH in `[0, 14]`, concentrations and
    /// electrical values are non-negative. `NaN` collapses to the lower bound.
    pub fn sanitized(self) -> Self {
        // ---
        Self {
            temperature: bounded(self.temperature, f64::MIN, f64::MAX),
            humidity: percent(self.humidity),
            soil_moisture: percent(self.soil_moisture),
            water_level_1: percent(self.water_level_1),
            water_level_2: percent(self.water_level_2),
            nitrogen: non_negative(self.nitrogen),
            phosphorus: non_negative(self.phosphorus),
            potassium: non_negative(self.potassium),
            ph: bounded(self.ph, 0.0, 14.0),
            voltage: non_negative(self.voltage),
            current: non_negative(self.current),
            power: non_negative(self.power),
        }
    }

    /// Overlay externally fed soil and supply values onto this reading.
    pub fn with_inputs(self, inputs: &ExternalInputs) -> Self {
        // ---
        Self {
            nitrogen: inputs.nitrogen.unwrap_or(self.nitrogen),
            phosphorus: inputs.phosphorus.unwrap_or(self.phosphorus),
            potassium: inputs.potassium.unwrap_or(self.potassium),
            ph: inputs.ph.unwrap_or(self.ph),
            voltage: inputs.voltage.unwrap_or(self.voltage),
            ..self
        }
    }
}

fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo.max(0.0).min(hi)
    } else {
        value.clamp(lo, hi)
    }
}

fn percent(value: f64) -> f64 {
    bounded(value, 0.0, 100.0)
}

fn non_negative(value: f64) -> f64 {
    bounded(value, 0.0, f64::MAX)
}

/// Values the simulator does not generate: NPK, pH and supply voltage.
///
/// Every field is optional; absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalInputs {
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub ph: Option<f64>,
    pub voltage: Option<f64>,
}

// ---

/// Severity band for a monitored metric. Ordered: `Normal < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Three-band label for soil nutrients. Kept apart from [`Severity`]
/// because "Optimal" is the top band here, not a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientBand {
    Low,
    Good,
    Optimal,
}

/// Metrics that carry a [`Severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Humidity,
    SoilMoisture,
    Ph,
    WaterLevel1,
    WaterLevel2,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::Ph,
        Metric::WaterLevel1,
        Metric::WaterLevel2,
    ];

    /// The value of this metric within a reading.
    pub fn value_in(self, reading: &SensorReading) -> f64 {
        // ---
        match self {
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
            Metric::SoilMoisture => reading.soil_moisture,
            Metric::Ph => reading.ph,
            Metric::WaterLevel1 => reading.water_level_1,
            Metric::WaterLevel2 => reading.water_level_2,
        }
    }
}

// ---

/// Opaque alert identity, unique and stable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AlertId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Critical,
    Warning,
    Info,
}

impl From<Severity> for AlertKind {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => AlertKind::Critical,
            Severity::Warning => AlertKind::Warning,
            Severity::Normal => AlertKind::Info,
        }
    }
}

/// Structured reason an alert was raised automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCause {
    pub metric: Metric,
    pub severity: Severity,
}

/// A single entry in the alert log.
///
/// Only `acknowledged` ever changes, and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    // ---
    pub id: AlertId,
    pub kind: AlertKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<AlertCause>,
}

impl Alert {
    /// A fresh, unacknowledged alert with no structured cause.
    pub fn new(kind: AlertKind, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        // ---
        Self {
            id: AlertId::new(),
            kind,
            message: message.into(),
            created_at,
            acknowledged: false,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: AlertCause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn acknowledged(mut self) -> Self {
        self.acknowledged = true;
        self
    }
}

// ---

/// The fixed set of controllable devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceId {
    WaterPump,
    #[serde(rename = "motor3Phase")]
    Motor3Phase,
    Irrigation,
    Ventilation,
}

impl DeviceId {
    pub const ALL: [DeviceId; 4] = [
        DeviceId::WaterPump,
        DeviceId::Motor3Phase,
        DeviceId::Irrigation,
        DeviceId::Ventilation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceId::WaterPump => "waterPump",
            DeviceId::Motor3Phase => "motor3Phase",
            DeviceId::Irrigation => "irrigation",
            DeviceId::Ventilation => "ventilation",
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| CoreError::UnknownDevice { id: s.to_string() })
    }
}

/// On/off flag for every device in [`DeviceId::ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub water_pump: bool,
    #[serde(rename = "motor3Phase")]
    pub motor_3_phase: bool,
    pub irrigation: bool,
    pub ventilation: bool,
}

impl DeviceState {
    pub fn get(&self, device: DeviceId) -> bool {
        // ---
        match device {
            DeviceId::WaterPump => self.water_pump,
            DeviceId::Motor3Phase => self.motor_3_phase,
            DeviceId::Irrigation => self.irrigation,
            DeviceId::Ventilation => self.ventilation,
        }
    }

    pub(crate) fn slot_mut(&mut self, device: DeviceId) -> &mut bool {
        // ---
        match device {
            DeviceId::WaterPump => &mut self.water_pump,
            DeviceId::Motor3Phase => &mut self.motor_3_phase,
            DeviceId::Irrigation => &mut self.irrigation,
            DeviceId::Ventilation => &mut self.ventilation,
        }
    }
}

// ---

/// Inert automation switches from the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutomationId {
    AutoIrrigation,
    AutoVentilation,
}

impl FromStr for AutomationId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "autoIrrigation" => Ok(AutomationId::AutoIrrigation),
            "autoVentilation" => Ok(AutomationId::AutoVentilation),
            other => Err(CoreError::UnknownAutomation {
                id: other.to_string(),
            }),
        }
    }
}

/// Automation flags. Nothing in the core acts on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSettings {
    pub auto_irrigation: bool,
    pub auto_ventilation: bool,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            auto_irrigation: true,
            auto_ventilation: true,
        }
    }
}

impl AutomationSettings {
    pub fn toggle(&mut self, id: AutomationId) -> Self {
        // ---
        match id {
            AutomationId::AutoIrrigation => self.auto_irrigation = !self.auto_irrigation,
            AutomationId::AutoVentilation => self.auto_ventilation = !self.auto_ventilation,
        }
        *self
    }
}

// ---

/// Health of whatever feeds readings into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SourceStatus {
    Live,
    Unavailable {
        reason: String,
        since: DateTime<Utc>,
    },
}

impl SourceStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, SourceStatus::Live)
    }
}
