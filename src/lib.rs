//! Telemetry, alerting and device-control core for the SmartFarm IoT
//! dashboard.
//!
//! The pipeline runs on every tick: [`simulator`] produces a reading,
//! [`classifier`] maps it to severity bands, and [`alerts`] raises an alert
//! whenever a metric gets worse. [`devices`] holds manual on/off flags.
//! [`farm::Farm`] owns all of it behind one lock and publishes snapshots;
//! [`ticker::Ticker`] drives it on a fixed period; [`routes`] exposes it
//! over HTTP.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! callers import from this gateway rather than reaching into siblings.

pub mod alerts;
pub mod classifier;
pub mod config;
pub mod devices;
pub mod error;
pub mod farm;
pub mod models;
pub mod routes;
pub mod simulator;
pub mod ticker;

pub use classifier::{classify, Status, Thresholds};
pub use config::Config;
pub use error::CoreError;
pub use farm::{Farm, FarmSeed, Telemetry};
pub use models::{
    Alert, AlertId, AlertKind, DeviceId, DeviceState, ExternalInputs, SensorReading, Severity,
};
pub use simulator::{ReadingSource, Simulator};
pub use ticker::Ticker;
