//! Configuration loader for the `smartfarm-telemetry` service.
//!
//! All runtime settings (listen address, tick cadence, simulator seed and
//! sensor thresholds) are read here from environment variables, with
//! optional `.env` support provided by the caller. Nothing else in the
//! crate calls `env::var`.
//!
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::classifier::Thresholds;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP surface binds to.
    pub bind_addr: SocketAddr,

    /// Interval between simulator ticks.
    pub tick_interval: Duration,

    /// Fixed simulator seed; `None` seeds from OS entropy.
    pub sim_seed: Option<u64>,

    /// Severity thresholds handed to the classifier.
    pub thresholds: Thresholds,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `FARM_BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `TICK_INTERVAL_MS` – simulator cadence in ms (default: 3000, must be > 0)
/// - `SIM_SEED` – reproducible simulator seed (default: entropy)
/// - `TEMP_WARNING_C` / `TEMP_CRITICAL_C` (default: 28 / 30)
/// - `HUMIDITY_WARNING_PCT` (default: 80)
/// - `SOIL_MOISTURE_WARNING_PCT` / `SOIL_MOISTURE_CRITICAL_PCT` (default: 50 / 40)
/// - `PH_MIN` / `PH_MAX` (default: 6.0 / 7.5)
/// - `WATER_LEVEL_WARNING_PCT` / `WATER_LEVEL_CRITICAL_PCT` (default: 50 / 25)
///
/// Returns an error if any variable is malformed or the thresholds are
/// inconsistent.
pub fn load_from_env() -> Result<Config> {
    // ---
    let bind_addr = env::var("FARM_BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid FARM_BIND_ADDR: {}", e))?;

    let tick_ms = parse_env_u64!("TICK_INTERVAL_MS", 3000);
    if tick_ms == 0 {
        bail!("TICK_INTERVAL_MS must be greater than zero");
    }

    let sim_seed = env::var("SIM_SEED")
        .ok()
        .map(|v| v.parse::<u64>())
        .transpose()
        .map_err(|e| anyhow!("Invalid SIM_SEED: {}", e))?;

    let d = Thresholds::default();
    let thresholds = Thresholds {
        temperature_warning_c: parse_env_f64!("TEMP_WARNING_C", d.temperature_warning_c),
        temperature_critical_c: parse_env_f64!("TEMP_CRITICAL_C", d.temperature_critical_c),
        humidity_warning_pct: parse_env_f64!("HUMIDITY_WARNING_PCT", d.humidity_warning_pct),
        soil_moisture_warning_pct: parse_env_f64!(
            "SOIL_MOISTURE_WARNING_PCT",
            d.soil_moisture_warning_pct
        ),
        soil_moisture_critical_pct: parse_env_f64!(
            "SOIL_MOISTURE_CRITICAL_PCT",
            d.soil_moisture_critical_pct
        ),
        ph_min: parse_env_f64!("PH_MIN", d.ph_min),
        ph_max: parse_env_f64!("PH_MAX", d.ph_max),
        water_level_warning_pct: parse_env_f64!(
            "WATER_LEVEL_WARNING_PCT",
            d.water_level_warning_pct
        ),
        water_level_critical_pct: parse_env_f64!(
            "WATER_LEVEL_CRITICAL_PCT",
            d.water_level_critical_pct
        ),
    };
    validate_thresholds(&thresholds)?;

    Ok(Config {
        bind_addr,
        tick_interval: Duration::from_millis(tick_ms),
        sim_seed,
        thresholds,
    })
}

/// Reject threshold sets where a warning band would sit beyond its critical
/// band, or where percentages fall outside `[0, 100]`.
pub fn validate_thresholds(t: &Thresholds) -> Result<()> {
    // ---
    if t.temperature_warning_c >= t.temperature_critical_c {
        bail!(
            "TEMP_WARNING_C ({}) must be below TEMP_CRITICAL_C ({})",
            t.temperature_warning_c,
            t.temperature_critical_c
        );
    }
    if t.soil_moisture_critical_pct >= t.soil_moisture_warning_pct {
        bail!(
            "SOIL_MOISTURE_CRITICAL_PCT ({}) must be below SOIL_MOISTURE_WARNING_PCT ({})",
            t.soil_moisture_critical_pct,
            t.soil_moisture_warning_pct
        );
    }
    if t.water_level_critical_pct >= t.water_level_warning_pct {
        bail!(
            "WATER_LEVEL_CRITICAL_PCT ({}) must be below WATER_LEVEL_WARNING_PCT ({})",
            t.water_level_critical_pct,
            t.water_level_warning_pct
        );
    }
    if t.ph_min >= t.ph_max {
        bail!("PH_MIN ({}) must be below PH_MAX ({})", t.ph_min, t.ph_max);
    }

    let percentages = [
        ("HUMIDITY_WARNING_PCT", t.humidity_warning_pct),
        ("SOIL_MOISTURE_WARNING_PCT", t.soil_moisture_warning_pct),
        ("SOIL_MOISTURE_CRITICAL_PCT", t.soil_moisture_critical_pct),
        ("WATER_LEVEL_WARNING_PCT", t.water_level_warning_pct),
        ("WATER_LEVEL_CRITICAL_PCT", t.water_level_critical_pct),
    ];
    for (name, value) in percentages {
        if !(0.0..=100.0).contains(&value) {
            bail!("{} ({}) must be within 0..=100", name, value);
        }
    }

    Ok(())
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let t = &self.thresholds;
        let seed = self
            .sim_seed
            .map_or_else(|| "entropy".to_string(), |s| s.to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  FARM_BIND_ADDR   : {}", self.bind_addr);
        tracing::info!("  TICK_INTERVAL_MS : {}", self.tick_interval.as_millis());
        tracing::info!("  SIM_SEED         : {}", seed);
        tracing::info!(
            "  TEMPERATURE      : warn > {}°C, critical > {}°C",
            t.temperature_warning_c,
            t.temperature_critical_c
        );
        tracing::info!("  HUMIDITY         : warn > {}%", t.humidity_warning_pct);
        tracing::info!(
            "  SOIL_MOISTURE    : warn < {}%, critical < {}%",
            t.soil_moisture_warning_pct,
            t.soil_moisture_critical_pct
        );
        tracing::info!("  PH               : {} ..= {}", t.ph_min, t.ph_max);
        tracing::info!(
            "  WATER_LEVEL      : warn <= {}%, critical <= {}%",
            t.water_level_warning_pct,
            t.water_level_critical_pct
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(validate_thresholds(&Thresholds::default()).is_ok());
    }

    #[test]
    fn test_inverted_temperature_thresholds_rejected() {
        // ---
        let t = Thresholds {
            temperature_warning_c: 32.0,
            ..Thresholds::default()
        };
        let err = validate_thresholds(&t).unwrap_err();
        assert!(err.to_string().contains("TEMP_WARNING_C"));
    }

    #[test]
    fn test_inverted_tank_thresholds_rejected() {
        // ---
        let t = Thresholds {
            water_level_critical_pct: 60.0,
            ..Thresholds::default()
        };
        assert!(validate_thresholds(&t).is_err());
    }

    #[test]
    fn test_percentage_out_of_range_rejected() {
        // ---
        let t = Thresholds {
            humidity_warning_pct: 120.0,
            ..Thresholds::default()
        };
        assert!(validate_thresholds(&t).is_err());
    }

    #[test]
    fn test_empty_ph_band_rejected() {
        // ---
        let t = Thresholds {
            ph_min: 7.5,
            ph_max: 6.0,
            ..Thresholds::default()
        };
        assert!(validate_thresholds(&t).is_err());
    }
}
