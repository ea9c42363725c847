//! Maps a reading to per-metric severity bands.
//!
//! `classify` is a pure, total function: same reading and thresholds in,
//! same [`Status`] out. Boundaries are half-open and the critical condition
//! is checked first, so a value past both limits is always `Critical`.
//!
//! Soil nutrients use the separate three-band [`NutrientBand`] scheme.

use serde::{Deserialize, Serialize};

use crate::models::{Metric, NutrientBand, SensorReading, Severity};

// ---

/// Severity limits for every monitored metric.
///
/// The defaults are the dashboard's fixed thresholds. `config` may override
/// them from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    // ---
    /// Warning when temperature is strictly above this (°C).
    pub temperature_warning_c: f64,
    /// Critical when temperature is strictly above this (°C).
    pub temperature_critical_c: f64,
    /// Warning when humidity is strictly above this (%).
    pub humidity_warning_pct: f64,
    /// Warning when soil moisture is strictly below this (%).
    pub soil_moisture_warning_pct: f64,
    /// Critical when soil moisture is strictly below this (%).
    pub soil_moisture_critical_pct: f64,
    /// Warning when pH is strictly below this.
    pub ph_min: f64,
    /// Warning when pH is strictly above this.
    pub ph_max: f64,
    /// Warning when a tank is at or below this (%).
    pub water_level_warning_pct: f64,
    /// Critical when a tank is at or below this (%).
    pub water_level_critical_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_warning_c: 28.0,
            temperature_critical_c: 30.0,
            humidity_warning_pct: 80.0,
            soil_moisture_warning_pct: 50.0,
            soil_moisture_critical_pct: 40.0,
            ph_min: 6.0,
            ph_max: 7.5,
            water_level_warning_pct: 50.0,
            water_level_critical_pct: 25.0,
        }
    }
}

/// `(low_max, good_max)` in ppm: `<= low_max` is Low, `<= good_max` is Good,
/// above that Optimal.
pub const NITROGEN_BANDS: (f64, f64) = (100.0, 150.0);
pub const PHOSPHORUS_BANDS: (f64, f64) = (60.0, 100.0);
pub const POTASSIUM_BANDS: (f64, f64) = (120.0, 180.0);

/// Classification of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    // ---
    pub temperature: Severity,
    pub humidity: Severity,
    pub soil_moisture: Severity,
    pub ph: Severity,
    pub water_level_1: Severity,
    pub water_level_2: Severity,
    pub nitrogen: NutrientBand,
    pub phosphorus: NutrientBand,
    pub potassium: NutrientBand,
}

impl Status {
    pub fn severity(&self, metric: Metric) -> Severity {
        // ---
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::Ph => self.ph,
            Metric::WaterLevel1 => self.water_level_1,
            Metric::WaterLevel2 => self.water_level_2,
        }
    }

    /// Every `(metric, severity)` pair, in [`Metric::ALL`] order.
    pub fn severities(&self) -> impl Iterator<Item = (Metric, Severity)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.severity(m)))
    }

    /// The worst severity across all metrics.
    pub fn overall(&self) -> Severity {
        self.severities()
            .map(|(_, s)| s)
            .max()
            .unwrap_or(Severity::Normal)
    }
}

/// Classify `reading` against `thresholds`.
pub fn classify(reading: &SensorReading, thresholds: &Thresholds) -> Status {
    // ---
    Status {
        temperature: temperature(reading.temperature, thresholds),
        humidity: humidity(reading.humidity, thresholds),
        soil_moisture: soil_moisture(reading.soil_moisture, thresholds),
        ph: ph(reading.ph, thresholds),
        water_level_1: water_level(reading.water_level_1, thresholds),
        water_level_2: water_level(reading.water_level_2, thresholds),
        nitrogen: nutrient_band(reading.nitrogen, NITROGEN_BANDS),
        phosphorus: nutrient_band(reading.phosphorus, PHOSPHORUS_BANDS),
        potassium: nutrient_band(reading.potassium, POTASSIUM_BANDS),
    }
}

fn temperature(value: f64, t: &Thresholds) -> Severity {
    if value > t.temperature_critical_c {
        Severity::Critical
    } else if value > t.temperature_warning_c {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

fn humidity(value: f64, t: &Thresholds) -> Severity {
    if value > t.humidity_warning_pct {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

fn soil_moisture(value: f64, t: &Thresholds) -> Severity {
    if value < t.soil_moisture_critical_pct {
        Severity::Critical
    } else if value < t.soil_moisture_warning_pct {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

fn ph(value: f64, t: &Thresholds) -> Severity {
    if value < t.ph_min || value > t.ph_max {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

fn water_level(value: f64, t: &Thresholds) -> Severity {
    if value <= t.water_level_critical_pct {
        Severity::Critical
    } else if value <= t.water_level_warning_pct {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Place a nutrient concentration in its Low / Good / Optimal band.
pub fn nutrient_band(ppm: f64, (low_max, good_max): (f64, f64)) -> NutrientBand {
    // ---
    if ppm > good_max {
        NutrientBand::Optimal
    } else if ppm > low_max {
        NutrientBand::Good
    } else {
        NutrientBand::Low
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn reading() -> SensorReading {
        // ---
        SensorReading {
            temperature: 25.0,
            humidity: 60.0,
            soil_moisture: 55.0,
            water_level_1: 75.0,
            water_level_2: 82.0,
            nitrogen: 120.0,
            phosphorus: 85.0,
            potassium: 160.0,
            ph: 6.8,
            voltage: 415.0,
            current: 12.5,
            power: 8.9,
        }
    }

    fn status_of(r: SensorReading) -> Status {
        classify(&r, &Thresholds::default())
    }

    #[test]
    fn test_nominal_reading_is_all_normal() {
        // ---
        let status = status_of(reading());
        assert_eq!(status.overall(), Severity::Normal);
        assert_eq!(status.nitrogen, NutrientBand::Good);
        assert_eq!(status.phosphorus, NutrientBand::Good);
        assert_eq!(status.potassium, NutrientBand::Good);
    }

    #[test]
    fn test_soil_moisture_bands() {
        // ---
        let critical = status_of(SensorReading {
            soil_moisture: 35.0,
            ..reading()
        });
        assert_eq!(critical.soil_moisture, Severity::Critical);

        let normal = status_of(SensorReading {
            soil_moisture: 55.0,
            ..reading()
        });
        assert_eq!(normal.soil_moisture, Severity::Normal);

        let warning = status_of(SensorReading {
            soil_moisture: 45.0,
            ..reading()
        });
        assert_eq!(warning.soil_moisture, Severity::Warning);

        // Half-open: exactly 40 is not below 40.
        let edge = status_of(SensorReading {
            soil_moisture: 40.0,
            ..reading()
        });
        assert_eq!(edge.soil_moisture, Severity::Warning);
    }

    #[test]
    fn test_temperature_critical_dominates_warning() {
        // ---
        // 31 satisfies both > 28 and > 30.
        let status = status_of(SensorReading {
            temperature: 31.0,
            ..reading()
        });
        assert_eq!(status.temperature, Severity::Critical);

        let warm = status_of(SensorReading {
            temperature: 29.0,
            ..reading()
        });
        assert_eq!(warm.temperature, Severity::Warning);

        let edge = status_of(SensorReading {
            temperature: 30.0,
            ..reading()
        });
        assert_eq!(edge.temperature, Severity::Warning);
    }

    #[test]
    fn test_humidity_has_no_critical_band() {
        // ---
        let status = status_of(SensorReading {
            humidity: 99.0,
            ..reading()
        });
        assert_eq!(status.humidity, Severity::Warning);
        assert_eq!(
            status_of(SensorReading {
                humidity: 80.0,
                ..reading()
            })
            .humidity,
            Severity::Normal
        );
    }

    #[test]
    fn test_ph_outside_band_warns_on_both_sides() {
        // ---
        for value in [5.9, 7.6] {
            let status = status_of(SensorReading {
                ph: value,
                ..reading()
            });
            assert_eq!(status.ph, Severity::Warning, "pH {} should warn", value);
        }
        for value in [6.0, 7.5] {
            let status = status_of(SensorReading {
                ph: value,
                ..reading()
            });
            assert_eq!(status.ph, Severity::Normal, "pH {} should be normal", value);
        }
    }

    #[test]
    fn test_water_level_bands_are_inclusive_at_limits() {
        // ---
        let cases = [
            (15.0, Severity::Critical),
            (25.0, Severity::Critical),
            (25.1, Severity::Warning),
            (50.0, Severity::Warning),
            (50.1, Severity::Normal),
        ];
        for (level, expected) in cases {
            let status = status_of(SensorReading {
                water_level_1: level,
                water_level_2: level,
                ..reading()
            });
            assert_eq!(status.water_level_1, expected, "tank 1 at {}%", level);
            assert_eq!(status.water_level_2, expected, "tank 2 at {}%", level);
        }
    }

    #[test]
    fn test_nutrient_bands() {
        // ---
        assert_eq!(nutrient_band(100.0, NITROGEN_BANDS), NutrientBand::Low);
        assert_eq!(nutrient_band(150.0, NITROGEN_BANDS), NutrientBand::Good);
        assert_eq!(nutrient_band(151.0, NITROGEN_BANDS), NutrientBand::Optimal);
        assert_eq!(nutrient_band(55.0, PHOSPHORUS_BANDS), NutrientBand::Low);
        assert_eq!(nutrient_band(101.0, PHOSPHORUS_BANDS), NutrientBand::Optimal);
        assert_eq!(nutrient_band(181.0, POTASSIUM_BANDS), NutrientBand::Optimal);
        assert_eq!(nutrient_band(121.0, POTASSIUM_BANDS), NutrientBand::Good);
    }

    #[test]
    fn test_classify_is_deterministic() {
        // ---
        let r = SensorReading {
            temperature: 29.3,
            soil_moisture: 38.0,
            water_level_2: 20.0,
            ..reading()
        };
        let first = status_of(r);
        for _ in 0..10 {
            assert_eq!(status_of(r), first);
        }
    }

    #[test]
    fn test_custom_thresholds_shift_bands() {
        // ---
        let strict = Thresholds {
            temperature_warning_c: 24.0,
            ..Thresholds::default()
        };
        let status = classify(&reading(), &strict);
        assert_eq!(status.temperature, Severity::Warning);
    }
}
