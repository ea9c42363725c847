//! Synthetic telemetry generator.
//!
//! Each tick perturbs the volatile fields of the previous reading with a
//! bounded random walk: `next = clamp(prev + uniform(-d/2, d/2), lo, hi)`.
//! Soil nutrients, pH and supply voltage are not generated here; they pass
//! through untouched so an external feed can own them.
//!
//! The simulator is one implementation of [`ReadingSource`]. A real sensor
//! bridge would implement the same trait and report outages as
//! [`CoreError::SourceUnavailable`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CoreError;
use crate::models::SensorReading;

// ---

/// Anything that can produce the next reading from the previous one.
pub trait ReadingSource {
    /// Produce the reading that follows `previous`.
    ///
    /// An `Err` means the feed is unavailable; the store keeps the last
    /// reading and flags the outage instead of freezing silently.
    fn next_reading(&mut self, previous: &SensorReading) -> Result<SensorReading, CoreError>;
}

/// Random-walk parameters for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walk {
    /// Full width of the per-tick step; the step is drawn from `[-d/2, d/2]`.
    pub delta: f64,
    pub lo: f64,
    pub hi: f64,
}

impl Walk {
    const fn new(delta: f64, lo: f64, hi: f64) -> Self {
        Self { delta, lo, hi }
    }

    fn step<R: Rng + ?Sized>(&self, previous: f64, rng: &mut R) -> f64 {
        // ---
        let half = self.delta / 2.0;
        (previous + rng.gen_range(-half..=half)).clamp(self.lo, self.hi)
    }
}

pub const TEMPERATURE: Walk = Walk::new(2.0, 20.0, 35.0);
pub const HUMIDITY: Walk = Walk::new(5.0, 40.0, 90.0);
pub const SOIL_MOISTURE: Walk = Walk::new(3.0, 20.0, 80.0);
pub const WATER_LEVEL: Walk = Walk::new(2.0, 10.0, 100.0);
pub const CURRENT: Walk = Walk::new(1.0, 8.0, 20.0);
pub const POWER: Walk = Walk::new(0.5, 5.0, 15.0);

/// Bounded random-walk generator over an injectable RNG.
#[derive(Debug)]
pub struct Simulator<R = StdRng> {
    rng: R,
}

impl Simulator<StdRng> {
    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible run from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Produce the next reading from `previous`.
    ///
    /// Total over any input: a previous value outside its walk range is
    /// pulled back inside by the clamp.
    pub fn tick(&mut self, previous: &SensorReading) -> SensorReading {
        // ---
        SensorReading {
            temperature: TEMPERATURE.step(previous.temperature, &mut self.rng),
            humidity: HUMIDITY.step(previous.humidity, &mut self.rng),
            soil_moisture: SOIL_MOISTURE.step(previous.soil_moisture, &mut self.rng),
            water_level_1: WATER_LEVEL.step(previous.water_level_1, &mut self.rng),
            water_level_2: WATER_LEVEL.step(previous.water_level_2, &mut self.rng),
            current: CURRENT.step(previous.current, &mut self.rng),
            power: POWER.step(previous.power, &mut self.rng),
            ..*previous
        }
    }
}

impl<R: Rng> ReadingSource for Simulator<R> {
    fn next_reading(&mut self, previous: &SensorReading) -> Result<SensorReading, CoreError> {
        Ok(self.tick(previous))
    }
}
