//! Periodic driver that feeds a [`ReadingSource`] into the [`Farm`].
//!
//! The ticker is an explicit spawned task with its own cancellation handle.
//! Stopping it prevents future ticks; a tick already running always
//! completes, since the store update happens outside the `select!`.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::farm::Farm;
use crate::simulator::ReadingSource;

// ---

/// Handle to a running tick loop.
#[derive(Debug)]
pub struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<u64>,
}

impl Ticker {
    /// Spawn a loop that advances `farm` from `source` every `period`.
    ///
    /// The first tick fires one full period after spawning; the seed reading
    /// stays current until then. The loop also stops when the farm shuts down.
    pub fn spawn<S>(farm: Farm, source: S, period: Duration) -> Self
    where
        S: ReadingSource + Send + 'static,
    {
        // ---
        let cancel = farm.shutdown_token().child_token();
        let handle = tokio::spawn(tick_task(farm, source, period, cancel.clone()));
        info!(period_ms = period.as_millis() as u64, "ticker started");
        Self { cancel, handle }
    }

    /// Cancel future ticks and wait for the loop to exit.
    ///
    /// Returns the number of ticks performed.
    pub async fn stop(self) -> u64 {
        // ---
        self.cancel.cancel();
        match self.handle.await {
            Ok(ticks) => {
                info!(ticks, "ticker stopped");
                ticks
            }
            Err(e) => {
                warn!(error = %e, "ticker task ended abnormally");
                0
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

async fn tick_task<S>(farm: Farm, mut source: S, period: Duration, cancel: CancellationToken) -> u64
where
    S: ReadingSource + Send + 'static,
{
    // ---
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let telemetry = farm.advance(&mut source, Utc::now()).await;
                ticks += 1;
                debug!(sequence = telemetry.sequence, live = telemetry.source.is_live(), "tick");
            }
        }
    }

    ticks
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::farm::FarmSeed;
    use crate::simulator::Simulator;

    fn farm() -> Farm {
        Farm::new(FarmSeed::standard(Utc::now()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_fixed_period() {
        // ---
        let farm = farm();
        let ticker = Ticker::spawn(farm.clone(), Simulator::seeded(5), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(farm.telemetry().sequence, 3);

        assert_eq!(ticker.stop().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_ticks() {
        // ---
        let farm = farm();
        let ticker = Ticker::spawn(farm.clone(), Simulator::seeded(5), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        ticker.stop().await;
        let frozen = farm.telemetry().sequence;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(farm.telemetry().sequence, frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_farm_shutdown_stops_ticker() {
        // ---
        let farm = farm();
        let ticker = Ticker::spawn(farm.clone(), Simulator::seeded(5), Duration::from_secs(3));

        farm.shutdown();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!ticker.is_running());
        assert_eq!(ticker.stop().await, 0);
    }
}
