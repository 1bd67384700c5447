use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Periodic tick source that only exists while the session runs.
///
/// Releasing drops the underlying interval, so a released driver can never
/// yield another tick. Re-acquiring starts a fresh interval whose first tick
/// is one full period away.
pub struct TickDriver {
    period: Duration,
    interval: Option<Interval>,
}

impl TickDriver {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub fn acquire(&mut self) {
        if self.interval.is_some() {
            return;
        }

        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        tracing::debug!("Tick driver armed ({}ms)", self.period.as_millis());
    }

    pub fn release(&mut self) {
        if self.interval.take().is_some() {
            tracing::debug!("Tick driver released");
        }
    }

    /// Resolves on the next tick; pending forever while released.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_released_driver_never_ticks() {
        let mut driver = TickDriver::new(Duration::from_millis(100));
        let result = tokio::time::timeout(Duration::from_secs(5), driver.tick()).await;
        assert!(result.is_err(), "Released driver must not tick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut driver = TickDriver::new(Duration::from_millis(100));
        let started = Instant::now();
        driver.acquire();
        driver.tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(100));

        driver.tick().await;
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reacquire_restarts_period() {
        let mut driver = TickDriver::new(Duration::from_millis(100));
        driver.acquire();
        driver.tick().await;
        driver.release();
        assert!(!driver.is_armed());

        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let resumed = Instant::now();
        driver.acquire();
        driver.tick().await;
        assert_eq!(resumed.elapsed(), Duration::from_millis(100));
    }
}
