//! Periodic poll trigger on the monotonic clock.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Heartbeat driving the poll cycle. The initial immediate request is
/// the collector's job, so an enabled heartbeat first fires one full
/// period after construction. Missed ticks collapse into a single
/// pending fire; requests are cheap and queueing them is pointless.
pub struct Heartbeat {
    interval: Option<Interval>,
}

impl Heartbeat {
    /// `interval_ms == 0` disables periodic polling entirely.
    pub fn new(interval_ms: u64) -> Self {
        let interval = (interval_ms > 0).then(|| {
            let period = Duration::from_millis(interval_ms);
            let mut iv = time::interval_at(Instant::now() + period, period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
            iv
        });
        Self { interval }
    }

    pub fn enabled(&self) -> bool {
        self.interval.is_some()
    }

    /// Complete on the next expiry; never completes when disabled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(iv) => {
                iv.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_configured_cadence() {
        let mut hb = Heartbeat::new(200);
        let start = Instant::now();

        hb.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        hb.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_before_the_first_period() {
        let mut hb = Heartbeat::new(200);
        let early = time::timeout(Duration::from_millis(199), hb.tick()).await;
        assert!(early.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_ticks() {
        let mut hb = Heartbeat::new(0);
        assert!(!hb.enabled());
        let res = time::timeout(Duration::from_secs(3600), hb.tick()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_gets_one_pending_fire_not_a_backlog() {
        let mut hb = Heartbeat::new(100);
        // Sleep through five periods without ticking.
        time::sleep(Duration::from_millis(550)).await;

        hb.tick().await; // the single pending fire
        let start = Instant::now();
        hb.tick().await; // next fire realigns to the cadence
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
