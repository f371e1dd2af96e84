use std::future;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Repeating timer that drives `GameEngine::tick`.
///
/// Every change of period tears the old interval down and builds a new
/// one whose first tick lands one full period after the change, so a new
/// speed only affects ticks that have not been scheduled yet. A disarmed
/// clock never fires; dropping the clock cancels it.
#[derive(Debug, Default)]
pub struct GameClock {
    interval: Option<Interval>,
}

impl GameClock {
    /// A clock that does not tick until armed
    pub fn new() -> Self {
        Self { interval: None }
    }

    /// (Re)start ticking every `period`
    pub fn rearm(&mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Stop ticking until the next `rearm`
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn period(&self) -> Option<Duration> {
        self.interval.as_ref().map(Interval::period)
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick; pends forever while disarmed
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}
