// pacing.rs
use std::thread;
use std::time::{Duration, Instant};

/// Spaces out the external calls of one stage.
///
/// Calls are sequential; `wait` blocks until at least `interval` has passed
/// since the previous call was released.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Block until the next call is allowed. The first call never waits.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }

    /// Back off for `extra` after a provider error. The regular interval
    /// still applies to the call that follows.
    pub fn cooldown(&mut self, extra: Duration) {
        thread::sleep(extra);
        self.last = Some(Instant::now());
    }
}
