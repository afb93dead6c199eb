// src/checker/throttle.rs
// =============================================================================
// Fixed-delay pacing: sleep before every call except the first.
//
// Used for outgoing header requests, for pages within a run and for page
// batches. It is the only backpressure the crawler puts on servers, so every
// request path has to go through one.
// =============================================================================

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    calls: usize,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay, calls: 0 }
    }

    /// Wait for the delay unless this is the first call
    pub async fn wait(&mut self) {
        if self.calls > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls += 1;
    }

    /// How many times `wait` has returned
    pub fn calls(&self) -> usize {
        self.calls
    }
}
