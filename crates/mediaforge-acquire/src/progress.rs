//! Progress report rate limiting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Bounds how often a transfer emits progress callbacks.
///
/// Interior mutability so the throttle can be captured by a plain `Fn`
/// closure handed down to download clients.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl ProgressThrottle {
    /// Create a throttle with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Whether a report may be emitted now. Advances the window when it
    /// returns true.
    pub fn ready(&self) -> bool {
        let mut last = self.last.lock().expect("throttle lock poisoned");
        let now = Instant::now();
        match *last {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
