//! Abstraction for waiting between attempts
//!
//! Enables fast, deterministic tests without real time delays

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Abstraction for waiting between attempts
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Production sleeper using the tokio timer; suspends only the calling task
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test sleeper that completes immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

/// Test sleeper that records every requested wait without sleeping
#[derive(Debug, Clone)]
pub struct TrackingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self { waits: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Number of sleep calls recorded so far.
    pub fn calls(&self) -> usize {
        self.waits.lock().unwrap().len()
    }

    /// Duration requested by the `index`th sleep call.
    pub fn call_at(&self, index: usize) -> Option<Duration> {
        self.waits.lock().unwrap().get(index).copied()
    }

    /// Cumulative simulated wait across all recorded calls.
    pub fn total(&self) -> Duration {
        self.waits
            .lock()
            .unwrap()
            .iter()
            .fold(Duration::ZERO, |acc, w| acc.checked_add(*w).unwrap_or(Duration::MAX))
    }

    /// Snapshot of every recorded wait, in call order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.waits.lock().unwrap().clear();
    }
}

impl Default for TrackingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.waits.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}
