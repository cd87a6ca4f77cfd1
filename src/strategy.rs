//! Wait-time strategies for building retry schedules.
//!
//! A strategy maps `(previous wait, slot index)` to the next wait duration. Index semantics:
//! slot `0` of a schedule is always the caller-supplied start value, so strategies are only
//! invoked from `index = 1` upward. Computed waits saturate at a documented maximum to avoid
//! overflow.
//!
//! The exponential strategy recomputes each wait from the fixed start value as
//! `start * multiplier^index` (floating-point exponentiation), it does NOT compound from the
//! previous wait. The two are equivalent for the built-in progression but diverge if a custom
//! strategy hands it a different `last` value mid-schedule.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use stubborn::WaitStrategy;
//!
//! let strategy = WaitStrategy::exponential(Duration::from_millis(100), 2.0);
//! assert_eq!(
//!     strategy.next_wait(Duration::from_millis(100), 1).unwrap(),
//!     Duration::from_millis(200),
//! );
//! assert_eq!(
//!     strategy.next_wait(Duration::from_millis(200), 2).unwrap(),
//!     Duration::from_millis(400),
//! );
//! ```
//!
//! Overflow behavior: computations that would overflow saturate to `MAX_WAIT` (1 day).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Maximum wait used when calculations overflow (1 day).
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Failure raised by a custom strategy while computing the next wait.
///
/// The built-in strategies never fail; this exists so caller-defined progressions can signal
/// "no valid next wait" and abort schedule construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyError {
    message: String,
}

impl StrategyError {
    /// Create a strategy error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The caller-supplied failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait strategy failed: {}", self.message)
    }
}

impl std::error::Error for StrategyError {}

type CustomFn = dyn Fn(Duration, usize) -> Result<Duration, StrategyError> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FixedDifference {
    diff: Duration,
}

impl FixedDifference {
    fn next_wait(&self, last: Duration, _index: usize) -> Duration {
        last.checked_add(self.diff).unwrap_or(MAX_WAIT).min(MAX_WAIT)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Exponential {
    start: Duration,
    multiplier: f64,
}

impl Exponential {
    fn next_wait(&self, _last: Duration, index: usize) -> Duration {
        let factor = self.multiplier.powf(index as f64);
        if !factor.is_finite() {
            return MAX_WAIT;
        }
        let nanos = self.start.as_nanos() as f64 * factor;
        if nanos >= MAX_WAIT.as_nanos() as f64 {
            MAX_WAIT
        } else {
            // Negative products truncate to zero.
            Duration::from_nanos(nanos as u64)
        }
    }
}

#[derive(Clone)]
enum StrategyKind {
    FixedDifference(FixedDifference),
    Exponential(Exponential),
    Custom(Arc<CustomFn>),
}

/// Wait-time strategy consumed by [`Schedule::build`](crate::Schedule::build).
///
/// Strategies must be pure: deterministic for given inputs and free of external side effects.
/// Schedule construction relies on that to precompute every wait up front.
#[derive(Clone)]
pub struct WaitStrategy {
    kind: StrategyKind,
}

impl fmt::Debug for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StrategyKind::FixedDifference(s) => {
                f.debug_struct("FixedDifference").field("diff", &s.diff).finish()
            }
            StrategyKind::Exponential(s) => f
                .debug_struct("Exponential")
                .field("start", &s.start)
                .field("multiplier", &s.multiplier)
                .finish(),
            StrategyKind::Custom(_) => f.write_str("Custom(<strategy>)"),
        }
    }
}

impl WaitStrategy {
    /// Create a constant strategy: every wait repeats the schedule's start value.
    pub fn constant() -> Self {
        Self::fixed_difference(Duration::ZERO)
    }

    /// Create a fixed-difference strategy: `next = last + diff`.
    ///
    /// `diff = 0` yields a constant schedule; `diff > 0` yields linear growth.
    pub fn fixed_difference(diff: Duration) -> Self {
        Self { kind: StrategyKind::FixedDifference(FixedDifference { diff }) }
    }

    /// Create an exponential strategy: `next = start * multiplier^index`.
    ///
    /// Recomputed from `start` on every call; the `last` argument is ignored. See the module
    /// docs for the non-compounding semantics.
    pub fn exponential(start: Duration, multiplier: f64) -> Self {
        Self { kind: StrategyKind::Exponential(Exponential { start, multiplier }) }
    }

    /// Create a strategy from an arbitrary closure.
    ///
    /// The closure must be pure. Returning an error aborts schedule construction.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Duration, usize) -> Result<Duration, StrategyError> + Send + Sync + 'static,
    {
        Self { kind: StrategyKind::Custom(Arc::new(f)) }
    }

    /// Compute the wait for schedule slot `index` from the wait in slot `index - 1`.
    pub fn next_wait(&self, last: Duration, index: usize) -> Result<Duration, StrategyError> {
        match &self.kind {
            StrategyKind::FixedDifference(s) => Ok(s.next_wait(last, index)),
            StrategyKind::Exponential(s) => Ok(s.next_wait(last, index)),
            StrategyKind::Custom(f) => f(last, index),
        }
    }
}
