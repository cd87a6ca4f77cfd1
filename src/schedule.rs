//! Precomputed wait schedules.
//!
//! A schedule materializes a [`WaitStrategy`] into a fixed-length sequence of waits, computed
//! once up front. Strategy failures surface here, before any retrying begins; afterward every
//! per-attempt lookup is O(1) and side-effect-free. Schedules are immutable and cheap to clone.

use crate::strategy::{StrategyError, WaitStrategy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Errors returned by schedule construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The requested length was zero; a schedule holds at least the start value.
    InvalidLength(usize),
    /// The strategy failed while computing the wait for `index`.
    Strategy { index: usize, source: StrategyError },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidLength(n) => {
                write!(f, "schedule length must be >= 1 (got {})", n)
            }
            ScheduleError::Strategy { index, source } => {
                write!(f, "strategy failed at slot {}: {}", index, source)
            }
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Strategy { source, .. } => Some(source),
            ScheduleError::InvalidLength(_) => None,
        }
    }
}

/// Immutable sequence of wait durations, one per potential attempt boundary.
///
/// Slot `0` is always the start value handed to [`Schedule::build`]; slot `i` is the strategy
/// applied to slot `i - 1`. A scheduled [`RetryEngine`](crate::RetryEngine) consumes slot
/// `attempt - 1` as the pause following attempt `attempt`, so schedule length bounds the
/// attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    waits: Arc<[Duration]>,
}

impl Schedule {
    /// Materialize `strategy` into a schedule of exactly `length` waits starting at `start`.
    ///
    /// The strategy is not invoked for slot 0. The first strategy failure aborts construction;
    /// no partial schedule is returned.
    pub fn build(
        strategy: &WaitStrategy,
        start: Duration,
        length: usize,
    ) -> Result<Self, ScheduleError> {
        if length == 0 {
            return Err(ScheduleError::InvalidLength(length));
        }
        let mut waits = Vec::with_capacity(length);
        waits.push(start);
        let mut last = start;
        for index in 1..length {
            last = strategy
                .next_wait(last, index)
                .map_err(|source| ScheduleError::Strategy { index, source })?;
            waits.push(last);
        }
        Ok(Self { waits: waits.into() })
    }

    /// Number of slots (and thus the attempt budget of a scheduled engine).
    pub fn len(&self) -> usize {
        self.waits.len()
    }

    /// Always false; construction rejects empty schedules.
    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    /// The wait in `slot`, if it exists.
    pub fn get(&self, slot: usize) -> Option<Duration> {
        self.waits.get(slot).copied()
    }

    /// All waits in slot order.
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// The pause consumed after 1-indexed `attempt` fails, i.e. slot `attempt - 1`.
    pub fn wait_after(&self, attempt: usize) -> Option<Duration> {
        attempt.checked_sub(1).and_then(|slot| self.get(slot))
    }

    /// Sum of every wait in the schedule, saturating on overflow.
    pub fn total_wait(&self) -> Duration {
        self.waits.iter().fold(Duration::ZERO, |acc, w| acc.checked_add(*w).unwrap_or(Duration::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn slot_zero_is_start_value_verbatim() {
        let strategy = WaitStrategy::custom(|_, _| Ok(Duration::from_secs(9)));
        let schedule =
            Schedule::build(&strategy, Duration::from_millis(123), 4).expect("schedule");
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule.get(0), Some(Duration::from_millis(123)));
    }

    #[test]
    fn constant_schedule_repeats_start() {
        let schedule =
            Schedule::build(&WaitStrategy::constant(), Duration::from_millis(1000), 5)
                .expect("schedule");
        assert_eq!(schedule.waits(), millis(&[1000, 1000, 1000, 1000, 1000]).as_slice());
    }

    #[test]
    fn fixed_difference_schedule_grows_linearly() {
        let strategy = WaitStrategy::fixed_difference(Duration::from_millis(1000));
        let schedule =
            Schedule::build(&strategy, Duration::from_millis(1000), 5).expect("schedule");
        assert_eq!(schedule.waits(), millis(&[1000, 2000, 3000, 4000, 5000]).as_slice());
    }

    #[test]
    fn exponential_schedule_doubles_from_start() {
        let strategy = WaitStrategy::exponential(Duration::from_millis(1000), 2.0);
        let schedule =
            Schedule::build(&strategy, Duration::from_millis(1000), 5).expect("schedule");
        assert_eq!(schedule.waits(), millis(&[1000, 2000, 4000, 8000, 16000]).as_slice());
    }

    #[test]
    fn strategy_failure_aborts_construction() {
        let strategy = WaitStrategy::custom(|last, index| {
            if index >= 3 {
                Err(StrategyError::new("ran out of waits"))
            } else {
                Ok(last)
            }
        });
        let err = Schedule::build(&strategy, Duration::from_secs(1), 5).unwrap_err();
        match err {
            ScheduleError::Strategy { index, source } => {
                assert_eq!(index, 3);
                assert_eq!(source.message(), "ran out of waits");
            }
            e => panic!("expected Strategy error, got {:?}", e),
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        let err =
            Schedule::build(&WaitStrategy::constant(), Duration::from_secs(1), 0).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidLength(0)));
    }

    #[test]
    fn length_one_never_invokes_strategy() {
        let strategy = WaitStrategy::custom(|_, _| Err(StrategyError::new("must not be called")));
        let schedule = Schedule::build(&strategy, Duration::from_secs(2), 1).expect("schedule");
        assert_eq!(schedule.waits(), &[Duration::from_secs(2)]);
    }

    #[test]
    fn wait_after_maps_attempt_to_previous_slot() {
        let strategy = WaitStrategy::fixed_difference(Duration::from_millis(100));
        let schedule =
            Schedule::build(&strategy, Duration::from_millis(100), 3).expect("schedule");
        assert_eq!(schedule.wait_after(1), Some(Duration::from_millis(100)));
        assert_eq!(schedule.wait_after(3), Some(Duration::from_millis(300)));
        assert_eq!(schedule.wait_after(0), None);
        assert_eq!(schedule.wait_after(4), None);
    }

    #[test]
    fn total_wait_sums_all_slots() {
        let strategy = WaitStrategy::fixed_difference(Duration::from_millis(1000));
        let schedule =
            Schedule::build(&strategy, Duration::from_millis(1000), 5).expect("schedule");
        assert_eq!(schedule.total_wait(), Duration::from_millis(15000));
    }

    #[test]
    fn error_display_names_failing_slot() {
        let err = ScheduleError::Strategy { index: 2, source: StrategyError::new("boom") };
        let msg = err.to_string();
        assert!(msg.contains("slot 2"));
        assert!(msg.contains("boom"));
    }
}
