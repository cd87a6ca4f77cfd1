//! Convenient re-exports for common Stubborn types.
pub use crate::{
    engine::{AttemptOutcome, RetryEngine, RetryLayer, RetryService, DEFAULT_MAX_ATTEMPTS},
    error::RetryError,
    recover::{catch_panics, panic_message},
    schedule::{Schedule, ScheduleError},
    sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper},
    strategy::{StrategyError, WaitStrategy, MAX_WAIT},
};
