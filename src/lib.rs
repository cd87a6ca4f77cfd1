#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Stubborn 🐾
//!
//! Retry orchestration for async Rust: attempt loops, precomputed wait schedules, and
//! pluggable wait-time strategies.
//!
//! ## Features
//!
//! - **Attempt loop** driven by the operation's own per-attempt continuation decision
//! - **Wait-time strategies** (constant, fixed-difference, exponential, custom closures)
//! - **Precomputed schedules**: strategy failures surface before any retrying begins
//! - **Distinct exhaustion sentinel**, never confusable with an operation error
//! - **Opt-in panic conversion** for treating unwinds as retryable failures
//! - **Tower layer** for retrying services with the same loop
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use stubborn::{AttemptOutcome, RetryEngine, Schedule, WaitStrategy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let schedule = Schedule::build(
//!         &WaitStrategy::exponential(Duration::from_millis(100), 2.0),
//!         Duration::from_millis(100),
//!         5,
//!     )
//!     .expect("schedule");
//!
//!     let engine = RetryEngine::with_schedule(schedule);
//!     let result = engine
//!         .do_attempts(|attempt| async move {
//!             // Your fallible operation here; `attempt < 5` is the continuation decision.
//!             AttemptOutcome::of(attempt < 5, Ok::<_, std::io::Error>(()))
//!         })
//!         .await;
//!     assert!(result.is_ok());
//! }
//! ```

pub mod engine;
pub mod error;
pub mod prelude;
pub mod recover;
pub mod schedule;
pub mod sleeper;
pub mod strategy;

// Re-exports
pub use engine::{AttemptOutcome, RetryEngine, RetryLayer, RetryService, DEFAULT_MAX_ATTEMPTS};
pub use error::RetryError;
pub use schedule::{Schedule, ScheduleError};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use strategy::{StrategyError, WaitStrategy, MAX_WAIT};
