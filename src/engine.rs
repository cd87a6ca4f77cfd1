//! Retry engine implementation
//!
//! Attempt loop for fallible async operations.
//!
//! Semantics:
//! - Attempts are 1-indexed; the operation receives the attempt number on every call.
//! - The operation owns the continuation decision: each attempt returns an
//!   [`AttemptOutcome`] saying whether a failure should be retried.
//! - Success always halts the loop, even when the operation asked to continue.
//! - An unbounded-schedule engine retries up to `max_attempts` with no delay between
//!   attempts; a scheduled engine sleeps the precomputed wait belonging to the attempt that
//!   just failed, and its attempt budget is the schedule length.
//! - Sleeper controls how waits are applied (production uses `TokioSleeper`; tests can
//!   inject `InstantSleeper`/`TrackingSleeper`).
//!
//! Invariants:
//! - The operation is invoked at most `max_attempts` (or schedule length) times.
//! - Schedule slot `attempt - 1` governs the pause following attempt `attempt`; the pause
//!   owed by the final attempt is consumed before exhaustion is reported.
//! - Each `do_attempts` call is strictly sequential; the engine never runs the operation
//!   concurrently with itself.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use stubborn::{AttemptOutcome, RetryEngine, Schedule, WaitStrategy};
//!
//! #[derive(Debug)]
//! struct MyErr;
//! impl std::fmt::Display for MyErr { fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "oops") } }
//! impl std::error::Error for MyErr {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let schedule = Schedule::build(
//!     &WaitStrategy::exponential(Duration::from_millis(10), 2.0),
//!     Duration::from_millis(10),
//!     3,
//! )
//! .unwrap();
//! let engine = RetryEngine::with_schedule(schedule);
//! let result: Result<(), _> = engine
//!     .do_attempts(|attempt| async move { AttemptOutcome::of(attempt < 3, Err(MyErr)) })
//!     .await;
//! assert!(result.is_err());
//! # });
//! ```

use crate::error::RetryError;
use crate::schedule::Schedule;
use crate::sleeper::{Sleeper, TokioSleeper};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_layer::Layer;
use tower_service::Service;

/// Attempt budget of a freshly constructed [`RetryEngine`].
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Per-attempt result contract returned by the retried operation.
///
/// [`AttemptOutcome::of`] maps the `(should_continue, result)` pair onto the variants: an
/// `Ok` result is `Success` unconditionally, an `Err` becomes `Retry` or `Halt` depending on
/// the continuation flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T, E> {
    /// The operation succeeded; the loop halts regardless of any continuation wish.
    Success(T),
    /// The operation failed and wants another attempt if budget remains.
    Retry(E),
    /// The operation failed and declines to continue; the error is returned verbatim.
    Halt(E),
}

impl<T, E> AttemptOutcome<T, E> {
    /// Combine a continuation decision with an attempt result.
    pub fn of(should_continue: bool, result: Result<T, E>) -> Self {
        match (result, should_continue) {
            (Ok(value), _) => Self::Success(value),
            (Err(error), true) => Self::Retry(error),
            (Err(error), false) => Self::Halt(error),
        }
    }
}

#[derive(Debug, Clone)]
enum AttemptBudget {
    Unbounded { max_attempts: usize },
    Scheduled { schedule: Schedule },
}

/// Retry engine driving an attempt-indexed operation to a terminal result.
///
/// Two construction-time variants share one attempt loop: [`with_max_attempts`] retries with
/// zero delay up to a fixed count, [`with_schedule`] sleeps the precomputed waits and is
/// bounded by schedule length. An engine is cheap to clone and safe to use from many tasks at
/// once; each `do_attempts` call owns its attempt counter and the budget is read-only.
///
/// [`with_max_attempts`]: RetryEngine::with_max_attempts
/// [`with_schedule`]: RetryEngine::with_schedule
#[derive(Debug, Clone)]
pub struct RetryEngine {
    budget: AttemptBudget,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryEngine {
    /// Engine in unbounded-schedule mode: up to `max_attempts` attempts, no waiting.
    ///
    /// A budget of zero still performs the first attempt before reporting exhaustion.
    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self { budget: AttemptBudget::Unbounded { max_attempts }, sleeper: Arc::new(TokioSleeper) }
    }

    /// Engine in scheduled mode: the schedule supplies both waits and the attempt budget.
    pub fn with_schedule(schedule: Schedule) -> Self {
        Self { budget: AttemptBudget::Scheduled { schedule }, sleeper: Arc::new(TokioSleeper) }
    }

    /// Swap the waiting implementation (test injection).
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Drive `operation` until it succeeds, declines to continue, or the budget runs out.
    ///
    /// The terminal result is one of exactly three things: the success value, the
    /// operation's own last error ([`RetryError::Inner`], verbatim), or the exhausted
    /// sentinel ([`RetryError::Exhausted`]). Panics inside the operation are not caught; see
    /// [`crate::recover`] for the opt-in conversion wrapper.
    pub async fn do_attempts<T, E, Fut, Op>(&self, mut operation: Op) -> Result<T, RetryError<E>>
    where
        T: Send,
        E: std::error::Error + Send + Sync + 'static,
        Fut: Future<Output = AttemptOutcome<T, E>> + Send,
        Op: FnMut(usize) -> Fut + Send,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                AttemptOutcome::Success(value) => return Ok(value),
                AttemptOutcome::Halt(error) => {
                    tracing::debug!(attempt, "operation declined to continue");
                    return Err(RetryError::Inner(error));
                }
                AttemptOutcome::Retry(error) => match &self.budget {
                    AttemptBudget::Unbounded { max_attempts } => {
                        if attempt >= *max_attempts {
                            tracing::warn!(attempts = attempt, error = %error, "retry budget exhausted");
                            return Err(RetryError::Exhausted { attempts: attempt });
                        }
                        tracing::debug!(attempt, error = %error, "attempt failed, retrying");
                    }
                    AttemptBudget::Scheduled { schedule } => {
                        // Slot attempt-1 is the pause owed by the attempt that just failed;
                        // it is consumed even when exhaustion follows.
                        let wait = schedule.wait_after(attempt).unwrap_or(Duration::ZERO);
                        tracing::debug!(attempt, wait = ?wait, error = %error, "attempt failed, waiting");
                        self.sleeper.sleep(wait).await;
                        if attempt >= schedule.len() {
                            tracing::warn!(attempts = attempt, error = %error, "retry budget exhausted");
                            return Err(RetryError::Exhausted { attempts: attempt });
                        }
                    }
                },
            }
            attempt += 1;
        }
    }
}

/// Tower-native retry layer.
///
/// A `Service` has no channel for the continuation decision, so the layer carries a
/// `should_continue` predicate that supplies it per failed attempt, mapping service calls
/// onto the [`AttemptOutcome`] contract of the core loop.
pub struct RetryLayer<E> {
    budget: AttemptBudget,
    should_continue: Arc<dyn Fn(&E, usize) -> bool + Send + Sync>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> RetryLayer<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Layer in unbounded-schedule mode.
    pub fn with_max_attempts<F>(max_attempts: usize, should_continue: F) -> Self
    where
        F: Fn(&E, usize) -> bool + Send + Sync + 'static,
    {
        Self {
            budget: AttemptBudget::Unbounded { max_attempts },
            should_continue: Arc::new(should_continue),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Layer in scheduled mode.
    pub fn with_schedule<F>(schedule: Schedule, should_continue: F) -> Self
    where
        F: Fn(&E, usize) -> bool + Send + Sync + 'static,
    {
        Self {
            budget: AttemptBudget::Scheduled { schedule },
            should_continue: Arc::new(should_continue),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Swap the waiting implementation (test injection).
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self {
            budget: self.budget.clone(),
            should_continue: self.should_continue.clone(),
            sleeper: self.sleeper.clone(),
        }
    }
}

impl<E> std::fmt::Debug for RetryLayer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryLayer")
            .field("budget", &self.budget)
            .field("should_continue", &"<predicate>")
            .field("sleeper", &self.sleeper)
            .finish()
    }
}

/// Retry service produced by `RetryLayer`.
#[derive(Debug, Clone)]
pub struct RetryService<S, E> {
    inner: S,
    layer: RetryLayer<E>,
}

impl<S, E> RetryService<S, E> {
    fn new(inner: S, layer: RetryLayer<E>) -> Self {
        Self { inner, layer }
    }
}

impl<S, E, Request> Service<Request> for RetryService<S, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<E>,
    S::Future: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = RetryError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|e| RetryError::Inner(e.into()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let layer = self.layer.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            let engine =
                RetryEngine { budget: layer.budget.clone(), sleeper: layer.sleeper.clone() };
            let should_continue = layer.should_continue.clone();
            engine
                .do_attempts(move |attempt| {
                    let mut inner = inner.clone();
                    let req = req.clone();
                    let should_continue = should_continue.clone();
                    async move {
                        match inner.call(req).await {
                            Ok(response) => AttemptOutcome::Success(response),
                            Err(error) => {
                                let error: E = error.into();
                                AttemptOutcome::of(should_continue(&error, attempt), Err(error))
                            }
                        }
                    }
                })
                .await
        })
    }
}

impl<S, E> Layer<S> for RetryLayer<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    type Service = RetryService<S, E>;
    fn layer(&self, service: S) -> Self::Service {
        RetryService::new(service, self.clone())
    }
}
