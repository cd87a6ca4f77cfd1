//! Opt-in conversion of panics into ordinary attempt outcomes.
//!
//! The engine never catches panics: an abnormal termination inside an attempt unwinds
//! straight through [`do_attempts`](crate::RetryEngine::do_attempts). Callers who want a
//! panicking attempt to count as a retryable failure wrap their operation with
//! [`catch_panics`] and decide, per panic, what outcome it maps to.
//!
//! Example
//! ```rust
//! use stubborn::recover::{catch_panics, panic_message};
//! use stubborn::{AttemptOutcome, RetryEngine};
//!
//! #[derive(Debug)]
//! struct OpError(String);
//! impl std::fmt::Display for OpError { fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) } }
//! impl std::error::Error for OpError {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = RetryEngine::with_max_attempts(3);
//! let op = catch_panics(
//!     |_attempt| async { panic!("something went badly wrong") },
//!     |attempt, payload| {
//!         AttemptOutcome::<(), _>::of(
//!             attempt < 3,
//!             Err(OpError(format!("panic: {}", panic_message(&payload)))),
//!         )
//!     },
//! );
//! // Attempt 3 declines to continue, so the converted panic comes back verbatim.
//! let err = engine.do_attempts(op).await.unwrap_err();
//! assert_eq!(err.to_string(), "panic: something went badly wrong");
//! # });
//! ```

use crate::engine::AttemptOutcome;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Payload of a caught panic.
pub type PanicPayload = Box<dyn Any + Send>;

/// Wrap an attempt-indexed operation so panics become caller-chosen outcomes.
///
/// Catches unwinds both from invoking `operation` and from driving the future it returns.
/// `on_panic` receives the attempt number and the panic payload; because the panic destroyed
/// whatever continuation decision the attempt would have made, the wrapper is where that
/// decision is re-derived (typically from the attempt number alone).
///
/// Panics that abort the process are not catchable; this helper only converts unwinds.
pub fn catch_panics<Op, Fut, T, E, P>(
    mut operation: Op,
    on_panic: P,
) -> impl FnMut(usize) -> BoxFuture<'static, AttemptOutcome<T, E>>
where
    Op: FnMut(usize) -> Fut + Send,
    Fut: Future<Output = AttemptOutcome<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    P: Fn(usize, PanicPayload) -> AttemptOutcome<T, E> + Clone + Send + 'static,
{
    move |attempt| -> BoxFuture<'static, AttemptOutcome<T, E>> {
        let on_panic = on_panic.clone();
        match std::panic::catch_unwind(AssertUnwindSafe(|| operation(attempt))) {
            Ok(fut) => {
                let fut = AssertUnwindSafe(fut).catch_unwind();
                Box::pin(async move {
                    match fut.await {
                        Ok(outcome) => outcome,
                        Err(payload) => on_panic(attempt, payload),
                    }
                })
            }
            Err(payload) => Box::pin(async move { on_panic(attempt, payload) }),
        }
    }
}

/// Extract a human-readable message from a panic payload.
///
/// Understands the two payload types `panic!` produces (`&str` and `String`); anything else
/// gets a fixed fallback text.
pub fn panic_message(payload: &PanicPayload) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RetryEngine;
    use crate::sleeper::InstantSleeper;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError(String);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError: {}", self.0)
        }
    }

    impl std::error::Error for TestError {}

    fn quiet_panics() {
        // Keep expected unwinds out of test output.
        std::panic::set_hook(Box::new(|_| {}));
    }

    #[tokio::test]
    async fn panic_converts_to_error_and_keeps_retrying() {
        quiet_panics();
        let engine = RetryEngine::with_max_attempts(20).with_sleeper(InstantSleeper);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let op = catch_panics(
            move |attempt| {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if attempt > 2 {
                        panic!("I don't like three");
                    }
                    AttemptOutcome::<(), _>::of(
                        attempt < 5,
                        Err(TestError("something went wrong".to_string())),
                    )
                }
            },
            |attempt, payload| {
                AttemptOutcome::of(
                    attempt < 5,
                    Err(TestError(format!("panic: {}", panic_message(&payload)))),
                )
            },
        );

        let result = engine.do_attempts(op).await;
        let _ = std::panic::take_hook();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let err = result.unwrap_err();
        assert!(!err.is_exhausted());
        assert_eq!(err.into_inner().unwrap().0, "panic: I don't like three");
    }

    #[tokio::test]
    async fn panic_before_future_is_caught_too() {
        quiet_panics();
        let engine = RetryEngine::with_max_attempts(3).with_sleeper(InstantSleeper);

        let op = catch_panics(
            |_attempt| -> futures::future::Ready<AttemptOutcome<(), TestError>> {
                panic!("constructor blew up")
            },
            |_attempt, payload| {
                AttemptOutcome::Halt(TestError(format!("panic: {}", panic_message(&payload))))
            },
        );

        let result = engine.do_attempts(op).await;
        let _ = std::panic::take_hook();

        assert_eq!(
            result.unwrap_err().into_inner().unwrap().0,
            "panic: constructor blew up",
        );
    }

    #[test]
    fn panic_message_understands_common_payloads() {
        let s: PanicPayload = Box::new("static message");
        assert_eq!(panic_message(&s), "static message");

        let owned: PanicPayload = Box::new(String::from("owned message"));
        assert_eq!(panic_message(&owned), "owned message");

        let odd: PanicPayload = Box::new(17_u32);
        assert_eq!(panic_message(&odd), "unknown panic payload");
    }
}
