//! Terminal error type for attempt loops.
use std::fmt;

/// Terminal error returned by [`RetryEngine::do_attempts`](crate::RetryEngine::do_attempts).
///
/// Every non-success outcome is either the operation's own error, verbatim, or the
/// budget-exhausted sentinel. The engine never invents interpretation of the operation's
/// error. The sentinel is a distinct variant, so telling it apart from a caller error never
/// depends on message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation's last error, returned when it declined to continue.
    Inner(E),
    /// The attempt budget ran out while the operation still wanted to continue.
    Exhausted { attempts: usize },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner(e) => write!(f, "{}", e),
            Self::Exhausted { attempts } => {
                write!(f, "retry budget exhausted after {} attempts", attempts)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Exhausted { .. } => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Check if this error is the exhausted-retries sentinel.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Check if this error wraps an operation error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Borrow the operation error if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Exhausted { .. } => None,
        }
    }

    /// Extract the operation error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Exhausted { .. } => None,
        }
    }

    /// Number of attempts consumed, if this is the exhausted sentinel.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::Exhausted { attempts } => Some(*attempts),
            Self::Inner(_) => None,
        }
    }
}
