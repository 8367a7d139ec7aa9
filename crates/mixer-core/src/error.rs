//! Error types for the Mixer core.
//!
//! The core defines only the failures of its own protocol. Anything raised by
//! a leaf, a hook or a diagnostic sink travels through [`MixError`] unchanged.

use thiserror::Error;

/// Boxed domain error carried by [`MixError::Handler`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while accepting or processing an item.
#[derive(Debug, Error)]
pub enum MixError {
    /// A process phase was requested for an item no mixer accepted.
    #[error("item was never accepted")]
    NotAccepted,

    /// The ambient cancellation signal was observed at a step boundary.
    #[error("traversal cancelled")]
    Cancelled,

    /// A mixer claimed the item itself but has no process action for it.
    #[error("mixer '{mixer}' claimed the item but does not process claims")]
    UnprocessedClaim {
        /// Display name of the claiming mixer.
        mixer: String,
    },

    /// A claim route does not fit the mixer tree it is replayed on.
    #[error("route hop {index} is out of range for mixer '{mixer}' with {children} children")]
    InvalidRoute {
        /// Display name of the mixer the hop was taken from.
        mixer: String,
        /// The offending child index.
        index: usize,
        /// Number of children the mixer actually has.
        children: usize,
    },

    /// The diagnostic sink failed.
    #[error("diagnostic sink error: {0}")]
    Diagnostic(String),

    /// A domain failure raised by a leaf, hook or processor.
    #[error(transparent)]
    Handler(#[from] BoxError),
}

impl MixError {
    /// Wraps an arbitrary domain error.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Handler(err.into())
    }

    /// Creates a diagnostic sink error.
    pub fn diagnostic(msg: impl Into<String>) -> Self {
        Self::Diagnostic(msg.into())
    }

    /// Returns `true` if this error came from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for mixer operations.
pub type MixResult<T> = Result<T, MixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("upstream refused")]
    struct Refused;

    #[test]
    fn test_handler_error_keeps_source_message() {
        let err = MixError::handler(Refused);
        assert_eq!(err.to_string(), "upstream refused");
        assert!(matches!(err, MixError::Handler(ref inner) if inner.is::<Refused>()));
    }

    #[test]
    fn test_string_errors_become_handler_errors() {
        let err = MixError::handler("bad payload");
        assert_eq!(err.to_string(), "bad payload");
        assert!(!err.is_cancelled());
    }
}
