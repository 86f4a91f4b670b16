//! Classified error types for dynamic route invocations.
//!
//! Only transport-level failures (network errors, timeouts, aborts) surface
//! as errors. Non-2xx HTTP responses are *returns* — an [`ApiResponse`] with
//! `success: false` — and are never retried or thrown. See
//! [`crate::response`] for that side of the taxonomy.
//!
//! [`ApiResponse`]: crate::ApiResponse

/// The error type for route invocations and client configuration.
///
/// The execution pipeline is the sole producer of these at request time:
/// route resolution and method inference are total functions and never fail
/// for valid inputs.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed,
    /// etc.). Retryable.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The attempt exceeded its timeout window. Timeouts are per-attempt, so
    /// each retry gets a fresh window. Retryable.
    #[error("Request timed out")]
    Timeout,

    /// The caller's cancellation token fired. Aborts short-circuit the
    /// current attempt and are never retried.
    #[error("Request aborted")]
    Aborted,

    /// A payload or response body could not be parsed. Not retryable.
    #[error("Parse error: {detail}")]
    Parse {
        /// What failed to parse and why.
        detail: String,
    },

    /// Invalid client or request configuration (missing base URL, invalid
    /// header values, malformed route paths).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// All retry attempts were exhausted. Wraps the last classified error so
    /// its diagnostic payload survives.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total attempts made (initial try plus retries).
        attempts: usize,
        /// The last error encountered before giving up.
        last_error: Box<Error>,
    },
}

impl Error {
    /// Classifies a transport-layer `reqwest` error into this taxonomy.
    ///
    /// Timeouts map to [`Error::Timeout`], body-decoding problems to
    /// [`Error::Parse`], and everything else to [`Error::Network`].
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_decode() {
            Error::Parse {
                detail: error.to_string(),
            }
        } else {
            Error::Network(error)
        }
    }

    /// Returns `true` if this error is potentially retryable.
    ///
    /// Only transport-level failures — network errors and timeouts — are
    /// retryable. Aborts, parse errors, and configuration errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout)
    }

    /// A short, stable label for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Timeout => "timeout",
            Error::Aborted => "abort",
            Error::Parse { .. } => "parse",
            Error::Configuration(_) | Error::InvalidUrl(_) => "configuration",
            Error::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

/// A specialized `Result` type for route invocations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::Aborted.is_retryable());
        assert!(!Error::Parse {
            detail: "bad json".to_string()
        }
        .is_retryable());
        assert!(!Error::Configuration("no base url".to_string()).is_retryable());
    }

    #[test]
    fn exhaustion_preserves_the_last_error() {
        let exhausted = Error::RetriesExhausted {
            attempts: 3,
            last_error: Box::new(Error::Timeout),
        };
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("3 attempts"));
        assert!(exhausted.to_string().contains("timed out"));
    }

    #[test]
    fn kinds_match_the_classified_taxonomy() {
        assert_eq!(Error::Timeout.kind(), "timeout");
        assert_eq!(Error::Aborted.kind(), "abort");
        assert_eq!(
            Error::Parse {
                detail: String::new()
            }
            .kind(),
            "parse"
        );
    }
}
