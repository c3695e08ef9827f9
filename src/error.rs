use std::fmt;
use thiserror::Error;

/// The step of a year's reconciliation at which a failure happened.
///
/// Stages run in declaration order; `Create` and `Clear` are alternatives
/// depending on whether the year's playlist already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Locate,
    Create,
    Clear,
    ImageApply,
    Fill,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Locate => "locate",
            Stage::Create => "create",
            Stage::Clear => "clear",
            Stage::ImageApply => "image",
            Stage::Fill => "fill",
        };
        f.write_str(name)
    }
}

/// Error types for library sorting and filtering.
///
/// Transport and API failures are fatal for the playlist sorter and logged-and-skipped
/// for the artist filter; the processors decide, the client only reports.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use liked_sorter::{SorterError, Stage};
///
/// fn report(err: &SorterError) {
///     match err {
///         SorterError::Reconcile { year, stage: Stage::Fill, .. } => {
///             eprintln!("Playlist for {year} is only partially filled, re-run to finish");
///         }
///         SorterError::RateLimit { retry_after } => {
///             eprintln!("Rate limited, retry in {retry_after} seconds");
///         }
///         other => eprintln!("Run failed: {other}"),
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum SorterError {
    /// HTTP/network related errors.
    ///
    /// Connection failures, DNS errors, unreadable bodies and other
    /// low-level transport issues.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The Web API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Error message from the response body, or the status reason
        message: String,
    },

    /// Authentication failures.
    ///
    /// # Common Causes
    /// - The user denied consent in the browser
    /// - The callback `state` did not match (stale or forged redirect)
    /// - The access token expired and could not be refreshed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limiting from the Web API.
    ///
    /// The `retry_after` field carries the `Retry-After` header value.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// Failed to parse a response body or a stored file.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Cover image generation or encoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The run's deadline passed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure before any year was reconciled (fetching the library or the user).
    #[error("{step} failed: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: Box<SorterError>,
    },

    /// A failure while reconciling one year's playlist. Later years are left untouched.
    #[error("Year {year} failed during {stage}: {source}")]
    Reconcile {
        year: i32,
        stage: Stage,
        #[source]
        source: Box<SorterError>,
    },
}

impl SorterError {
    pub(crate) fn setup(step: &'static str, source: SorterError) -> Self {
        SorterError::Setup {
            step,
            source: Box::new(source),
        }
    }

    pub(crate) fn reconcile(year: i32, stage: Stage, source: SorterError) -> Self {
        SorterError::Reconcile {
            year,
            stage,
            source: Box::new(source),
        }
    }

    /// True when the error stems from cancellation or an expired deadline,
    /// including when wrapped in a `Setup` or `Reconcile` context.
    pub fn is_cancellation(&self) -> bool {
        match self {
            SorterError::Cancelled | SorterError::DeadlineExceeded => true,
            SorterError::Setup { source, .. } | SorterError::Reconcile { source, .. } => {
                source.is_cancellation()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_error_names_year_and_stage() {
        let err = SorterError::reconcile(
            2023,
            Stage::Clear,
            SorterError::Api {
                status: 502,
                message: "Bad gateway".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Year 2023 failed during clear: API error (502): Bad gateway"
        );
    }

    #[test]
    fn test_cancellation_is_detected_through_context() {
        let err = SorterError::setup("fetching liked tracks", SorterError::Cancelled);
        assert!(err.is_cancellation());
        assert!(!SorterError::Http("reset".to_string()).is_cancellation());
    }
}
