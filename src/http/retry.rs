//! Retry policy and error values for inference requests.

use reqwest::StatusCode;
use std::time::Duration;

/// Default number of attempts made for one request.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Default timeout for a single attempt in milliseconds.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 30_000;

/// Backoff grows by this step per failed attempt.
pub const BACKOFF_STEP_MS: u64 = 500;

/// Upper bound for the backoff between two attempts.
pub const BACKOFF_CAP_MS: u64 = 2_000;

/// Why a single request (or its last attempt) failed.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The server answered with a non-success status.
    #[error("HTTP error! status: {}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    /// The attempt was cancelled after its timeout elapsed.
    #[error("request attempt aborted after {}ms", .0.as_millis())]
    AttemptTimeout(Duration),

    /// The server answered 2xx without any image bytes.
    #[error("empty response body (status: {})", .0.as_u16())]
    EmptyBody(StatusCode),

    /// The request never produced a response (DNS, refused connection, reset).
    #[error("Failed to fetch: {0}")]
    Transport(#[source] reqwest::Error),
}

impl RequestError {
    /// Status code carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::EmptyBody(_)
            | RequestError::AttemptTimeout(_)
            | RequestError::Transport(_) => None,
        }
    }
}

/// Bounds for one retrying request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of network calls. Zero is treated as one.
    pub max_retries: usize,
    /// Each attempt is cancelled once this elapses.
    pub attempt_timeout: Duration,
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
    /// Return 400 and 401 immediately instead of spending the retry budget on them.
    pub fail_fast: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
            backoff_step: Duration::from_millis(BACKOFF_STEP_MS),
            backoff_cap: Duration::from_millis(BACKOFF_CAP_MS),
            fail_fast: false,
        }
    }
}

impl RetryPolicy {
    /// Number of network calls this policy allows.
    pub fn attempts(&self) -> usize {
        self.max_retries.max(1)
    }

    /// Wait after the failed attempt with 0-based index `attempt`:
    /// `min(step * (attempt + 1), cap)`.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt + 1).unwrap_or(u32::MAX);
        self.backoff_step
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }

    /// Whether a failed attempt may be followed by another one.
    pub fn is_retryable(&self, error: &RequestError) -> bool {
        if !self.fail_fast {
            return true;
        }
        !matches!(
            error.status(),
            Some(StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
        )
    }
}
