//! HTTP client module with retry logic and error handling.

mod client;
mod retry;

pub use client::{ApiRequest, HttpClient};
pub use retry::{
    BACKOFF_CAP_MS, BACKOFF_STEP_MS, DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_MAX_RETRIES,
    RequestError, RetryPolicy,
};
