//! Terminal failure categories for a generation run.

use reqwest::StatusCode;

use crate::http::RequestError;

/// Why a generation run could not complete, phrased as guidance for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error(
        "HuggingFace API key is not set. Create a token at https://huggingface.co/settings/tokens \
         and export it as HUGGINGFACE_API_KEY."
    )]
    MissingCredential,

    #[error(
        "Network connection failed. Make sure your proxy or VPN is running and that the \
         system proxy settings point at it (for example 127.0.0.1:7890)."
    )]
    NetworkUnreachable,

    #[error("The model is still loading. Wait 1-2 minutes and try again.")]
    ModelLoading,

    #[error("Too many requests. Wait a moment and try again.")]
    RateLimited,

    #[error("The API key was rejected. Check the value of HUGGINGFACE_API_KEY.")]
    InvalidCredential,

    #[error(
        "The request timed out. Try again; if it keeps timing out, check your network \
         connection or switch to another proxy node."
    )]
    RequestTimeout,

    #[error("Error while generating images: {0}")]
    Unknown(String),
}

impl GenerationError {
    /// Stable machine-readable name of the category.
    pub fn category(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => "missing-credential",
            GenerationError::NetworkUnreachable => "network-unreachable",
            GenerationError::ModelLoading => "model-loading",
            GenerationError::RateLimited => "rate-limited",
            GenerationError::InvalidCredential => "invalid-credential",
            GenerationError::RequestTimeout => "request-timeout",
            GenerationError::Unknown(_) => "unknown",
        }
    }
}

impl From<RequestError> for GenerationError {
    fn from(error: RequestError) -> Self {
        match &error {
            RequestError::Transport(_) => GenerationError::NetworkUnreachable,
            RequestError::Status { status, .. } => match *status {
                StatusCode::SERVICE_UNAVAILABLE => GenerationError::ModelLoading,
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
                StatusCode::UNAUTHORIZED => GenerationError::InvalidCredential,
                _ => GenerationError::Unknown(error.to_string()),
            },
            // An exhausted per-attempt timeout is not the batch deadline.
            RequestError::AttemptTimeout(_) | RequestError::EmptyBody(_) => {
                GenerationError::Unknown(error.to_string())
            }
        }
    }
}
