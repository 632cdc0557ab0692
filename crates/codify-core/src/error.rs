use reqwest::StatusCode;
use thiserror::Error;

/// Shown to the user for any remote failure; the cause goes to the log.
pub const REMOTE_FAILURE_NOTICE: &str = "Something went wrong!";

pub const EMPTY_INPUT_NOTICE: &str = "Input cannot be empty";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("input cannot be empty")]
    InvalidInput,

    #[error("remote call failed: {0}")]
    RemoteCall(#[from] RemoteCallError),
}

impl ExchangeError {
    /// User-facing text. Remote failures all collapse to one generic notice.
    pub fn notice(&self) -> &'static str {
        match self {
            ExchangeError::InvalidInput => EMPTY_INPUT_NOTICE,
            ExchangeError::RemoteCall(_) => REMOTE_FAILURE_NOTICE,
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(StatusCode),

    #[error("response body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("response body has no product.response field")]
    MissingResponse,

    #[error("request task did not complete: {0}")]
    Interrupted(String),
}
