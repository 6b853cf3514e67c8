use reqwest::StatusCode;
use thiserror::Error;
use view::verification::NETWORK_ERROR_MESSAGE;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded with status {0}")]
    Status(StatusCode),
    /// Failure the backend reported itself (`success: false` or an `error` body).
    #[error("{0}")]
    Backend(String),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("event stream failed: {0}")]
    Stream(String),
}

impl ClientError {
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, ClientError::Backend(_))
    }

    /// Text shown inline in the affected panel.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Backend(message) => message.clone(),
            _ => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}
