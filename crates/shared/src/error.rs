use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDomainError {
    #[error("unknown model variant '{0}' (expected 'abstract' or 'concrete')")]
    UnknownVariant(String),
    #[error("unknown verification concept '{0}'")]
    UnknownConcept(String),
}

/// Logical failure reported by the backend as `{"success": false, "error": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendFailure {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            concept: None,
        }
    }

    pub fn message(&self) -> &str {
        self.error.as_deref().unwrap_or("알 수 없는 오류")
    }
}
