use thiserror::Error;

/// Error taxonomy for the feed engine.
///
/// `Validation` and `NotFound` surface to callers. `Upstream` is recovered
/// locally with a fallback value wherever one exists and only surfaces when
/// no fallback remains. `Internal` indicates a bug or corrupted state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("upstream unavailable: {collaborator}: {message}")]
    Upstream {
        collaborator: String,
        message: String,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn upstream(collaborator: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            collaborator: collaborator.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error is safe to expose to the caller verbatim.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {value}"))
    }
}
