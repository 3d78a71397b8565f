use thiserror::Error;

#[derive(Debug, Error)]
pub enum DealEngineError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DealEngineError {
    fn from(e: serde_json::Error) -> Self {
        DealEngineError::SerializationError(e.to_string())
    }
}
