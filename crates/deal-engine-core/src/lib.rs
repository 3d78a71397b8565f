pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "syndication")]
pub mod syndication;

pub use error::DealEngineError;
pub use types::*;

/// Standard result type for all deal-engine operations
pub type DealEngineResult<T> = Result<T, DealEngineError>;
