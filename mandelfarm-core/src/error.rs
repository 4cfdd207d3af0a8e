use thiserror::Error;

/// Errors originating from the core view and kernel types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid scale: {0} (must be positive and finite)")]
    InvalidScale(f64),

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
}
