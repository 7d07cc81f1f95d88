//! Error types for hls-ssa
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::ssa::infrastructure::SSAError;

/// Main error type for hls-ssa operations
#[derive(Debug, Error)]
pub enum HlsError {
    /// Lowering error
    #[error("Lowering error: {0}")]
    Ssa(#[from] SSAError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HlsError {
    /// The lowering error, if this is one
    pub fn as_ssa(&self) -> Option<&SSAError> {
        match self {
            HlsError::Ssa(e) => Some(e),
            HlsError::Config(_) => None,
        }
    }
}

/// Result type alias for hls-ssa operations
pub type Result<T> = std::result::Result<T, HlsError>;
