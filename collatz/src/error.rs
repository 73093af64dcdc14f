//! Errors surfaced by the engine entry points.

use thiserror::Error;

use crate::core::types::Variant;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The batch or evaluation request was rejected before any work ran.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Checked evaluation met a value that does not fit in 64 bits.
    #[error("{variant} overflowed 64-bit arithmetic starting from n = {n}")]
    Overflow { variant: Variant, n: u64 },
}

impl EngineError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }
}
