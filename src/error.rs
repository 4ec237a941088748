//! Error types for nefsim

use thiserror::Error;

/// Nefsim error type
#[derive(Debug, Error)]
pub enum NefsimError {
    /// Malformed construction input (breakpoints, specs, durations)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shape mismatch between connected components
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Handle does not refer to anything in this network
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    /// Simulation failure reported by a backend
    #[error("Simulation error: {0}")]
    Simulation(String),

    /// Record format error
    #[error("Record format error: {0}")]
    RecordFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NefsimError>;
