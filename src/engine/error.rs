use thiserror::Error;

/// Errors that can come out of the similarity engine.
///
/// Only parameter validation can fail; extraction and the distance/similarity
/// functions are total. An empty catalog is a valid empty result, not an
/// error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A run was superseded or cancelled before completion. Never delivered
    /// as a result; only logged at debug level inside the task.
    #[error("Computation aborted")]
    Aborted,
}
