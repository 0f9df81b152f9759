//! Error types for devimpact

use thiserror::Error;

/// Errors that can occur at the engine boundary.
///
/// Scoring itself never fails; these cover parsing input, loading
/// configuration, persisting smoothing state and computing verification codes.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse activity stats: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid verification secret: {0}")]
    InvalidSecret(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Snapshot store error: {0}")]
    SnapshotError(String),
}
