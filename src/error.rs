//! Error types for event rendering and harvest configuration.

use thiserror::Error;

/// Result type alias using the crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while collecting a harvest payload or loading limits.
#[derive(Debug, Error)]
pub enum Error {
    /// An event failed to serialize itself.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    /// An event rejected rendering for a reason of its own.
    #[error("failed to render event: {0}")]
    Render(String),

    /// Harvest limits that cannot produce a usable reservoir.
    #[error("invalid harvest limits: {0}")]
    InvalidLimits(String),

    /// Harvest limits document was not valid JSON for the expected shape.
    #[error("failed to parse harvest limits: {0}")]
    ConfigParse(#[source] serde_json::Error),
}
