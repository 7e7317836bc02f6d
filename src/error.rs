//! Error types for the signing workflow

use std::path::PathBuf;
use thiserror::Error;

/// Signature gateway client error
#[derive(Debug, Error)]
pub enum SigaError {
    /// Caller supplied an argument the workflow cannot accept
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation needs a container but none was created or uploaded
    #[error("Container ID is missing: create or upload a container first")]
    MissingContainerIdentity,

    /// Validation report contains at least one invalid signature
    #[error("Signature validation failed: {valid} of {total} signatures are valid")]
    SignatureValidationError { valid: u32, total: u32 },

    /// Gateway asked for a digest this client cannot compute
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(String),

    /// Gateway answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found on the gateway
    #[error("Not found: {0}")]
    NotFound(String),

    /// Gateway returned a non-success status
    #[error("Gateway error {status}: {message}")]
    Gateway { status: u16, message: String },

    /// Archive was written but the remote container could not be deleted.
    ///
    /// `source` is the gateway's delete error, unchanged.
    #[error("Archive written to {} but remote cleanup failed: {source}", .archive.display())]
    CleanupFailed {
        archive: PathBuf,
        #[source]
        source: Box<SigaError>,
    },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decode error
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decode error
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Local file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be read or written
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type for gateway and workflow operations
pub type Result<T> = std::result::Result<T, SigaError>;
