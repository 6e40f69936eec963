//! Error types for topic deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading manifests or planning renames.
///
/// Extraction, inline conversion, assembly and rendering never fail; these
/// variants only cover the I/O-facing edges of the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The manifest is not valid JSON or does not match the expected shape.
    #[error("Manifest decoding error: {0}")]
    ManifestDecode(#[from] serde_json::Error),

    /// The manifest decoded but its contents are inconsistent.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A renumbering plan maps two units onto the same number.
    #[error("Invalid renumber plan: {0}")]
    InvalidRenumberPlan(String),
}
