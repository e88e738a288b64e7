use std::path::PathBuf;
use thiserror::Error;

/// The main error type for darex operations.
#[derive(Debug, Error)]
pub enum DarexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse annotation manifest from {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotation manifest to {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write Darwin JSON to {path}: {source}")]
    DarwinJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("complex_polygon annotation '{class_name}' is missing a non-empty 'paths' list")]
    MissingPaths { class_name: String },
}
