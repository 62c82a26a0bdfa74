//! Error types for archive-import
//!
//! Only infrastructure failures and the one fatal data condition (a
//! manifest for a collection that does not exist) surface as errors.
//! Everything else is written to the import log and skipped.

use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ManifestError;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Source directory missing or not a directory
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// Acting user account does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A collection ships a manifest but is absent from the database
    #[error("Collection {collection} not in the database but has a manifest, aborting")]
    ManifestWithoutCollection { collection: String },

    /// Manifest could not be opened
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Media storage or directory listing failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal failure
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// archive-common error
    #[error("Common error: {0}")]
    Common(#[from] archive_common::Error),
}

impl ImportError {
    /// True for the error that stops the run by policy rather than by failure
    pub fn is_fatal_data_error(&self) -> bool {
        matches!(self, ImportError::ManifestWithoutCollection { .. })
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
