//! archive-import library interface
//!
//! Batch import of WAV files from a tree of collection directories into
//! the archive database, with manifest-driven item renaming.

pub mod error;
pub mod importer;
pub mod logger;
pub mod logging;
pub mod manifest;
pub mod storage;

pub use crate::error::{ImportError, ImportResult};
pub use crate::importer::{ImportOptions, ImportReport, Importer, WriteOutcome};
pub use crate::logger::ImportLogger;
pub use crate::storage::MediaStorage;
