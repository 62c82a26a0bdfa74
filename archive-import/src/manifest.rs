//! Collection manifest reader
//!
//! A collection directory may ship `<collection>.csv`, a header-less,
//! `;`-delimited list of `old_ref;new_ref` rows mapping legacy item codes
//! to their current codes.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Field delimiter of manifest rows
pub const MANIFEST_DELIMITER: u8 = b';';

/// Manifest errors that prevent reading the file at all
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot open manifest {0}: {1}")]
    Open(PathBuf, std::io::Error),
}

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestRow {
    /// Rename mapping from a legacy code to the current code
    Rename { old_ref: String, new_ref: String },
    /// Line that could not be interpreted; logged and skipped by the importer
    Malformed { line: u64, reason: String },
}

/// Location of the manifest for a collection directory
pub fn manifest_path(collection_dir: &Path, collection: &str) -> PathBuf {
    collection_dir.join(format!("{}.csv", collection))
}

/// Read every row of a manifest
///
/// Blank lines are dropped. Short or undecodable rows are returned as
/// [`ManifestRow::Malformed`] so one bad line does not stop the others.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>, ManifestError> {
    let file = File::open(path).map_err(|e| ManifestError::Open(path.to_path_buf(), e))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(MANIFEST_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(file);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let line = reader.position().line();
        match reader.read_record(&mut record) {
            Ok(true) => {
                if let Some(row) = row_from_record(&record, line) {
                    rows.push(row);
                }
            }
            Ok(false) => break,
            Err(e) => {
                rows.push(ManifestRow::Malformed {
                    line: e.position().map(|p| p.line()).unwrap_or(line),
                    reason: e.to_string(),
                });
                // An I/O failure would repeat forever
                if e.is_io_error() {
                    break;
                }
            }
        }
    }

    Ok(rows)
}

fn row_from_record(record: &StringRecord, line: u64) -> Option<ManifestRow> {
    if record.iter().all(|field| field.is_empty()) {
        return None;
    }

    match (record.get(0), record.get(1)) {
        (Some(old_ref), Some(new_ref)) => Some(ManifestRow::Rename {
            old_ref: old_ref.to_string(),
            new_ref: new_ref.to_string(),
        }),
        _ => Some(ManifestRow::Malformed {
            line,
            reason: format!("expected 2 fields, found {}", record.len()),
        }),
    }
}
