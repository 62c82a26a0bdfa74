//! Import journal
//!
//! Every import event is one line `<prefix> : <message>`, emitted as a
//! `tracing` event on [`JOURNAL_TARGET`]. The file sink is configured in
//! [`crate::logging`].

/// Tracing target of journal lines
pub const JOURNAL_TARGET: &str = "archive_import::journal";

/// Text of one journal line, without timestamp and level
pub fn journal_line(prefix: &str, message: &str) -> String {
    format!("{} : {}", prefix, message)
}

/// Informational and error lines of an import run
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportLogger;

impl ImportLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, prefix: &str, message: &str) {
        tracing::info!(target: JOURNAL_TARGET, "{}", journal_line(prefix, message));
    }

    pub fn error(&self, prefix: &str, message: &str) {
        tracing::error!(target: JOURNAL_TARGET, "{}", journal_line(prefix, message));
    }
}
