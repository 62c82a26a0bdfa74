//! Errors shared by the archive crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `archive.toml` could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// An update matched no row, e.g. renaming an item guid that was never stored
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A stored column could not be decoded (guid, change type, timestamp)
    #[error("Invalid stored value: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_record() {
        let err = Error::NotFound("item 42".to_string());
        assert_eq!(err.to_string(), "Record not found: item 42");

        let err = Error::InvalidInput("change type delete".to_string());
        assert_eq!(err.to_string(), "Invalid stored value: change type delete");
    }
}
