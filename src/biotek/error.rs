use csv::StringRecord;

use super::header::{line_content, line_number};

/// Errors that can occur while parsing a plate-reader export
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error splitting the export into CSV records
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Export does not match the expected section structure
    #[error("Malformed export at line {line} ({reason}): '{content}'")]
    Structural {
        /// 1-based line number
        line: u64,
        /// Raw line content
        content: String,
        /// What was expected
        reason: String,
    },

    /// A data block refers to a read that no header declared
    #[error("Data block at line {line} refers to read '{name}' [{index}] which has no filter set: '{content}'")]
    UnknownRead {
        /// Read name from the block header
        name: String,
        /// 1-based occurrence index
        index: usize,
        /// 1-based line number
        line: u64,
        /// Raw line content
        content: String,
    },

    /// Input ended in the middle of a section
    #[error("Export ended unexpectedly: {0}")]
    UnexpectedEof(String),
}

impl ParseError {
    pub(crate) fn structural(record: &StringRecord, reason: &str) -> Self {
        ParseError::Structural {
            line: line_number(record),
            content: line_content(record),
            reason: reason.to_string(),
        }
    }
}
