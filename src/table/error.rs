/// Errors that can occur reading or writing a persisted tidy table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Header does not start with the core tidy columns
    #[error("Tidy table header must start with {expected:?}, found {found:?}")]
    BadHeader {
        /// Core columns that were expected
        expected: Vec<String>,
        /// Header that was found
        found: Vec<String>,
    },

    /// A core column holds a value of the wrong type
    #[error("Invalid value '{value}' in column '{column}' on line {line}")]
    InvalidValue {
        /// Column name
        column: String,
        /// Offending cell
        value: String,
        /// 1-based line number
        line: u64,
    },
}
