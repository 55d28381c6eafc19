/// Errors that can occur while writing a tidy table
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV encoder
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from the Arrow library during array operations
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library during file writing
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Invalid data provided to the writer
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
