/// Errors that can occur during metadata processing
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// I/O error reading metadata file
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// File has no header row
    #[error("Supplementary metadata file has no header row")]
    MissingHeader,

    /// Invalid supplementary file format
    #[error("Invalid supplementary metadata format: {0}")]
    InvalidFormat(String),
}
