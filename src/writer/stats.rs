use std::fmt;

use serde::Serialize;

/// Statistics from a completed write operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Number of tidy rows written
    pub rows_written: usize,
    /// Record batches flushed (Parquet only)
    pub batches_written: usize,
    /// Parquet row groups written
    pub row_groups_written: usize,
    /// Uncompressed size of all row groups in bytes (Parquet only)
    pub file_size_bytes: u64,
}

impl fmt::Display for WriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row_groups_written > 0 {
            write!(
                f,
                "Wrote {} rows in {} row groups",
                self.rows_written, self.row_groups_written
            )
        } else {
            write!(f, "Wrote {} rows", self.rows_written)
        }
    }
}
