use std::io::Read;

use super::{ParseError, PlateReaderStreamer};
use crate::table::TidyRow;

/// Iterator over the tidy rows of an export.
///
/// Iteration stops after the first error.
pub struct RowIterator<R: Read> {
    pub(super) streamer: PlateReaderStreamer<R>,
    pub(super) failed: bool,
}

impl<R: Read> RowIterator<R> {
    /// The underlying streamer, for diagnostics and stats
    pub fn streamer(&self) -> &PlateReaderStreamer<R> {
        &self.streamer
    }

    /// Consume the iterator, returning the streamer
    pub fn into_streamer(self) -> PlateReaderStreamer<R> {
        self.streamer
    }
}

impl<R: Read> Iterator for RowIterator<R> {
    type Item = Result<TidyRow, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.streamer.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
