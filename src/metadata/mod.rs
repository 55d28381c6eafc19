//! # Supplementary Metadata
//!
//! Loads the optional well-to-metadata CSV that is joined onto every tidy row
//! (strain, inducer concentration, replicate, ...).

mod error;
mod supplementary;


pub use error::MetadataError;
pub use supplementary::SupplementaryMetadata;
