use crate::table::Gain;

/// Errors raised synchronously by the series transforms
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Window unit is not one of seconds, hours or index
    #[error("Unknown unit \"{0}\"; units must be \"seconds\", \"hours\", or \"index\"")]
    InvalidUnit(String),

    /// Normalization channel absent from the table
    #[error("No data for channel '{0}' in table")]
    MissingNormalizationChannel(String),

    /// Normalization channel present but never read at the requested gain
    #[error("Channel {channel} does not use gain {gain}")]
    MissingNormalizationGain {
        /// Normalization channel
        channel: String,
        /// Requested gain
        gain: Gain,
    },

    /// Channels of one well have different numbers of time points
    #[error("Well {well}: channel {channel} has {found} points, expected {expected}")]
    SeriesLengthMismatch {
        /// Well identifier
        well: String,
        /// Channel whose series differs from the first channel
        channel: String,
        /// Length of the first channel's series
        expected: usize,
        /// Length of this channel's series
        found: usize,
    },

    /// A series and its normalization series differ in length
    #[error("Cannot normalize {channel} (gain {gain}) in well {well}: {found} rows against {expected} normalization rows")]
    NormalizationLengthMismatch {
        /// Channel being normalized
        channel: String,
        /// Gain of the channel being normalized
        gain: Gain,
        /// Well identifier
        well: String,
        /// Normalization rows for the well
        expected: usize,
        /// Rows in the normalized group
        found: usize,
    },

    /// A well has a timestamp none of the control wells were read at
    #[error("No background measurement for {channel} (gain {gain}) at {time_sec} s")]
    MissingBackground {
        /// Channel
        channel: String,
        /// Gain
        gain: Gain,
        /// Timestamp lacking a control reading
        time_sec: f64,
    },

    /// Column not present in the table
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Column holds a non-numeric value where numbers are required
    #[error("Column '{column}' is not numeric in well {well}")]
    NonNumericColumn {
        /// Column name
        column: String,
        /// First well with a non-numeric value
        well: String,
    },

    /// Series time points are not strictly increasing
    #[error("Time points of {channel} in well {well} are not strictly increasing at {time_sec} s")]
    NonIncreasingTime {
        /// Channel
        channel: String,
        /// Well identifier
        well: String,
        /// Repeated or out-of-order timestamp
        time_sec: f64,
    },
}
