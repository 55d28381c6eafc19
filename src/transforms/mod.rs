//! # Series Transforms
//!
//! Table-to-table transforms over a materialized tidy table. Every transform
//! takes the table by reference and returns a new one; none mutates its input.
//!
//! Rows are grouped into series by `(Channel, Gain, Well)` plus any extra
//! grouping columns the caller names, which keeps plates with overlapping
//! well ids apart. Grouped output is ordered by series key.
//!
//! | Transform | Output |
//! |-----------|--------|
//! | [`extract_trajectories`] | one row per (well, time), one column per channel |
//! | [`background_subtract`] | measurements minus the mean of control wells |
//! | [`window_average`] | one row per series, averaged over a time window |
//! | [`endpoint_average`] | one row per series, averaged over its last points |
//! | [`spline_fit`] | adds a `spline fit` column |
//! | [`smoothed_derivative`] | adds `spline fit` and `<column> (<units>/sec)` |
//! | [`normalize`] | measurements divided by a reference channel |

mod background;
mod derivative;
mod error;
mod grouping;
mod normalize;
mod spline;
mod trajectories;
mod window;

#[cfg(test)]
mod tests;

pub use background::background_subtract;
pub use derivative::{derivative_column_name, gradient, smoothed_derivative};
pub use error::TransformError;
pub use grouping::GroupKey;
pub use normalize::normalize;
pub use spline::{smoothing_spline, spline_fit};
pub use trajectories::extract_trajectories;
pub use window::{endpoint_average, window_average, TimeUnit};

/// Default number of trailing points for [`endpoint_average`]
pub const DEFAULT_ENDPOINT_WINDOW: usize = 10;

/// Default normalization channel for [`normalize`]
pub const DEFAULT_NORM_CHANNEL: &str = "OD600";
