//! envmon-stats: Descriptive statistics for hourly pollutant series.
//!
//! Works on in-memory [`StationSeries`] tables; loading them from files
//! or remote APIs is left to callers.

pub mod numeric;
pub mod series;

pub use numeric::{count_value, max_index, mean_value, median_value, min_index, sum_values};
pub use series::{
    HOURS_PER_DAY, HourlyRecord, MISSING_SENTINEL, Reading, SeriesError, StationSeries,
};
