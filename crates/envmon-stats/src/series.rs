//! Hourly pollutant series for a single monitoring station.
//!
//! A [`StationSeries`] is a table of hourly rows. Each row carries a date
//! (`YYYY-MM-DD`), a time (`HH:MM:SS`, hours `01`..=`24`) and one
//! [`Reading`] per pollutant column. Statistics never mutate the series.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::numeric::{mean_value, median_value};

/// Text used in source data for an hour without a measurement.
pub const MISSING_SENTINEL: &str = "No data";

/// Rows per day in a complete series.
pub const HOURS_PER_DAY: usize = 24;

/// Errors raised by series construction and statistics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    /// The requested pollutant is not a column of the series.
    #[error("unknown pollutant: {0}")]
    UnknownPollutant(String),

    /// An operation that needs at least one value got none.
    #[error("no values to operate on")]
    EmptyValues,

    /// A row has a different number of readings than there are columns.
    #[error("row {row} has {found} readings, expected {expected}")]
    RowWidth {
        /// Zero-based row index.
        row: usize,
        /// Number of pollutant columns.
        expected: usize,
        /// Readings found in the row.
        found: usize,
    },

    /// A cell is neither a number nor the missing-data sentinel.
    #[error("invalid reading: {0:?}")]
    InvalidReading(String),
}

/// One hourly measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// A measured concentration.
    Value(f64),
    /// No measurement for this hour.
    Missing,
}

impl Reading {
    /// The measured value, if present.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }

    /// Whether this hour has no measurement.
    #[must_use]
    pub const fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl FromStr for Reading {
    type Err = SeriesError;

    /// Parse a source cell: [`MISSING_SENTINEL`] or a finite decimal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == MISSING_SENTINEL {
            return Ok(Self::Missing);
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self::Value(v)),
            _ => Err(SeriesError::InvalidReading(s.to_owned())),
        }
    }
}

/// One row of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS`.
    pub time: String,
    /// One reading per pollutant column.
    pub values: Vec<Reading>,
}

impl HourlyRecord {
    /// Create a row.
    #[must_use]
    pub fn new(date: impl Into<String>, time: impl Into<String>, values: Vec<Reading>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            values,
        }
    }

    /// Two-digit month (`MM`), if the date is long enough.
    fn month(&self) -> Option<&str> {
        self.date.get(5..7)
    }

    /// Two-digit hour (`HH`), if the time is long enough.
    fn hour(&self) -> Option<&str> {
        self.time.get(..2)
    }
}

/// Hourly readings for one monitoring station.
///
/// Deserialization goes through [`StationSeries::new`], so ragged rows are
/// rejected there too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStationSeries")]
pub struct StationSeries {
    columns: Vec<String>,
    rows: Vec<HourlyRecord>,
}

/// Unchecked wire form of [`StationSeries`].
#[derive(Deserialize)]
struct RawStationSeries {
    columns: Vec<String>,
    rows: Vec<HourlyRecord>,
}

impl TryFrom<RawStationSeries> for StationSeries {
    type Error = SeriesError;

    fn try_from(raw: RawStationSeries) -> Result<Self, Self::Error> {
        Self::new(raw.columns, raw.rows)
    }
}

impl StationSeries {
    /// Build a series from pollutant column names and rows.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::RowWidth`] if any row does not have exactly
    /// one reading per column.
    pub fn new(columns: Vec<String>, rows: Vec<HourlyRecord>) -> Result<Self, SeriesError> {
        for (row, record) in rows.iter().enumerate() {
            if record.values.len() != columns.len() {
                return Err(SeriesError::RowWidth {
                    row,
                    expected: columns.len(),
                    found: record.values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Pollutant column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[HourlyRecord] {
        &self.rows
    }

    fn column(&self, pollutant: &str) -> Result<usize, SeriesError> {
        self.columns
            .iter()
            .position(|c| c == pollutant)
            .ok_or_else(|| SeriesError::UnknownPollutant(pollutant.to_owned()))
    }

    /// Every reading of `pollutant`, in row order.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn readings(&self, pollutant: &str) -> Result<Vec<Reading>, SeriesError> {
        let col = self.column(pollutant)?;
        Ok(self.rows.iter().map(|r| r.values[col]).collect())
    }

    /// Present values of `pollutant` in rows accepted by `keep`.
    fn present_where(
        &self,
        col: usize,
        keep: impl Fn(&HourlyRecord) -> bool,
    ) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| keep(r))
            .filter_map(|r| r.values[col].value())
            .collect()
    }

    /// Present values per consecutive 24-row day block. A trailing
    /// partial block is ignored.
    fn daily_blocks(&self, col: usize) -> impl Iterator<Item = Vec<f64>> + '_ {
        self.rows.chunks_exact(HOURS_PER_DAY).map(move |day| {
            day.iter()
                .filter_map(|r| r.values[col].value())
                .collect::<Vec<_>>()
        })
    }

    /// Mean of each day's present readings. Days with no readings are
    /// skipped, so the result may be shorter than the number of days.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn daily_average(&self, pollutant: &str) -> Result<Vec<f64>, SeriesError> {
        let col = self.column(pollutant)?;
        Ok(self
            .daily_blocks(col)
            .filter_map(|day| mean_value(&day).ok())
            .collect())
    }

    /// Median of each day's present readings. Days with no readings are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn daily_median(&self, pollutant: &str) -> Result<Vec<f64>, SeriesError> {
        let col = self.column(pollutant)?;
        Ok(self
            .daily_blocks(col)
            .filter_map(|day| median_value(&day).ok())
            .collect())
    }

    /// Mean reading for each hour `01`..=`24` across the whole series.
    ///
    /// Always 24 entries; an hour with no readings is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn hourly_average(&self, pollutant: &str) -> Result<Vec<Option<f64>>, SeriesError> {
        let col = self.column(pollutant)?;
        Ok((1..=HOURS_PER_DAY)
            .map(|hour| {
                let tag = format!("{hour:02}");
                mean_value(&self.present_where(col, |r| r.hour() == Some(tag.as_str()))).ok()
            })
            .collect())
    }

    /// Mean reading for each month that has data, in calendar order.
    ///
    /// Months without readings are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn monthly_average(&self, pollutant: &str) -> Result<Vec<f64>, SeriesError> {
        let col = self.column(pollutant)?;
        Ok((1..=12)
            .filter_map(|month| {
                let tag = format!("{month:02}");
                mean_value(&self.present_where(col, |r| r.month() == Some(tag.as_str()))).ok()
            })
            .collect())
    }

    /// The `HH:MM` of the highest reading on `date`, with that reading.
    ///
    /// The earliest hour wins on ties. `None` if the date has no present
    /// readings.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn peak_hour_date(
        &self,
        date: &str,
        pollutant: &str,
    ) -> Result<Option<(String, f64)>, SeriesError> {
        let col = self.column(pollutant)?;
        let mut peak: Option<(&HourlyRecord, f64)> = None;
        for record in self.rows.iter().filter(|r| r.date == date) {
            if let Some(v) = record.values[col].value()
                && peak.is_none_or(|(_, best)| v > best)
            {
                peak = Some((record, v));
            }
        }
        Ok(peak.map(|(record, v)| {
            let hh_mm = record.time.get(..5).unwrap_or(&record.time);
            (hh_mm.to_owned(), v)
        }))
    }

    /// Number of hours with no reading for `pollutant`.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn count_missing_data(&self, pollutant: &str) -> Result<usize, SeriesError> {
        let col = self.column(pollutant)?;
        Ok(self.rows.iter().filter(|r| r.values[col].is_missing()).count())
    }

    /// A copy of the series with every missing `pollutant` reading
    /// replaced by `new_value`. Other columns are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnknownPollutant`] if there is no such column.
    pub fn fill_missing_data(&self, new_value: f64, pollutant: &str) -> Result<Self, SeriesError> {
        let col = self.column(pollutant)?;
        let mut filled = self.clone();
        let mut replaced = 0_usize;
        for record in &mut filled.rows {
            if record.values[col].is_missing() {
                record.values[col] = Reading::Value(new_value);
                replaced += 1;
            }
        }
        log::debug!("filled {replaced} missing {pollutant} readings with {new_value}");
        Ok(filled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Two days of `no` readings equal to the hour number, plus `pm10`
    /// which is missing on every even hour.
    fn two_days() -> StationSeries {
        let mut rows = Vec::new();
        for (day, date) in ["2021-01-31", "2021-02-01"].iter().enumerate() {
            for hour in 1..=24_u32 {
                let no = Reading::Value(f64::from(hour) + f64::from(u32::try_from(day).unwrap()));
                let pm10 = if hour % 2 == 0 {
                    Reading::Missing
                } else {
                    Reading::Value(10.0)
                };
                rows.push(HourlyRecord::new(*date, format!("{hour:02}:00:00"), vec![no, pm10]));
            }
        }
        StationSeries::new(vec!["no".into(), "pm10".into()], rows).unwrap()
    }

    #[test]
    fn reading_parses_sentinel_and_numbers() {
        assert_eq!("No data".parse::<Reading>().unwrap(), Reading::Missing);
        assert_eq!(" 12.5 ".parse::<Reading>().unwrap(), Reading::Value(12.5));
        assert!(matches!(
            "n/a".parse::<Reading>(),
            Err(SeriesError::InvalidReading(_))
        ));
    }

    #[test]
    fn non_finite_readings_are_rejected() {
        for cell in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(
                cell.parse::<Reading>(),
                Err(SeriesError::InvalidReading(cell.to_owned())),
            );
        }
    }

    #[test]
    fn ragged_row_is_rejected() {
        let rows = vec![HourlyRecord::new("2021-01-01", "01:00:00", vec![Reading::Missing])];
        let err = StationSeries::new(vec!["no".into(), "pm10".into()], rows).unwrap_err();
        assert_eq!(
            err,
            SeriesError::RowWidth {
                row: 0,
                expected: 2,
                found: 1,
            },
        );
    }

    #[test]
    fn unknown_pollutant() {
        let series = two_days();
        assert_eq!(
            series.daily_average("pm25"),
            Err(SeriesError::UnknownPollutant("pm25".into())),
        );
        assert!(series.readings("pm25").is_err());
    }

    #[test]
    fn daily_average_per_block() {
        let averages = two_days().daily_average("no").unwrap();
        assert_eq!(averages.len(), 2);
        assert!(close(averages[0], 12.5));
        assert!(close(averages[1], 13.5));
    }

    #[test]
    fn daily_average_ignores_missing() {
        let averages = two_days().daily_average("pm10").unwrap();
        assert_eq!(averages.len(), 2);
        assert!(averages.iter().all(|&a| close(a, 10.0)));
    }

    #[test]
    fn day_without_readings_is_skipped() {
        let rows = (1..=24)
            .map(|h| HourlyRecord::new("2021-03-01", format!("{h:02}:00:00"), vec![Reading::Missing]))
            .collect();
        let series = StationSeries::new(vec!["no".into()], rows).unwrap();
        assert!(series.daily_average("no").unwrap().is_empty());
        assert!(series.daily_median("no").unwrap().is_empty());
    }

    #[test]
    fn partial_trailing_day_is_ignored() {
        let series = two_days();
        let mut rows = series.rows().to_vec();
        rows.truncate(30);
        let series = StationSeries::new(series.columns().to_vec(), rows).unwrap();
        assert_eq!(series.daily_average("no").unwrap().len(), 1);
    }

    #[test]
    fn daily_median_even_count() {
        let medians = two_days().daily_median("no").unwrap();
        assert!(close(medians[0], 12.5));
        assert!(close(medians[1], 13.5));
    }

    #[test]
    fn hourly_average_has_24_entries() {
        let hourly = two_days().hourly_average("no").unwrap();
        assert_eq!(hourly.len(), 24);
        assert!(close(hourly[0].unwrap(), 1.5));
        assert!(close(hourly[23].unwrap(), 24.5));
        let pm10 = two_days().hourly_average("pm10").unwrap();
        assert_eq!(pm10[1], None);
        assert!(close(pm10[2].unwrap(), 10.0));
    }

    #[test]
    fn monthly_average_skips_empty_months() {
        let monthly = two_days().monthly_average("no").unwrap();
        assert_eq!(monthly.len(), 2);
        assert!(close(monthly[0], 12.5));
        assert!(close(monthly[1], 13.5));
    }

    #[test]
    fn peak_hour_on_date() {
        let series = two_days();
        assert_eq!(
            series.peak_hour_date("2021-02-01", "no").unwrap(),
            Some(("24:00".to_owned(), 25.0)),
        );
        assert_eq!(series.peak_hour_date("2021-05-05", "no").unwrap(), None);
    }

    #[test]
    fn peak_hour_tie_keeps_earliest() {
        assert_eq!(
            two_days().peak_hour_date("2021-01-31", "pm10").unwrap(),
            Some(("01:00".to_owned(), 10.0)),
        );
    }

    #[test]
    fn missing_count_and_fill() {
        let series = two_days();
        assert_eq!(series.count_missing_data("pm10").unwrap(), 24);
        assert_eq!(series.count_missing_data("no").unwrap(), 0);

        let filled = series.fill_missing_data(0.0, "pm10").unwrap();
        assert_eq!(filled.count_missing_data("pm10").unwrap(), 0);
        assert_eq!(filled.readings("no").unwrap(), series.readings("no").unwrap());
        // The source series is untouched.
        assert_eq!(series.count_missing_data("pm10").unwrap(), 24);
    }

    #[test]
    fn ragged_json_fails_to_deserialize() {
        let json = r#"{"columns":["no","pm10"],"rows":[
            {"date":"2021-01-01","time":"01:00:00","values":[{"Value":1.0}]}
        ]}"#;
        let err = serde_json::from_str::<StationSeries>(json).unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 readings, expected 2"));
    }

    #[test]
    fn series_round_trips_through_json() {
        let series = two_days();
        let json = serde_json::to_string(&series).unwrap();
        let back: StationSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }
}
