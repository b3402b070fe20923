//! PriceSeries: the normalized daily OHLCV table handed back to callers.

use super::instrument::Instrument;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Key column of every normalized table.
pub const DATE_COLUMN: &str = "date";

/// The five value columns, in output order.
pub const REQUIRED_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// One trading day, read back out of a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily OHLCV history for one instrument.
///
/// Only built by the normalizer, so the frame always has a `date` column
/// (Date, strictly increasing) followed by the five lowercase value columns,
/// and at least one row.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    instrument: &'static Instrument,
    frame: DataFrame,
}

impl PriceSeries {
    pub(crate) fn new(instrument: &'static Instrument, frame: DataFrame) -> Self {
        Self { instrument, frame }
    }

    /// The instrument the data actually belongs to (after any substitution).
    pub fn instrument(&self) -> &'static Instrument {
        self.instrument
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Value column names, excluding the date key.
    pub fn field_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != DATE_COLUMN)
            .map(|name| name.as_str().to_string())
            .collect()
    }

    /// Borrow the underlying table.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Trading dates in ascending order. Errors on a null date, like [`bars`](Self::bars).
    pub fn dates(&self) -> PolarsResult<Vec<NaiveDate>> {
        let ca = self.frame.column(DATE_COLUMN)?.date()?;
        (0..ca.len())
            .map(|i| ca.get(i).map(days_to_date).ok_or_else(|| null_date(i)))
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates().ok().and_then(|d| d.first().copied())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates().ok().and_then(|d| d.last().copied())
    }

    /// Materialize the table as row structs.
    ///
    /// Null prices come back as NaN and null volume as 0.
    pub fn bars(&self) -> PolarsResult<Vec<DailyBar>> {
        let dates = self.frame.column(DATE_COLUMN)?.date()?;
        let open = self.frame.column("open")?.f64()?;
        let high = self.frame.column("high")?.f64()?;
        let low = self.frame.column("low")?.f64()?;
        let close = self.frame.column("close")?.f64()?;
        let volume = self.frame.column("volume")?.u64()?;

        let n = self.frame.height();
        let mut bars = Vec::with_capacity(n);
        for i in 0..n {
            let days = dates.get(i).ok_or_else(|| null_date(i))?;
            bars.push(DailyBar {
                date: days_to_date(days),
                open: open.get(i).unwrap_or(f64::NAN),
                high: high.get(i).unwrap_or(f64::NAN),
                low: low.get(i).unwrap_or(f64::NAN),
                close: close.get(i).unwrap_or(f64::NAN),
                volume: volume.get(i).unwrap_or(0),
            });
        }
        Ok(bars)
    }
}

fn null_date(row: usize) -> PolarsError {
    PolarsError::ComputeError(format!("null date at row {row}").into())
}

/// Days since 1970-01-01, the physical representation of a polars Date.
pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

pub(crate) fn days_to_date(days: i32) -> NaiveDate {
    NaiveDate::default() + chrono::Duration::days(days as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_series() -> PriceSeries {
        let dates: Vec<i32> = [d(2024, 1, 1), d(2024, 1, 2)]
            .into_iter()
            .map(date_to_days)
            .collect();
        let frame = DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), dates)
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("open".into(), vec![Some(30.0), None]),
            Column::new("high".into(), vec![31.5, 32.0]),
            Column::new("low".into(), vec![29.8, 30.1]),
            Column::new("close".into(), vec![31.0, 31.7]),
            Column::new("volume".into(), vec![1_200_000u64, 950_000]),
        ])
        .unwrap();
        PriceSeries::new(Instrument::default_instrument(), frame)
    }

    #[test]
    fn epoch_day_conversion_is_inverse() {
        for date in [d(1970, 1, 1), d(2005, 1, 3), d(2099, 12, 31), d(1969, 12, 31)] {
            assert_eq!(days_to_date(date_to_days(date)), date);
        }
        assert_eq!(date_to_days(d(1970, 1, 2)), 1);
    }

    #[test]
    fn field_names_exclude_date_key() {
        let series = sample_series();
        assert_eq!(series.field_names(), REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn bars_read_back_rows_in_order() {
        let series = sample_series();
        let bars = series.bars().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 1));
        assert!(bars[0].open == 30.0);
        assert!(bars[1].open.is_nan(), "null price reads back as NaN");
        assert_eq!(bars[1].volume, 950_000);
    }

    #[test]
    fn first_and_last_dates() {
        let series = sample_series();
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.first_date(), Some(d(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(d(2024, 1, 2)));
    }

    #[test]
    fn null_date_is_an_error_for_dates_and_bars() {
        let frame = DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), vec![Some(date_to_days(d(2024, 1, 1))), None])
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("open".into(), vec![30.0, 30.5]),
            Column::new("high".into(), vec![31.5, 32.0]),
            Column::new("low".into(), vec![29.8, 30.1]),
            Column::new("close".into(), vec![31.0, 31.7]),
            Column::new("volume".into(), vec![1_200_000u64, 950_000]),
        ])
        .unwrap();
        let series = PriceSeries::new(Instrument::default_instrument(), frame);

        assert!(series.dates().is_err());
        assert!(series.bars().is_err());
        assert_eq!(series.first_date(), None);
        assert_eq!(series.last_date(), None);
    }
}
