//! Local CSV history provider.
//!
//! Reads `{dir}/{SYMBOL}.csv`, e.g. `data/IRFC.NS.csv`, with a header row.
//! Any header casing is accepted and extra columns are passed through, so a
//! file exported from another tool can be dropped in unchanged. The date
//! column may carry a time suffix (`2020-01-02 00:00:00+05:30`); only the
//! leading `YYYY-MM-DD` is read.
//!
//! Blank cells become nulls. A non-blank open/high/low/close/volume cell
//! that is not a number fails the whole read with `ResponseFormat`.

use super::provider::{DataError, HistoryProvider};
use crate::domain::series::date_to_days;
use crate::domain::{DATE_COLUMN, REQUIRED_FIELDS};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// History provider backed by a directory of CSV files.
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory the provider reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the file for a symbol: `{dir}/{SYMBOL}.csv`
    pub fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl HistoryProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, DataError> {
        let path = self.symbol_path(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let table_err =
            |e: PolarsError| DataError::Table(format!("building {symbol} table: {e}"));

        let mut df = LazyCsvReader::new(&path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| DataError::ResponseFormat(format!("{}: {e}", path.display())))?;

        let names: Vec<PlSmallStr> = df.get_column_names().into_iter().cloned().collect();
        let date_name = names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(DATE_COLUMN))
            .cloned()
            .ok_or_else(|| {
                DataError::ResponseFormat(format!("no date column in {}", path.display()))
            })?;

        // Inference falls back to String when a value column holds anything
        // that is not a number.
        for name in &names {
            let is_value = REQUIRED_FIELDS
                .iter()
                .any(|field| name.trim().eq_ignore_ascii_case(field));
            let column = df.column(name.as_str()).map_err(table_err)?;
            if is_value && column.dtype() == &DataType::String {
                let parsed = parse_numbers(column, &path)?;
                df.with_column(parsed).map_err(table_err)?;
            }
        }

        let raw_dates = df
            .column(date_name.as_str())
            .and_then(|c| c.cast(&DataType::String))
            .map_err(table_err)?;
        let mut days = Vec::with_capacity(raw_dates.len());
        let mut in_range = Vec::with_capacity(raw_dates.len());
        for (row, value) in raw_dates.str().map_err(table_err)?.into_iter().enumerate() {
            let raw = value.unwrap_or("").trim();
            let date = parse_date(raw).ok_or_else(|| {
                DataError::ResponseFormat(format!(
                    "{}: bad date '{raw}' on data row {}",
                    path.display(),
                    row + 1
                ))
            })?;
            in_range.push(date >= start && date < end);
            days.push(date_to_days(date));
        }

        let dates = Column::new(date_name, days)
            .cast(&DataType::Date)
            .map_err(table_err)?;
        df.with_column(dates).map_err(table_err)?;

        let mask = BooleanChunked::from_slice("in_range".into(), &in_range);
        df.filter(&mask).map_err(table_err)
    }
}

/// Parse a text column as floats. Blank cells are null; anything else must parse.
fn parse_numbers(column: &Column, path: &Path) -> Result<Column, DataError> {
    let text = column
        .str()
        .map_err(|e| DataError::Table(format!("reading {}: {e}", column.name())))?;

    let mut values: Vec<Option<f64>> = Vec::with_capacity(text.len());
    for (row, cell) in text.into_iter().enumerate() {
        let cell = cell.map(str::trim).unwrap_or("");
        if cell.is_empty() {
            values.push(None);
            continue;
        }
        let value = cell.parse::<f64>().map_err(|_| {
            DataError::ResponseFormat(format!(
                "{}: '{cell}' in column {} on data row {} is not a number",
                path.display(),
                column.name(),
                row + 1
            ))
        })?;
        values.push(Some(value));
    }
    Ok(Column::new(column.name().clone(), values))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
