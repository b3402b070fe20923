//! Turn a provider's raw table into the fixed `date + OHLCV` shape.

use crate::domain::{Instrument, DATE_COLUMN, REQUIRED_FIELDS};
use crate::error::FetchError;
use polars::prelude::*;
use std::collections::HashMap;

/// Normalize a raw provider table.
///
/// Column names are lowercased (first occurrence wins on a case collision),
/// everything except `date` and the five OHLCV fields is dropped, values are
/// cast to `Date`/`Float64`/`UInt64`, and rows are ordered by date with
/// duplicate dates removed. Rows without a date are dropped.
///
/// Checks run in a fixed order: an empty table is `EmptyResult` before any
/// column is looked at, then every absent column is reported together as
/// `MissingField`. A table whose rows all lack a date is `EmptyResult` too.
pub fn normalize(raw: DataFrame, instrument: &Instrument) -> Result<DataFrame, FetchError> {
    if raw.height() == 0 {
        return Err(empty_result(instrument));
    }

    let mut by_name: HashMap<String, Column> = HashMap::new();
    for column in raw.get_columns() {
        let lower = column.name().as_str().to_lowercase();
        if !by_name.contains_key(&lower) {
            by_name.insert(lower.clone(), column.clone().with_name(lower.into()));
        }
    }

    let missing: Vec<String> = std::iter::once(DATE_COLUMN)
        .chain(REQUIRED_FIELDS)
        .filter(|name| !by_name.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(FetchError::MissingField {
            code: instrument.code.to_string(),
            fields: missing,
        });
    }

    let mut columns = Vec::with_capacity(REQUIRED_FIELDS.len() + 1);
    for name in std::iter::once(DATE_COLUMN).chain(REQUIRED_FIELDS) {
        let dtype = match name {
            DATE_COLUMN => DataType::Date,
            "volume" => DataType::UInt64,
            _ => DataType::Float64,
        };
        columns.push(by_name[name].cast(&dtype)?);
    }

    let df = order_by_date(DataFrame::new(columns)?)?;
    if df.height() == 0 {
        // every row had a null date
        return Err(empty_result(instrument));
    }
    Ok(df)
}

/// Drop undated rows, sort ascending by date and keep the first row of each date.
fn order_by_date(df: DataFrame) -> Result<DataFrame, FetchError> {
    let ordered = df
        .lazy()
        .filter(col(DATE_COLUMN).is_not_null())
        .sort(
            [DATE_COLUMN],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(Some(vec![DATE_COLUMN.into()]), UniqueKeepStrategy::First)
        .collect()?;
    Ok(ordered)
}

fn empty_result(instrument: &Instrument) -> FetchError {
    FetchError::EmptyResult {
        code: instrument.code.to_string(),
        symbol: instrument.provider_symbol.to_string(),
    }
}
