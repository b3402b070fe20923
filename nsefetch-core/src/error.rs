//! Errors surfaced by the fetcher.

use crate::data::DataError;
use thiserror::Error;

/// Every way `fetch_daily_history` can fail.
///
/// Nothing is retried or recovered; the caller decides what to do next.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data found for {code} ({symbol})")]
    EmptyResult { code: String, symbol: String },

    #[error("missing required columns for {code}: {}", .fields.join(", "))]
    MissingField { code: String, fields: Vec<String> },

    #[error("unsupported instrument code: {code}")]
    UnsupportedInstrument { code: String },

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("provider error: {0}")]
    Provider(#[from] DataError),

    #[error("table error: {0}")]
    Table(String),
}

impl From<polars::prelude::PolarsError> for FetchError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        FetchError::Table(e.to_string())
    }
}
