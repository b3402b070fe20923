//! Data acquisition: provider trait, concrete providers, normalization.

pub mod csv_file;
pub mod normalize;
pub mod provider;
pub mod yahoo;

pub use csv_file::CsvProvider;
pub use normalize::normalize;
pub use provider::{DataError, HistoryProvider};
pub use yahoo::YahooProvider;
