//! Domain types: the instrument table and the normalized price series.

pub mod instrument;
pub mod series;

pub use instrument::{
    describe_supported_instruments, Instrument, InstrumentInfo, DEFAULT_INSTRUMENT_CODE,
    SUPPORTED_INSTRUMENTS,
};
pub use series::{DailyBar, PriceSeries, DATE_COLUMN, REQUIRED_FIELDS};
