//! Supported instruments and their provider symbols.
//!
//! The table is a plain constant. Only one NSE listing is configured today;
//! lookups and descriptors are written against the slice so more entries can
//! be added without touching callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Code used when a caller asks for an instrument that is not in the table.
pub const DEFAULT_INSTRUMENT_CODE: &str = "IRFC";

/// A tradable security: short code plus provider-facing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub code: &'static str,
    pub provider_symbol: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub description: &'static str,
}

/// Every instrument the fetcher knows how to resolve.
pub const SUPPORTED_INSTRUMENTS: &[Instrument] = &[Instrument {
    code: "IRFC",
    provider_symbol: "IRFC.NS",
    name: "Indian Railway Finance Corporation Limited",
    country: "India",
    description: "IRFC - Indian Railway Finance Corporation - Indian Market Focus",
}];

impl Instrument {
    /// Exact, case-sensitive lookup by short code.
    pub fn lookup(code: &str) -> Option<&'static Instrument> {
        SUPPORTED_INSTRUMENTS.iter().find(|i| i.code == code)
    }

    /// The instrument substituted for unknown codes.
    pub fn default_instrument() -> &'static Instrument {
        // DEFAULT_INSTRUMENT_CODE is always the first table entry.
        &SUPPORTED_INSTRUMENTS[0]
    }

    pub fn info(&self) -> InstrumentInfo {
        InstrumentInfo {
            name: self.name.to_string(),
            country: self.country.to_string(),
            symbol: self.provider_symbol.to_string(),
            description: self.description.to_string(),
        }
    }
}

/// Owned descriptor returned to callers and printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub name: String,
    pub country: String,
    pub symbol: String,
    pub description: String,
}

/// Descriptors for every supported code, keyed by code.
///
/// Pure: reads the constant table only.
pub fn describe_supported_instruments() -> BTreeMap<String, InstrumentInfo> {
    SUPPORTED_INSTRUMENTS
        .iter()
        .map(|i| (i.code.to_string(), i.info()))
        .collect()
}
