//! MarketDataFetcher: resolve a code, fetch, then normalize.

use crate::config::{FetcherConfig, UnknownCodePolicy};
use crate::data::{normalize, HistoryProvider, YahooProvider};
use crate::domain::{Instrument, InstrumentInfo, PriceSeries};
use crate::error::FetchError;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Fetches one instrument's daily OHLCV history over a date range.
///
/// Stateless between calls: every fetch makes exactly one provider request
/// and builds a fresh [`PriceSeries`].
pub struct MarketDataFetcher<P> {
    provider: P,
    config: FetcherConfig,
}

impl MarketDataFetcher<YahooProvider> {
    /// Fetcher backed by Yahoo Finance, configured from `config.yahoo`.
    pub fn yahoo(config: FetcherConfig) -> Result<Self, FetchError> {
        let provider = YahooProvider::new(&config.yahoo)?;
        Ok(Self::with_config(provider, config))
    }
}

impl<P: HistoryProvider> MarketDataFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, FetcherConfig::default())
    }

    pub fn with_config(provider: P, config: FetcherConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Descriptors for every supported code. Never touches the provider.
    pub fn describe_supported_instruments() -> BTreeMap<String, InstrumentInfo> {
        crate::domain::describe_supported_instruments()
    }

    /// Map a short code to its instrument.
    ///
    /// Unknown codes follow `config.unknown_code`: substitution logs a warning
    /// and returns the default instrument, rejection returns
    /// `UnsupportedInstrument`.
    pub fn resolve(&self, code: &str) -> Result<&'static Instrument, FetchError> {
        if let Some(instrument) = Instrument::lookup(code) {
            return Ok(instrument);
        }

        match self.config.unknown_code {
            UnknownCodePolicy::Substitute => {
                let fallback = Instrument::default_instrument();
                warn!(
                    requested = code,
                    substitute = fallback.code,
                    "only {} is supported, using {} instead of {code}",
                    fallback.code,
                    fallback.code
                );
                Ok(fallback)
            }
            UnknownCodePolicy::Reject => {
                error!(requested = code, "unsupported instrument code");
                Err(FetchError::UnsupportedInstrument {
                    code: code.to_string(),
                })
            }
        }
    }

    /// Fetch daily history for `code` between two `YYYY-MM-DD` dates.
    ///
    /// The end date is exclusive, matching the provider contract. `start`
    /// is not required to precede `end`; a reversed range has no rows and
    /// fails with `EmptyResult`.
    pub fn fetch_daily_history(
        &self,
        code: &str,
        start: &str,
        end: &str,
    ) -> Result<PriceSeries, FetchError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        self.fetch_range(code, start, end)
    }

    /// Same as [`fetch_daily_history`](Self::fetch_daily_history) with parsed dates.
    pub fn fetch_range(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        let instrument = self.resolve(code)?;
        let symbol = instrument.provider_symbol;

        info!(
            provider = self.provider.name(),
            "downloading {} ({symbol}) from {start} to {end}",
            instrument.name
        );

        let result = self
            .provider
            .daily_history(symbol, start, end)
            .map_err(FetchError::from)
            .and_then(|raw| normalize(raw, instrument));

        match result {
            Ok(frame) => {
                let series = PriceSeries::new(instrument, frame);
                info!(
                    rows = series.len(),
                    "downloaded {} samples for {} ({symbol})",
                    series.len(),
                    instrument.code
                );
                Ok(series)
            }
            Err(e) => {
                error!("failed to download {} ({symbol}): {e}", instrument.code);
                Err(e)
            }
        }
    }

    /// Fetch the default instrument over an explicit range.
    pub fn fetch_default(&self, start: &str, end: &str) -> Result<PriceSeries, FetchError> {
        self.fetch_daily_history(Instrument::default_instrument().code, start, end)
    }

    /// Fetch the default instrument over the configured default range.
    pub fn fetch_configured(&self) -> Result<PriceSeries, FetchError> {
        self.fetch_range(
            Instrument::default_instrument().code,
            self.config.default_start,
            self.config.default_end,
        )
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| FetchError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
