//! Yahoo Finance history provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API and lays them out as the
//! familiar `Date, Open, High, Low, Close, Adj Close, Volume, Dividends,
//! Stock Splits` table. No retries, no rate limiting: one request per call.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{DataError, HistoryProvider};
use crate::config::YahooConfig;
use crate::domain::series::date_to_days;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    #[serde(default)]
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct Events {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    numerator: f64,
    denominator: f64,
    date: i64,
}

/// Yahoo Finance history provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &YahooConfig) -> Result<Self, DataError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chart endpoint for a symbol.
    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{symbol}", self.base_url)
    }

    /// Query parameters for a daily, end-exclusive range.
    fn chart_query(start: NaiveDate, end: NaiveDate) -> [(&'static str, String); 5] {
        [
            ("period1", midnight_utc(start).to_string()),
            ("period2", midnight_utc(end).to_string()),
            ("interval", "1d".to_string()),
            ("events", "div|split".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ]
    }
}

impl HistoryProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame, DataError> {
        let resp = self
            .client
            .get(self.chart_url(symbol))
            .query(&Self::chart_query(start, end))
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;

        parse_chart(symbol, chart)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Exchange-local calendar date of a bar timestamp.
fn local_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, DataError> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.naive_utc().date())
        .ok_or_else(|| DataError::ResponseFormat(format!("invalid timestamp: {ts}")))
}

/// Parse a chart API response into the raw provider table.
fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<DataFrame, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormat(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormat("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormat("result array is empty".into()))?;

    let gmtoffset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);

    // Ranges with no trading days come back without a timestamp array.
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    if !timestamps.is_empty() && quote.close.is_empty() {
        return Err(DataError::ResponseFormat("no quote data".into()));
    }

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let events = data.events.unwrap_or_default();
    let mut dividends: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for ev in events.dividends.values() {
        *dividends.entry(local_date(ev.date, gmtoffset)?).or_default() += ev.amount;
    }
    let mut splits: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for ev in events.splits.values() {
        if ev.denominator != 0.0 {
            splits.insert(local_date(ev.date, gmtoffset)?, ev.numerator / ev.denominator);
        }
    }

    let n = timestamps.len();
    let mut dates = Vec::with_capacity(n);
    let mut open = Vec::with_capacity(n);
    let mut high = Vec::with_capacity(n);
    let mut low = Vec::with_capacity(n);
    let mut close = Vec::with_capacity(n);
    let mut adj_close = Vec::with_capacity(n);
    let mut volume = Vec::with_capacity(n);
    let mut dividend_col = Vec::with_capacity(n);
    let mut split_col = Vec::with_capacity(n);

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = local_date(ts, gmtoffset)?;

        let o = quote.open.get(i).copied().flatten();
        let h = quote.high.get(i).copied().flatten();
        let l = quote.low.get(i).copied().flatten();
        let c = quote.close.get(i).copied().flatten();
        let v = quote.volume.get(i).copied().flatten();

        // Skip bars where all OHLCV are None (holidays/non-trading days)
        if o.is_none() && h.is_none() && l.is_none() && c.is_none() && v.is_none() {
            continue;
        }

        dates.push(date_to_days(date));
        open.push(o);
        high.push(h);
        low.push(l);
        close.push(c);
        volume.push(v);
        adj_close.push(adj_closes.as_ref().and_then(|a| a.get(i).copied().flatten()));
        dividend_col.push(dividends.get(&date).copied().unwrap_or(0.0));
        split_col.push(splits.get(&date).copied().unwrap_or(0.0));
    }

    let table_err = |e: PolarsError| DataError::Table(format!("building {symbol} table: {e}"));

    DataFrame::new(vec![
        Column::new("Date".into(), dates)
            .cast(&DataType::Date)
            .map_err(table_err)?,
        Column::new("Open".into(), open),
        Column::new("High".into(), high),
        Column::new("Low".into(), low),
        Column::new("Close".into(), close),
        Column::new("Adj Close".into(), adj_close),
        Column::new("Volume".into(), volume),
        Column::new("Dividends".into(), dividend_col),
        Column::new("Stock Splits".into(), split_col),
    ])
    .map_err(table_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DataFrame, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart("IRFC.NS", resp)
    }

    // 2024-01-01 / 01-02 / 01-03 at 09:15 IST, with the middle one a holiday.
    const THREE_DAYS: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "IRFC.NS", "gmtoffset": 19800 },
                "timestamp": [1704080700, 1704167100, 1704253500],
                "events": {
                    "dividends": {
                        "1704253500": { "amount": 0.8, "date": 1704253500 }
                    }
                },
                "indicators": {
                    "quote": [{
                        "open":   [98.5, null, 101.0],
                        "high":   [100.0, null, 103.2],
                        "low":    [97.9, null, 100.4],
                        "close":  [99.6, null, 102.8],
                        "volume": [41000000, null, 52000000]
                    }],
                    "adjclose": [{ "adjclose": [99.1, null, 102.3] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_yfinance_style_columns() {
        let df = parse(THREE_DAYS).unwrap();
        let names: Vec<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "Date",
                "Open",
                "High",
                "Low",
                "Close",
                "Adj Close",
                "Volume",
                "Dividends",
                "Stock Splits"
            ]
        );
    }

    #[test]
    fn skips_holiday_rows() {
        let df = parse(THREE_DAYS).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn uses_exchange_local_dates() {
        let df = parse(THREE_DAYS).unwrap();
        let dates = df.column("Date").unwrap().date().unwrap();
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(dates.get(0), Some(date_to_days(first)));
    }

    #[test]
    fn maps_dividends_onto_their_trading_day() {
        let df = parse(THREE_DAYS).unwrap();
        let div = df.column("Dividends").unwrap().f64().unwrap();
        assert_eq!(div.get(0), Some(0.0));
        assert_eq!(div.get(1), Some(0.8));
    }

    #[test]
    fn range_without_trading_days_is_an_empty_table() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 19800 },
                    "indicators": { "quote": [{}] }
                }],
                "error": null
            }
        }"#;
        let df = parse(json).unwrap();
        assert_eq!(df.height(), 0);
        assert!(df.column("Close").is_ok());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_chart_errors_map_to_response_format() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Bad Request", "description": "Invalid input" }
            }
        }"#;
        match parse(json) {
            Err(DataError::ResponseFormat(msg)) => assert!(msg.contains("Bad Request")),
            other => panic!("expected ResponseFormat, got {other:?}"),
        }
    }

    #[test]
    fn query_is_end_exclusive_midnight_utc() {
        let q = YahooProvider::chart_query(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
        );
        assert_eq!(q[0], ("period1", "1577836800".to_string()));
        assert_eq!(q[1], ("period2", "1578614400".to_string()));
        assert_eq!(q[2].1, "1d");
    }
}
