//! Yahoo Finance intraday provider.
//!
//! Fetches bars from the v8 chart API with retries, exponential backoff and
//! the shared circuit breaker. Familiar trading names (`XAUUSD`, `EURUSD`)
//! are mapped to Yahoo tickers; H4 is fetched hourly and resampled.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, BarSeries};
use crate::timeframe::{resample, Timeframe};

/// Trading-platform name → Yahoo ticker.
const SYMBOL_MAP: [(&str, &str); 20] = [
    ("EURUSD", "EURUSD=X"),
    ("GBPUSD", "GBPUSD=X"),
    ("USDJPY", "USDJPY=X"),
    ("AUDUSD", "AUDUSD=X"),
    ("USDCAD", "USDCAD=X"),
    ("USDCHF", "USDCHF=X"),
    ("NZDUSD", "NZDUSD=X"),
    ("EURGBP", "EURGBP=X"),
    ("XAUUSD", "GC=F"),
    ("GOLD", "GC=F"),
    ("SILVER", "SI=F"),
    ("XAGUSD", "SI=F"),
    ("OIL", "CL=F"),
    ("BTCUSD", "BTC-USD"),
    ("BTCUSDT", "BTC-USD"),
    ("ETHUSD", "ETH-USD"),
    ("SPX500", "^GSPC"),
    ("NAS100", "^IXIC"),
    ("DJI", "^DJI"),
    ("VN30", "^VN30"),
];

/// Map a trading name to its Yahoo ticker. Unknown names pass through.
pub fn resolve_symbol(symbol: &str) -> String {
    let key: String = symbol
        .chars()
        .filter(|c| *c != '/' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    SYMBOL_MAP
        .iter()
        .find(|(name, _)| *name == key)
        .map_or_else(|| symbol.to_string(), |(_, ticker)| ticker.to_string())
}

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
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(ticker: &str, interval: &str, start: NaiveDateTime, end: NaiveDateTime) -> String {
        let period1 = start.and_utc().timestamp();
        let period2 = end.and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={period1}&period2={period2}&interval={interval}"
        )
    }

    /// Convert a chart response into bars. Rows missing any OHLC value are
    /// dropped.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;
        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;
        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();
        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let time = DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
            let (Some(open), Some(high), Some(low), Some(close)) = (
                at(&quote.open, i),
                at(&quote.high, i),
                at(&quote.low, i),
                at(&quote.close, i),
            ) else {
                continue;
            };
            let mut bar = Bar::new(time, open, high, low, close);
            bar.volume = at(&quote.volume, i);
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        Ok(bars)
    }

    fn fetch_with_retry(&self, url: &str, ticker: &str) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(ticker, attempt, ?delay, "retrying fetch");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            let bars = Self::parse_response(ticker, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BarSeries, DataError> {
        let ticker = resolve_symbol(symbol);
        let url = Self::chart_url(&ticker, timeframe.provider_interval(), start, end);
        info!(symbol, %ticker, %timeframe, "fetching bars");
        let mut bars = self.fetch_with_retry(&url, &ticker)?;
        if timeframe.needs_resample() {
            bars = resample(&bars, timeframe.minutes());
        }
        Ok(BarSeries::new(symbol, bars))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
