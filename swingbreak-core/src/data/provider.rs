//! Data provider trait and structured error types.
//!
//! `DataProvider` abstracts over market-data sources so the fetch loop can be
//! driven by a mock in tests.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::BarSeries;
use crate::timeframe::Timeframe;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("unparseable timestamp '{0}'")]
    BadTimestamp(String),

    #[error("no usable bars in {}", .0.display())]
    Empty(PathBuf),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Source of intraday bars.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for `symbol` at `timeframe` between `start` and `end` (UTC).
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<BarSeries, DataError>;

    /// False while the provider refuses requests (rate limited, blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-symbol fetches.
pub trait FetchProgress: Send {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, result: &Result<usize, DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Prints progress lines to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, result: &Result<usize, DataError>) {
        match result {
            Ok(bars) => println!("  OK: {symbol} ({bars} bars)"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
