//! Data access: CSV snapshots, market-data providers, batch fetch and
//! synthetic series.

pub mod circuit_breaker;
pub mod csv_import;
pub mod fetch;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_import::{load_csv, save_csv, CsvOptions};
pub use fetch::{fetch_symbols, snapshot_path, FetchSummary};
pub use provider::{DataError, DataProvider, FetchProgress, StdoutProgress};
pub use synthetic::synthetic_series;
pub use yahoo::{resolve_symbol, YahooProvider};
