//! Batch fetch: pull several symbols and write their CSV snapshots.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};

use super::csv_import::save_csv;
use super::provider::{DataError, DataProvider, FetchProgress};
use crate::timeframe::Timeframe;

/// Snapshot file for `symbol` at `timeframe` under `dir`.
pub fn snapshot_path(dir: &Path, symbol: &str, timeframe: Timeframe) -> PathBuf {
    dir.join(format!("{}_{}.csv", symbol.to_uppercase(), timeframe))
}

/// Fetch each symbol over the provider's maximum lookback ending at `end`,
/// writing one snapshot per symbol. Failures are collected, not raised; the
/// loop stops early once the provider becomes unavailable.
pub fn fetch_symbols(
    provider: &dyn DataProvider,
    symbols: &[&str],
    timeframe: Timeframe,
    end: NaiveDateTime,
    out_dir: &Path,
    progress: &dyn FetchProgress,
) -> FetchSummary {
    let total = symbols.len();
    let start = end - Duration::days(timeframe.max_lookback_days());
    let mut summary = FetchSummary {
        total,
        ..FetchSummary::default()
    };

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);
        let result = provider
            .fetch(symbol, timeframe, start, end)
            .and_then(|series| {
                let path = snapshot_path(out_dir, symbol, timeframe);
                save_csv(&series, &path)?;
                Ok((path, series.len()))
            });

        let reported = result.map(|(path, bars)| {
            summary.written.push(path);
            bars
        });
        progress.on_complete(symbol, &reported);
        if let Err(e) = reported {
            tracing::warn!(symbol, error = %e, "fetch failed");
            summary.errors.push((symbol.to_string(), e));
        }

        if !provider.is_available() {
            for rest in &symbols[i + 1..] {
                summary
                    .errors
                    .push((rest.to_string(), DataError::CircuitBreakerTripped));
            }
            break;
        }
    }

    progress.on_batch_complete(summary.written.len(), summary.errors.len(), total);
    summary
}

/// Summary of a batch fetch.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub total: usize,
    pub written: Vec<PathBuf>,
    pub errors: Vec<(String, DataError)>,
}

impl FetchSummary {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}
