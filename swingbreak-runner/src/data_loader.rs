//! Multi-pair CSV loading for the runner.
//!
//! Each configured pair is read from `{data_dir}/{PAIR}_{TF}.csv`. A pair that
//! fails to load is recorded as a [`PairFailure`] and the remaining pairs
//! still load; callers decide what to do when every pair failed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use swingbreak_core::data::{load_csv, snapshot_path, CsvOptions, DataError};
use swingbreak_core::domain::{Bar, BarSeries};

use crate::config::DataSection;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no pairs configured (set data.pairs or pass --pair)")]
    NoPairs,
    #[error("{pair}: {source}")]
    Pair {
        pair: String,
        #[source]
        source: DataError,
    },
}

/// A pair that could not be loaded, reported inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub pair: String,
    pub error: String,
}

/// One successfully loaded pair.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub pair: String,
    pub path: PathBuf,
    pub series: BarSeries,
    /// BLAKE3 over every bar, for artifact provenance.
    pub dataset_hash: String,
}

/// Everything `load_pairs` produced.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub pairs: Vec<LoadedPair>,
    pub failures: Vec<PairFailure>,
}

impl LoadedData {
    pub fn all_failed(&self) -> bool {
        self.pairs.is_empty() && !self.failures.is_empty()
    }
}

/// Load one pair's snapshot.
pub fn load_pair(data: &DataSection, pair: &str) -> Result<LoadedPair, LoadError> {
    let path = snapshot_path(&data.data_dir, pair, data.timeframe);
    let options = CsvOptions {
        keep_weekends: data.keeps_weekends(pair),
        symbol: Some(pair.to_uppercase()),
    };
    let series = load_csv(&path, &options).map_err(|source| LoadError::Pair {
        pair: pair.to_string(),
        source,
    })?;
    let dataset_hash = dataset_hash(series.bars());
    info!(pair, bars = series.len(), path = %path.display(), "loaded pair");
    Ok(LoadedPair {
        pair: pair.to_uppercase(),
        path,
        series,
        dataset_hash,
    })
}

/// Load every pair in `pairs`, continuing past failures.
pub fn load_pairs(data: &DataSection, pairs: &[String]) -> Result<LoadedData, LoadError> {
    if pairs.is_empty() {
        return Err(LoadError::NoPairs);
    }
    let mut loaded = LoadedData::default();
    for pair in pairs {
        match load_pair(data, pair) {
            Ok(p) => loaded.pairs.push(p),
            Err(e) => {
                warn!(pair = %pair, error = %e, "skipping pair");
                loaded.failures.push(PairFailure {
                    pair: pair.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(loaded)
}

/// Deterministic BLAKE3 hash over timestamps and OHLC values.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.time.and_utc().timestamp().to_le_bytes().as_slice());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.unwrap_or(0.0).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingbreak_core::data::{save_csv, synthetic_series};
    use swingbreak_core::timeframe::Timeframe;

    fn section(dir: &std::path::Path) -> DataSection {
        DataSection {
            data_dir: dir.to_path_buf(),
            timeframe: Timeframe::M5,
            ..DataSection::default()
        }
    }

    #[test]
    fn loads_snapshot_and_hashes_it() {
        let dir = tempfile::tempdir().unwrap();
        let series = synthetic_series("XAUUSD", 300, 1);
        save_csv(&series, &dir.path().join("XAUUSD_M5.csv")).unwrap();

        let loaded = load_pair(&section(dir.path()), "xauusd").unwrap();
        assert_eq!(loaded.pair, "XAUUSD");
        assert!(!loaded.series.is_empty());
        assert_eq!(loaded.dataset_hash, dataset_hash(loaded.series.bars()));
        assert_eq!(loaded.dataset_hash.len(), 64);
    }

    #[test]
    fn continues_past_missing_pairs() {
        let dir = tempfile::tempdir().unwrap();
        save_csv(
            &synthetic_series("EURUSD", 200, 2),
            &dir.path().join("EURUSD_M5.csv"),
        )
        .unwrap();

        let pairs = vec!["XAUUSD".to_string(), "EURUSD".to_string()];
        let loaded = load_pairs(&section(dir.path()), &pairs).unwrap();
        assert_eq!(loaded.pairs.len(), 1);
        assert_eq!(loaded.pairs[0].pair, "EURUSD");
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].pair, "XAUUSD");
        assert!(loaded.failures[0].error.contains("not found"));
        assert!(!loaded.all_failed());
    }

    #[test]
    fn all_missing_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_pairs(&section(dir.path()), &["GBPUSD".to_string()]).unwrap();
        assert!(loaded.all_failed());
    }

    #[test]
    fn no_pairs_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_pairs(&section(dir.path()), &[]),
            Err(LoadError::NoPairs)
        ));
    }

    #[test]
    fn hash_changes_with_data() {
        let a = synthetic_series("A", 50, 1);
        let b = synthetic_series("A", 50, 2);
        assert_eq!(dataset_hash(a.bars()), dataset_hash(a.bars()));
        assert_ne!(dataset_hash(a.bars()), dataset_hash(b.bars()));
    }
}
