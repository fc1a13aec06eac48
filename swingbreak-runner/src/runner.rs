//! Backtest runner: wires detection, filtering, outcome simulation and
//! statistics together.
//!
//! Two entry points:
//! - `run_pair()`: pure, takes an already loaded series. Used by sweeps and tests.
//! - `run_pairs()`: loads every configured pair from CSV, then runs each one.
//!   A pair that fails to load is reported, not fatal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span};

use swingbreak_core::domain::{BarSeries, Signal};
use swingbreak_core::engine::run_detection;
use swingbreak_core::outcome::{simulate, ExitPolicy, TradeOutcome};
use swingbreak_core::timeframe::Timeframe;

use crate::breakdown::Breakdown;
use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{dataset_hash, load_pairs, LoadError, PairFailure};
use crate::metrics::RMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome of the higher-timeframe filter on one pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtfSummary {
    pub kept: usize,
    pub rejected: usize,
    /// Signals kept because no closed coarse bar had an EMA yet.
    pub no_data: usize,
}

/// Results of one exit policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub policy: ExitPolicy,
    pub label: String,
    pub metrics: RMetrics,
    pub breakdown: Breakdown,
    pub outcomes: Vec<TradeOutcome>,
}

/// Complete result for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub pair: String,
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub dataset_hash: String,
    pub swing_count: usize,
    pub break_count: usize,
    /// Signals before the HTF filter.
    pub raw_signal_count: usize,
    pub htf: Option<HtfSummary>,
    /// Signals the exit policies were simulated on.
    pub signals: Vec<Signal>,
    pub policies: Vec<PolicyReport>,
}

impl PairReport {
    pub fn policy(&self, label: &str) -> Option<&PolicyReport> {
        self.policies.iter().find(|p| p.label == label)
    }
}

/// Run one pair with pre-loaded data. No I/O.
pub fn run_pair(series: &BarSeries, config: &BacktestConfig) -> PairReport {
    let _span = info_span!("run_pair", pair = %series.symbol).entered();
    let bars = series.bars();
    let detection = run_detection(bars, &config.detector);
    let raw_signal_count = detection.signals.len();

    let (signals, htf) = match config.htf.filter() {
        Some(filter) => {
            let filtered = filter.apply(bars, &detection.signals);
            let summary = HtfSummary {
                kept: filtered.kept.len(),
                rejected: filtered.rejected,
                no_data: filtered.no_data,
            };
            (filtered.kept, Some(summary))
        }
        None => (detection.signals, None),
    };

    let policies: Vec<PolicyReport> = config
        .exits
        .iter()
        .map(|&policy| {
            let outcomes = simulate(bars, &signals, policy);
            PolicyReport {
                policy,
                label: policy.label(),
                metrics: RMetrics::compute(&outcomes),
                breakdown: Breakdown::compute(bars, &outcomes),
                outcomes,
            }
        })
        .collect();

    info!(
        bars = bars.len(),
        swings = detection.swings.len(),
        breaks = detection.breaks.len(),
        signals = signals.len(),
        rejected = htf.map_or(0, |h| h.rejected),
        "pair complete"
    );

    PairReport {
        schema_version: SCHEMA_VERSION,
        pair: series.symbol.clone(),
        timeframe: config.data.timeframe,
        bar_count: bars.len(),
        first_bar: series.first_time(),
        last_bar: series.last_time(),
        dataset_hash: dataset_hash(bars),
        swing_count: detection.swings.len(),
        break_count: detection.breaks.len(),
        raw_signal_count,
        htf,
        signals,
        policies,
    }
}

/// Reports for every pair that loaded, plus the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<PairReport>,
    pub failures: Vec<PairFailure>,
}

impl RunSummary {
    pub fn all_failed(&self) -> bool {
        self.reports.is_empty() && !self.failures.is_empty()
    }
}

/// Validate `config`, load its pairs and run each one in order.
pub fn run_pairs(config: &BacktestConfig) -> Result<RunSummary, RunError> {
    config.validate()?;
    let loaded = load_pairs(&config.data, &config.data.pairs)?;
    let reports = loaded
        .pairs
        .iter()
        .map(|p| run_pair(&p.series, config))
        .collect();
    Ok(RunSummary {
        reports,
        failures: loaded.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingbreak_core::data::{save_csv, synthetic_series};
    use swingbreak_core::engine::DetectorConfig;

    fn loose_config() -> BacktestConfig {
        BacktestConfig {
            detector: DetectorConfig {
                pivot_len: 3,
                impulse_mult: 0.0,
                break_mult: 0.0,
                ..DetectorConfig::default()
            },
            exits: vec![
                ExitPolicy::Full,
                ExitPolicy::Partial,
                ExitPolicy::Breakeven {
                    trigger_r: 1.0,
                    target_r: 2.0,
                },
            ],
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn run_pair_reports_every_policy() {
        let series = synthetic_series("XAUUSD", 3_000, 11);
        let report = run_pair(&series, &loose_config());

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.pair, "XAUUSD");
        assert_eq!(report.bar_count, 3_000);
        assert!(report.swing_count >= 4);
        assert!(report.raw_signal_count > 0, "synthetic walk should produce signals");
        assert_eq!(report.signals.len(), report.raw_signal_count);
        assert!(report.htf.is_none());

        let labels: Vec<_> = report.policies.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["full", "partial", "be_1_2"]);
        for p in &report.policies {
            assert_eq!(p.outcomes.len(), report.signals.len());
            assert_eq!(p.metrics.trades, p.outcomes.len());
        }
        assert!(report.policy("full").is_some());
        assert!(report.policy("trail_1_0.5").is_none());
    }

    #[test]
    fn htf_filter_never_adds_signals() {
        let series = synthetic_series("EURUSD", 3_000, 5);
        let mut config = loose_config();
        config.htf.enabled = true;
        config.htf.ema_period = 5;
        let report = run_pair(&series, &config);

        let htf = report.htf.unwrap();
        assert_eq!(htf.kept, report.signals.len());
        assert_eq!(htf.kept + htf.rejected, report.raw_signal_count);
        assert!(htf.no_data <= htf.kept);
    }

    #[test]
    fn run_pairs_continues_past_missing_pair() {
        let dir = tempfile::tempdir().unwrap();
        save_csv(
            &synthetic_series("EURUSD", 1_000, 3),
            &dir.path().join("EURUSD_M5.csv"),
        )
        .unwrap();

        let mut config = loose_config();
        config.data.data_dir = dir.path().to_path_buf();
        config.data.pairs = vec!["XAUUSD".into(), "EURUSD".into()];

        let summary = run_pairs(&config).unwrap();
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].pair, "EURUSD");
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].pair, "XAUUSD");
        assert!(!summary.all_failed());
    }

    #[test]
    fn run_pairs_rejects_invalid_config() {
        let mut config = loose_config();
        config.detector.pivot_len = 0;
        assert!(matches!(run_pairs(&config), Err(RunError::Config(_))));
    }

    #[test]
    fn report_round_trips_through_json() {
        let series = synthetic_series("XAUUSD", 1_500, 2);
        let report = run_pair(&series, &loose_config());
        let json = serde_json::to_string(&report).unwrap();
        let back: PairReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pair, report.pair);
        assert_eq!(back.signals.len(), report.signals.len());
        assert_eq!(back.dataset_hash, report.dataset_hash);
        assert_eq!(back.policies.len(), report.policies.len());
    }
}
