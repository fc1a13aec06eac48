//! Swingbreak Runner: backtest orchestration, statistics and reporting.
//!
//! This crate builds on `swingbreak-core` to provide:
//! - TOML configuration with validation and a stable config hash
//! - Multi-pair CSV loading that continues past per-pair failures
//! - Single-pair pipeline: detect, HTF-filter, simulate each exit policy
//! - R-multiple metrics and timing/context breakdowns
//! - CSV/JSON artifacts, console tables and static HTML charts
//! - Parallel sweeps over pairs and detector configurations

pub mod breakdown;
pub mod chart;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use breakdown::{Breakdown, GroupStats};
pub use chart::{render_chart_html, write_chart_html};
pub use config::{BacktestConfig, ConfigError, DataSection, HtfSection, OutputSection};
pub use data_loader::{load_pair, load_pairs, LoadError, LoadedData, LoadedPair, PairFailure};
pub use export::{
    format_breakdown, format_comparison, format_summary, load_artifacts, save_artifacts,
    RunManifest,
};
pub use metrics::{RMetrics, SideMetrics};
pub use runner::{
    run_pair, run_pairs, HtfSummary, PairReport, PolicyReport, RunError, RunSummary,
    SCHEMA_VERSION,
};
pub use sweep::{sweep, DetectorGrid, SweepResults, SweepRun};
