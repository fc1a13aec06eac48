//! Parameter sweeps across pairs and detector configurations.
//!
//! Every (pair, config) combination is an independent [`run_pair`] call, so
//! the sweep fans out with rayon; each worker owns its own detector state.

use rayon::prelude::*;
use tracing::info;

use swingbreak_core::domain::BarSeries;
use swingbreak_core::engine::DetectorConfig;

use crate::config::BacktestConfig;
use crate::runner::{run_pair, PairReport};

/// Detector parameter grid: the cartesian product of its axes.
#[derive(Debug, Clone)]
pub struct DetectorGrid {
    pub pivot_lens: Vec<usize>,
    pub impulse_mults: Vec<f64>,
}

impl DetectorGrid {
    pub fn size(&self) -> usize {
        self.pivot_lens.len() * self.impulse_mults.len()
    }

    /// One config per grid point, all other settings taken from `base`.
    /// A zero pivot length is skipped.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &pivot_len in &self.pivot_lens {
            if pivot_len == 0 {
                continue;
            }
            for &impulse_mult in &self.impulse_mults {
                configs.push(base.with_detector(DetectorConfig {
                    pivot_len,
                    impulse_mult,
                    ..base.detector
                }));
            }
        }
        configs
    }
}

/// One finished combination.
#[derive(Debug, Clone)]
pub struct SweepRun {
    /// Index into the config list passed to [`sweep`].
    pub config_index: usize,
    pub detector: DetectorConfig,
    pub report: PairReport,
}

impl SweepRun {
    /// Total R of the first exit policy; the ranking key.
    pub fn total_r(&self) -> f64 {
        self.report
            .policies
            .first()
            .map_or(0.0, |p| p.metrics.total_r)
    }
}

/// Run every config on every series in parallel.
///
/// Results come back in (series, config) order regardless of scheduling.
pub fn sweep(series_list: &[BarSeries], configs: &[BacktestConfig]) -> SweepResults {
    let jobs: Vec<(&BarSeries, usize)> = series_list
        .iter()
        .flat_map(|s| (0..configs.len()).map(move |c| (s, c)))
        .collect();
    info!(
        pairs = series_list.len(),
        configs = configs.len(),
        jobs = jobs.len(),
        "starting sweep"
    );

    let runs = jobs
        .par_iter()
        .map(|&(series, idx)| SweepRun {
            config_index: idx,
            detector: configs[idx].detector,
            report: run_pair(series, &configs[idx]),
        })
        .collect();

    SweepResults { runs }
}

/// Results from a sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepResults {
    runs: Vec<SweepRun>,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Runs sorted by total R of the first policy, best first.
    pub fn sorted_by_total_r(&self) -> Vec<&SweepRun> {
        let mut sorted: Vec<_> = self.runs.iter().collect();
        sorted.sort_by(|a, b| b.total_r().total_cmp(&a.total_r()));
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&SweepRun> {
        self.sorted_by_total_r().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&SweepRun> {
        self.sorted_by_total_r().into_iter().next()
    }

    /// Fixed-width table, best first.
    pub fn format_table(&self) -> String {
        let mut out = format!(
            "{:<8} {:>5} {:>7} {:>7} {:>7} {:>7} {:>8} {:>6}\n",
            "pair", "pivot", "impulse", "signals", "closed", "win%", "total_r", "pf"
        );
        for run in self.sorted_by_total_r() {
            let (closed, win_rate, pf) = run.report.policies.first().map_or((0, 0.0, 0.0), |p| {
                (p.metrics.closed, p.metrics.win_rate, p.metrics.profit_factor)
            });
            out.push_str(&format!(
                "{:<8} {:>5} {:>7.2} {:>7} {:>7} {:>6.1}% {:>8.2} {:>6.2}\n",
                run.report.pair,
                run.detector.pivot_len,
                run.detector.impulse_mult,
                run.report.signals.len(),
                closed,
                win_rate * 100.0,
                run.total_r(),
                pf,
            ));
        }
        out
    }
}
