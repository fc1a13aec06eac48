//! R-multiple statistics: pure functions over trade outcomes.
//!
//! Every trade is measured in units of its initial risk. Open trades count
//! toward `trades` and the per-reason tally but are excluded from every
//! closed-trade statistic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use swingbreak_core::domain::Direction;
use swingbreak_core::outcome::TradeOutcome;

/// Cap applied to profit factor when there are no losing trades.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Aggregate statistics for one exit policy on one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RMetrics {
    pub trades: usize,
    pub closed: usize,
    pub open: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_r: f64,
    pub avg_r: f64,
    pub avg_win_r: f64,
    pub avg_loss_r: f64,
    pub profit_factor: f64,
    pub max_consecutive_losses: usize,
    /// Deepest peak-to-trough decline of cumulative R (non-positive).
    pub max_drawdown_r: f64,
    /// Count per exit reason (`TP`, `SL`, `BE`, ...).
    pub by_reason: BTreeMap<String, usize>,
    pub buy: SideMetrics,
    pub sell: SideMetrics,
}

/// Closed-trade summary for one direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMetrics {
    pub closed: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub total_r: f64,
    pub avg_r: f64,
}

impl RMetrics {
    /// Compute all statistics; `outcomes` must be in signal order.
    pub fn compute(outcomes: &[TradeOutcome]) -> Self {
        let closed: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.is_closed())
            .map(|o| o.pnl_r)
            .collect();

        let mut by_reason = BTreeMap::new();
        for o in outcomes {
            *by_reason.entry(o.reason.as_str().to_string()).or_insert(0) += 1;
        }

        let wins: Vec<f64> = closed.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = closed.iter().copied().filter(|r| *r < 0.0).collect();
        let total_r: f64 = closed.iter().sum();

        Self {
            trades: outcomes.len(),
            closed: closed.len(),
            open: outcomes.len() - closed.len(),
            wins: wins.len(),
            losses: losses.len(),
            win_rate: ratio(wins.len(), closed.len()),
            total_r,
            avg_r: mean(&closed),
            avg_win_r: mean(&wins),
            avg_loss_r: mean(&losses),
            profit_factor: profit_factor(&closed),
            max_consecutive_losses: max_consecutive_losses(&closed),
            max_drawdown_r: max_drawdown_r(&closed),
            by_reason,
            buy: SideMetrics::compute(outcomes, Direction::Buy),
            sell: SideMetrics::compute(outcomes, Direction::Sell),
        }
    }
}

impl SideMetrics {
    fn compute(outcomes: &[TradeOutcome], direction: Direction) -> Self {
        let pnl: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.is_closed() && o.direction == direction)
            .map(|o| o.pnl_r)
            .collect();
        let wins = pnl.iter().filter(|r| **r > 0.0).count();
        Self {
            closed: pnl.len(),
            wins,
            win_rate: ratio(wins, pnl.len()),
            total_r: pnl.iter().sum(),
            avg_r: mean(&pnl),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Gross winning R over gross losing R, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(pnl_r: &[f64]) -> f64 {
    let gross_win: f64 = pnl_r.iter().filter(|r| **r > 0.0).sum();
    let gross_loss: f64 = pnl_r.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_win > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gross_win / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Longest run of losing trades. Breakeven trades end a run.
pub fn max_consecutive_losses(pnl_r: &[f64]) -> usize {
    let mut best = 0;
    let mut current = 0;
    for r in pnl_r {
        if *r < 0.0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Maximum drawdown of the cumulative R curve, starting from zero.
pub fn max_drawdown_r(pnl_r: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for r in pnl_r {
        equity += r;
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }
    max_dd
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}
