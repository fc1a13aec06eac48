//! Trade outcome simulation.
//!
//! Resolves each emitted signal against the bars that follow it under a
//! chosen exit policy. All policies share one forward scan that starts on the
//! bar after the signal became known.

pub mod simulate;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;

pub use simulate::{simulate, simulate_one};

/// Exit-management rule applied to every signal of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Whole position to the signal's target or stop.
    #[default]
    Full,
    /// Half at target; the rest rides with a breakeven stop until the next
    /// opposite signal.
    Partial,
    /// Stop trails `step_r` behind the best excursion once it reaches `lock_r`.
    Trailing { lock_r: f64, step_r: f64 },
    /// Stop moves to entry at `trigger_r`; target at `target_r`.
    Breakeven { trigger_r: f64, target_r: f64 },
}

impl ExitPolicy {
    /// Short label for tables and file names.
    pub fn label(&self) -> String {
        match self {
            ExitPolicy::Full => "full".into(),
            ExitPolicy::Partial => "partial".into(),
            ExitPolicy::Trailing { lock_r, step_r } => format!("trail_{lock_r}_{step_r}"),
            ExitPolicy::Breakeven {
                trigger_r,
                target_r,
            } => format!("be_{trigger_r}_{target_r}"),
        }
    }
}

/// How a trade (or one leg of it) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Tp,
    Sl,
    /// Stopped at entry after the stop was moved there.
    Breakeven,
    /// Stopped by a trailed stop beyond the original one.
    Trail,
    /// Closed at the bar where the next opposite signal was emitted.
    Opposite,
    /// Unresolved at series end; marked to market.
    Open,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Tp => "TP",
            ExitReason::Sl => "SL",
            ExitReason::Breakeven => "BE",
            ExitReason::Trail => "TRAIL",
            ExitReason::Opposite => "OPP",
            ExitReason::Open => "OPEN",
        }
    }
}

/// One half of a partial exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegOutcome {
    pub reason: ExitReason,
    pub exit_index: Option<usize>,
    pub exit_price: f64,
    pub pnl_r: f64,
}

/// Resolved trade for one signal under one exit policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// Position of the signal in the detector's output.
    pub signal: usize,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub planned_rr: f64,
    pub break_index: usize,
    pub confirm_index: usize,
    pub signal_index: usize,
    pub signal_time: NaiveDateTime,
    pub reason: ExitReason,
    /// `None` while the trade is still open.
    pub exit_index: Option<usize>,
    pub exit_time: Option<NaiveDateTime>,
    pub exit_price: f64,
    pub pnl_r: f64,
    pub bars_held: usize,
    /// Per-leg detail for partial exits; empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legs: Vec<LegOutcome>,
}

impl TradeOutcome {
    pub fn is_closed(&self) -> bool {
        self.reason != ExitReason::Open
    }

    pub fn is_win(&self) -> bool {
        self.pnl_r > 0.0
    }

    /// Bars from the broken swing to the confirming bar.
    pub fn bars_to_confirm(&self) -> usize {
        self.confirm_index.saturating_sub(self.break_index)
    }
}
