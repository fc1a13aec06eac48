//! Signal: the output of the confirmation state machine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    /// +1 for BUY, -1 for SELL.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-pass resolution of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalResult {
    Open,
    Tp,
    Sl,
    CloseReverse,
}

impl SignalResult {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalResult::Open => "OPEN",
            SignalResult::Tp => "TP",
            SignalResult::Sl => "SL",
            SignalResult::CloseReverse => "CLOSE_REVERSE",
        }
    }
}

/// A confirmed directional setup with entry, stop and target.
///
/// `confirm_index` is the bar whose predicate fired; `signal_index` is the
/// bar at which the confirmation became causally known. They differ when the
/// confirmation was found by retroactive replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    /// Wave-1 extreme the case was confirmed against.
    pub wave1_extreme: f64,
    pub break_index: usize,
    pub break_time: NaiveDateTime,
    pub confirm_index: usize,
    pub confirm_time: NaiveDateTime,
    pub signal_index: usize,
    pub signal_time: NaiveDateTime,
    /// Bar where the wave condition moved the case into its retest phase.
    #[serde(default)]
    pub wave_confirm_time: Option<NaiveDateTime>,
    pub result: SignalResult,
    pub pnl_r: f64,
}

impl Signal {
    /// Distance from entry to stop. Positive for every emitted signal.
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop) * self.direction.sign()
    }

    /// Distance from entry to target, in the trade direction.
    pub fn reward(&self) -> f64 {
        (self.target - self.entry) * self.direction.sign()
    }

    /// Planned reward:risk.
    pub fn planned_rr(&self) -> f64 {
        let risk = self.risk();
        if risk <= 0.0 {
            return 0.0;
        }
        self.reward() / risk
    }

    /// R-multiple of exiting at `price`.
    pub fn r_at(&self, price: f64) -> f64 {
        let risk = self.risk();
        if risk <= 0.0 {
            return 0.0;
        }
        (price - self.entry) * self.direction.sign() / risk
    }

    pub fn is_open(&self) -> bool {
        self.result == SignalResult::Open
    }
}
