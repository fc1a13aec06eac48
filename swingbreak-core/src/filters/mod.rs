//! Signal filters: gate emitted signals on market context.
//!
//! A pass-through filter is the default; the higher-timeframe trend filter is
//! the only contextual gate.

pub mod htf;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Signal};

pub use htf::{HtfFilter, HtfTrend};

/// Outcome of evaluating one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    Passed,
    Rejected,
    /// No reference value yet; the signal passes.
    NoData,
}

impl FilterVerdict {
    pub fn keeps(self) -> bool {
        self != FilterVerdict::Rejected
    }
}

/// Trait for signal filters.
///
/// Filters see the bar series and the signal only; they never see trade
/// outcomes.
pub trait SignalFilter: Send + Sync {
    /// Human-readable name (e.g., "htf_ema", "no_filter").
    fn name(&self) -> &str;

    fn evaluate(&self, signal: &Signal, bars: &[Bar]) -> FilterVerdict;
}

/// Pass-through filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn name(&self) -> &str {
        "no_filter"
    }

    fn evaluate(&self, _signal: &Signal, _bars: &[Bar]) -> FilterVerdict {
        FilterVerdict::Passed
    }
}

/// Signals that survived a filter, plus rejection counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub kept: Vec<Signal>,
    pub rejected: usize,
    pub no_data: usize,
}

/// Run `filter` over `signals`, preserving order.
pub fn apply_filter(filter: &dyn SignalFilter, bars: &[Bar], signals: &[Signal]) -> Filtered {
    let mut out = Filtered::default();
    for signal in signals {
        let verdict = filter.evaluate(signal, bars);
        match verdict {
            FilterVerdict::Rejected => out.rejected += 1,
            FilterVerdict::NoData => out.no_data += 1,
            FilterVerdict::Passed => {}
        }
        if verdict.keeps() {
            out.kept.push(signal.clone());
        }
    }
    tracing::debug!(
        filter = filter.name(),
        kept = out.kept.len(),
        rejected = out.rejected,
        "signal filter applied"
    );
    out
}
