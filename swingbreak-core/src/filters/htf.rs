//! Higher-timeframe EMA trend filter.
//!
//! Resamples the series to a coarser bucket, computes an EMA of coarse closes
//! and rejects signals that trade against it. Only fully closed coarse bars
//! are referenced: a signal inside bucket `B` reads the EMA of the bucket
//! before `B`, or the latest earlier one when that bucket has no bars.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{FilterVerdict, Filtered, SignalFilter};
use crate::domain::{Bar, Direction, Signal};
use crate::indicators::ema_of_series;
use crate::timeframe::{bucket_start, resample};

/// Filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtfFilter {
    pub period_minutes: i64,
    pub ema_period: usize,
}

impl Default for HtfFilter {
    fn default() -> Self {
        Self {
            period_minutes: 60,
            ema_period: 50,
        }
    }
}

impl HtfFilter {
    /// Precompute the coarse EMA for `bars`.
    pub fn prepare(&self, bars: &[Bar]) -> HtfTrend {
        let coarse = resample(bars, self.period_minutes);
        let closes: Vec<f64> = coarse.iter().map(|b| b.close).collect();
        HtfTrend {
            period_minutes: self.period_minutes,
            times: coarse.iter().map(|b| b.time).collect(),
            ema: ema_of_series(&closes, self.ema_period),
        }
    }

    pub fn apply(&self, bars: &[Bar], signals: &[Signal]) -> Filtered {
        super::apply_filter(&self.prepare(bars), bars, signals)
    }
}

/// Coarse EMA series ready for lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct HtfTrend {
    period_minutes: i64,
    times: Vec<NaiveDateTime>,
    ema: Vec<f64>,
}

impl HtfTrend {
    /// EMA of the last closed coarse bar as seen at `t`.
    pub fn reference(&self, t: NaiveDateTime) -> Option<f64> {
        let key = bucket_start(t, self.period_minutes) - Duration::minutes(self.period_minutes);
        let idx = self.times.partition_point(|&c| c <= key).checked_sub(1)?;
        self.ema.get(idx).copied().filter(|v| !v.is_nan())
    }
}

impl SignalFilter for HtfTrend {
    fn name(&self) -> &str {
        "htf_ema"
    }

    fn evaluate(&self, signal: &Signal, bars: &[Bar]) -> FilterVerdict {
        let Some(ema) = self.reference(signal.signal_time) else {
            return FilterVerdict::NoData;
        };
        let Some(bar) = bars.get(signal.signal_index) else {
            return FilterVerdict::NoData;
        };
        let against = match signal.direction {
            Direction::Buy => bar.close < ema,
            Direction::Sell => bar.close > ema,
        };
        if against {
            FilterVerdict::Rejected
        } else {
            FilterVerdict::Passed
        }
    }
}
