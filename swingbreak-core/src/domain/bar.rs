//! Bar: the fundamental market data unit, and the ordered series that owns them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLC(V) bar for a single instrument at a single timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(time: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// `low <= {open, close} <= high` and nothing is NaN.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Absolute candle body `|close - open|`.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Up-close or doji. Dojis count as bullish for wave classification.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Strict down-close.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Ordered, immutable-once-built sequence of bars for one symbol.
///
/// Timestamps are strictly increasing: construction sorts the input and
/// collapses duplicate timestamps, keeping the last occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.time);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the bar stamped exactly `time`.
    pub fn index_of(&self, time: NaiveDateTime) -> Option<usize> {
        self.bars.binary_search_by_key(&time, |b| b.time).ok()
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.time)
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample_bar() -> Bar {
        Bar::new(t(9, 0), 100.0, 105.0, 98.0, 103.0)
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_close_outside_range() {
        let mut bar = sample_bar();
        bar.close = 106.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn doji_counts_as_bullish() {
        let bar = Bar::new(t(9, 0), 100.0, 101.0, 99.0, 100.0);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert_eq!(bar.body(), 0.0);
    }

    #[test]
    fn series_sorts_and_dedupes() {
        let a = Bar::new(t(9, 5), 1.0, 2.0, 0.5, 1.5);
        let b = Bar::new(t(9, 0), 1.0, 2.0, 0.5, 1.2);
        let b2 = Bar::new(t(9, 0), 1.0, 2.0, 0.5, 1.8);
        let series = BarSeries::new("TEST", vec![a, b, b2]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].time, t(9, 0));
        assert_eq!(series.bars()[0].close, 1.8);
        assert_eq!(series.index_of(t(9, 5)), Some(1));
        assert_eq!(series.index_of(t(9, 10)), None);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
