//! Bar timeframes and OHLC resampling.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Chart timeframe, named MT5-style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    MN,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN,
    ];

    /// Nominal bar length in minutes (a month counts as 30 days).
    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1_440,
            Timeframe::W1 => 10_080,
            Timeframe::MN => 43_200,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN => "MN",
        }
    }

    /// Interval string understood by the chart API. H4 has no native interval
    /// and is fetched hourly.
    pub fn provider_interval(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 | Timeframe::H4 => "1h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1wk",
            Timeframe::MN => "1mo",
        }
    }

    /// Whether fetched bars must be resampled to reach this timeframe.
    pub fn needs_resample(self) -> bool {
        self == Timeframe::H4
    }

    /// How far back the provider serves bars at this interval.
    pub fn max_lookback_days(self) -> i64 {
        match self {
            Timeframe::M1 => 7,
            Timeframe::M5 | Timeframe::M15 | Timeframe::M30 => 59,
            Timeframe::H1 | Timeframe::H4 => 729,
            Timeframe::D1 | Timeframe::W1 | Timeframe::MN => 3_650,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    /// Accepts MT5 names (`M5`, `H1`) and provider intervals (`5m`, `1h`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tf = match s.trim() {
            "M1" | "m1" | "1m" => Timeframe::M1,
            "M5" | "m5" | "5m" => Timeframe::M5,
            "M15" | "m15" | "15m" => Timeframe::M15,
            "M30" | "m30" | "30m" => Timeframe::M30,
            "H1" | "h1" | "1h" | "60m" => Timeframe::H1,
            "H4" | "h4" | "4h" => Timeframe::H4,
            "D1" | "d1" | "1d" => Timeframe::D1,
            "W1" | "w1" | "1wk" => Timeframe::W1,
            "MN" | "mn" | "1mo" => Timeframe::MN,
            other => return Err(format!("unknown timeframe '{other}'")),
        };
        Ok(tf)
    }
}

/// Start of the `minutes`-wide bucket containing `t`, aligned to midnight.
pub fn bucket_start(t: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    let minutes = minutes.max(1);
    let day = t.date().and_time(chrono::NaiveTime::MIN);
    if minutes >= 1_440 {
        let days = minutes / 1_440;
        let offset = i64::from(t.date().num_days_from_ce()) % days;
        return day - Duration::days(offset);
    }
    let of_day = i64::from(t.hour()) * 60 + i64::from(t.minute());
    day + Duration::minutes(of_day - of_day % minutes)
}

/// Resample to `minutes`-wide buckets: open first, high max, low min,
/// close last, volume summed. Input must be time-ordered.
pub fn resample(bars: &[Bar], minutes: i64) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    for bar in bars {
        let start = bucket_start(bar.time, minutes);
        match out.last_mut() {
            Some(last) if last.time == start => {
                last.high = last.high.max(bar.high);
                last.low = last.low.min(bar.low);
                last.close = bar.close;
                last.volume = match (last.volume, bar.volume) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                };
            }
            _ => out.push(Bar {
                time: start,
                ..bar.clone()
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar_at, ts};

    #[test]
    fn parses_both_spellings() {
        assert_eq!("M5".parse::<Timeframe>().unwrap(), Timeframe::M5);
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::H1);
        assert_eq!("1wk".parse::<Timeframe>().unwrap(), Timeframe::W1);
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn h4_is_fetched_hourly() {
        assert_eq!(Timeframe::H4.provider_interval(), "1h");
        assert!(Timeframe::H4.needs_resample());
        assert!(!Timeframe::H1.needs_resample());
    }

    #[test]
    fn buckets_floor_to_boundary() {
        assert_eq!(bucket_start(ts(13), 60), ts(12)); // 01:05 → 01:00
        assert_eq!(bucket_start(ts(11), 60), ts(0)); // 00:55 → 00:00
        assert_eq!(bucket_start(ts(3), 15), ts(3));
    }

    #[test]
    fn resample_to_hour() {
        let bars: Vec<Bar> = (0..24)
            .map(|i| {
                let x = i as f64;
                let mut b = bar_at(i, 100.0 + x, 101.0 + x, 99.0 + x, 100.5 + x);
                b.volume = Some(1.0);
                b
            })
            .collect();
        let hourly = resample(&bars, 60);
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].time, ts(0));
        assert_eq!(hourly[0].open, 100.0);
        assert_eq!(hourly[0].high, 112.0);
        assert_eq!(hourly[0].low, 99.0);
        assert_eq!(hourly[0].close, 111.5);
        assert_eq!(hourly[0].volume, Some(12.0));
        assert_eq!(hourly[1].time, ts(12));
        assert_eq!(hourly[1].open, 112.0);
    }
}
