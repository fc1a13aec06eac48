//! Timing and context breakdowns of closed trades.
//!
//! Each dimension groups closed outcomes by a property of the confirming bar
//! (hour, session, weekday, ATR regime) or of the setup itself (direction,
//! bars from break to confirmation, planned R:R).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use swingbreak_core::domain::Bar;
use swingbreak_core::indicators::atr;
use swingbreak_core::outcome::TradeOutcome;

use crate::metrics::{mean, ratio};

pub const ATR_PERIOD: usize = 14;

/// Fewer valid ATR readings than this and the ATR dimension is left empty.
const MIN_ATR_SAMPLES: usize = 5;

/// UTC session windows, `[start, end)` hours.
const SESSIONS: [(&str, u32, u32); 5] = [
    ("Asian", 0, 8),
    ("London", 8, 13),
    ("NY_Overlap", 13, 16),
    ("NY_Only", 16, 22),
    ("Off_Hours", 22, 24),
];

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const CONFIRM_BUCKETS: [(usize, &str); 8] = [
    (5, "1-5"),
    (10, "6-10"),
    (20, "11-20"),
    (30, "21-30"),
    (50, "31-50"),
    (100, "51-100"),
    (500, "101-500"),
    (usize::MAX, "500+"),
];

const RR_BUCKETS: [(f64, &str); 7] = [
    (0.5, "<0.5"),
    (1.0, "0.5-1.0"),
    (1.5, "1.0-1.5"),
    (2.0, "1.5-2.0"),
    (3.0, "2.0-3.0"),
    (5.0, "3.0-5.0"),
    (f64::INFINITY, "5.0+"),
];

const ATR_QUARTILES: [&str; 4] = ["Q1 (low)", "Q2", "Q3", "Q4 (high)"];

/// Win/loss summary for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub label: String,
    pub total: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub total_r: f64,
    pub avg_r: f64,
}

/// All dimensions for one policy run. Groups keep a fixed natural order and
/// empty groups are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub by_hour: Vec<GroupStats>,
    pub by_session: Vec<GroupStats>,
    pub by_weekday: Vec<GroupStats>,
    pub by_direction: Vec<GroupStats>,
    pub by_bars_to_confirm: Vec<GroupStats>,
    pub by_planned_rr: Vec<GroupStats>,
    pub by_atr_quartile: Vec<GroupStats>,
}

impl Breakdown {
    pub fn compute(bars: &[Bar], outcomes: &[TradeOutcome]) -> Self {
        let closed: Vec<&TradeOutcome> = outcomes.iter().filter(|o| o.is_closed()).collect();
        let confirm_time =
            |o: &TradeOutcome| bars.get(o.confirm_index).map_or(o.signal_time, |b| b.time);

        Self {
            by_hour: group(&closed, |o| {
                let hour = confirm_time(o).hour();
                Some((hour as usize, format!("{hour:02}")))
            }),
            by_session: group(&closed, |o| {
                let (idx, name) = session_of(confirm_time(o));
                Some((idx, name.to_string()))
            }),
            by_weekday: group(&closed, |o| {
                let day = confirm_time(o).weekday().num_days_from_monday() as usize;
                Some((day, WEEKDAYS[day].to_string()))
            }),
            by_direction: group(&closed, |o| {
                Some((o.direction as usize, o.direction.as_str().to_string()))
            }),
            by_bars_to_confirm: group(&closed, |o| {
                let n = o.bars_to_confirm();
                CONFIRM_BUCKETS
                    .iter()
                    .position(|(upper, _)| n <= *upper)
                    .map(|i| (i, CONFIRM_BUCKETS[i].1.to_string()))
            }),
            by_planned_rr: group(&closed, |o| {
                RR_BUCKETS
                    .iter()
                    .position(|(upper, _)| o.planned_rr <= *upper)
                    .map(|i| (i, RR_BUCKETS[i].1.to_string()))
            }),
            by_atr_quartile: atr_quartiles(bars, &closed),
        }
    }
}

/// Session index and name for a UTC timestamp.
pub fn session_of(t: NaiveDateTime) -> (usize, &'static str) {
    let hour = t.hour();
    SESSIONS
        .iter()
        .enumerate()
        .find(|(_, (_, start, end))| (*start..*end).contains(&hour))
        .map_or((SESSIONS.len(), "Unknown"), |(i, (name, _, _))| (i, *name))
}

fn atr_quartiles(bars: &[Bar], closed: &[&TradeOutcome]) -> Vec<GroupStats> {
    let atr = atr(bars, ATR_PERIOD);
    let reading = |o: &TradeOutcome| atr.get(o.confirm_index).copied().filter(|v| v.is_finite());

    let mut values: Vec<f64> = closed.iter().filter_map(|&o| reading(o)).collect();
    if values.len() < MIN_ATR_SAMPLES {
        return Vec::new();
    }
    values.sort_by(f64::total_cmp);
    let cuts = [
        quantile(&values, 0.25),
        quantile(&values, 0.5),
        quantile(&values, 0.75),
    ];

    group(closed, |o| {
        let v = reading(o)?;
        let q = cuts.iter().position(|c| v <= *c).unwrap_or(3);
        Some((q, ATR_QUARTILES[q].to_string()))
    })
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Group outcomes by `(order, label)`; `None` drops the outcome.
fn group<F>(outcomes: &[&TradeOutcome], key: F) -> Vec<GroupStats>
where
    F: Fn(&TradeOutcome) -> Option<(usize, String)>,
{
    let mut groups: BTreeMap<usize, (String, Vec<f64>)> = BTreeMap::new();
    for &o in outcomes {
        if let Some((order, label)) = key(o) {
            groups
                .entry(order)
                .or_insert_with(|| (label, Vec::new()))
                .1
                .push(o.pnl_r);
        }
    }
    groups
        .into_values()
        .map(|(label, pnl)| {
            let wins = pnl.iter().filter(|r| **r > 0.0).count();
            GroupStats {
                label,
                total: pnl.len(),
                wins,
                win_rate: ratio(wins, pnl.len()),
                total_r: pnl.iter().sum(),
                avg_r: mean(&pnl),
            }
        })
        .collect()
}
