//! Pivot detector.
//!
//! A bar at index `i` is a swing HIGH when its high dominates every other high
//! in `[i - pivot_len, i + pivot_len]`; symmetric for LOW. Only interior bars
//! (`pivot_len <= i < n - pivot_len`) are eligible.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, SwingKind, SwingPoint};

/// How exact ties inside the pivot window are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotTies {
    /// Leftmost bar of a plateau wins: strictly beyond every earlier bar in the
    /// window, at least equal to every later one.
    #[default]
    FirstBarWins,
    /// Every bar that is `>=` (`<=` for lows) all neighbours is emitted, so a
    /// plateau yields one pivot per tied bar.
    Inclusive,
}

/// Find all swing points. Pure; O(n · pivot_len). Output is ordered by bar
/// index, HIGH before LOW when one bar is both.
pub fn find_swings(bars: &[Bar], pivot_len: usize, ties: PivotTies) -> Vec<SwingPoint> {
    let n = bars.len();
    let mut swings = Vec::new();
    if pivot_len == 0 || n < 2 * pivot_len + 1 {
        return swings;
    }

    for i in pivot_len..(n - pivot_len) {
        let window = (i - pivot_len)..=(i + pivot_len);

        let is_high = window.clone().filter(|&j| j != i).all(|j| {
            dominates(bars[i].high, bars[j].high, j < i, ties, |a, b| a > b)
        });
        if is_high {
            swings.push(SwingPoint {
                time: bars[i].time,
                price: bars[i].high,
                kind: SwingKind::High,
                bar_index: i,
            });
        }

        let is_low = window.filter(|&j| j != i).all(|j| {
            dominates(bars[i].low, bars[j].low, j < i, ties, |a, b| a < b)
        });
        if is_low {
            swings.push(SwingPoint {
                time: bars[i].time,
                price: bars[i].low,
                kind: SwingKind::Low,
                bar_index: i,
            });
        }
    }

    swings
}

fn dominates(
    candidate: f64,
    neighbour: f64,
    neighbour_is_earlier: bool,
    ties: PivotTies,
    beyond: impl Fn(f64, f64) -> bool,
) -> bool {
    if beyond(candidate, neighbour) {
        return true;
    }
    if candidate != neighbour {
        return false;
    }
    match ties {
        PivotTies::Inclusive => true,
        PivotTies::FirstBarWins => !neighbour_is_earlier,
    }
}
