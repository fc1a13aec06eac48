//! Swing points produced by the pivot detector.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extremum.
///
/// A point at `bar_index` only becomes usable at `bar_index + pivot_len`,
/// once its lookahead window has closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub time: NaiveDateTime,
    pub price: f64,
    pub kind: SwingKind,
    pub bar_index: usize,
}

impl SwingPoint {
    pub fn level(&self) -> SwingLevel {
        SwingLevel {
            price: self.price,
            index: self.bar_index,
        }
    }
}

/// Price and bar index of a swing, as held by the swing state tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    pub price: f64,
    pub index: usize,
}
