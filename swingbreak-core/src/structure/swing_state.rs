//! Rolling swing state, updated as pivots become causally visible.

use serde::{Deserialize, Serialize};

use crate::domain::{SwingKind, SwingLevel, SwingPoint};

/// The two most recent swing highs and lows, plus the opposite-side snapshots
/// later used as stop anchors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingState {
    /// Newest swing high.
    pub sh1: Option<SwingLevel>,
    /// Previous swing high.
    pub sh0: Option<SwingLevel>,
    /// Newest swing low.
    pub sl1: Option<SwingLevel>,
    /// Previous swing low.
    pub sl0: Option<SwingLevel>,
    /// Newest swing low at the moment the newest swing high registered.
    pub sl_before_sh: Option<SwingLevel>,
    /// Newest swing high at the moment the newest swing low registered.
    pub sh_before_sl: Option<SwingLevel>,
}

/// Pivots that became visible on one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwingUpdate {
    pub high: Option<SwingLevel>,
    pub low: Option<SwingLevel>,
}

impl SwingUpdate {
    pub fn is_empty(&self) -> bool {
        self.high.is_none() && self.low.is_none()
    }
}

impl SwingState {
    /// Apply newly visible pivots.
    ///
    /// Order is fixed: shift lows, then shift highs (snapshotting the newest
    /// low into `sl_before_sh`), then snapshot the newest high into
    /// `sh_before_sl`. When a high and a low land on the same bar the low is
    /// therefore already current when the high snapshots it, and the low-side
    /// snapshot sees the new high.
    pub fn apply(&mut self, update: SwingUpdate) {
        if let Some(low) = update.low {
            self.sl0 = self.sl1;
            self.sl1 = Some(low);
        }
        if let Some(high) = update.high {
            self.sl_before_sh = self.sl1;
            self.sh0 = self.sh1;
            self.sh1 = Some(high);
        }
        if update.low.is_some() {
            self.sh_before_sl = self.sh1;
        }
    }
}

/// Feeds a precomputed pivot list into a [`SwingState`] one bar at a time.
///
/// A pivot at index `p` is consumed by `advance(p + pivot_len)`. Call
/// `advance` once per bar in ascending order; pivots belonging to skipped bars
/// are dropped.
#[derive(Debug, Clone)]
pub struct SwingTracker<'a> {
    swings: &'a [SwingPoint],
    pivot_len: usize,
    cursor: usize,
    state: SwingState,
}

impl<'a> SwingTracker<'a> {
    pub fn new(swings: &'a [SwingPoint], pivot_len: usize) -> Self {
        Self {
            swings,
            pivot_len,
            cursor: 0,
            state: SwingState::default(),
        }
    }

    pub fn state(&self) -> &SwingState {
        &self.state
    }

    /// Consume every pivot whose lookahead window closes at `bar_index`.
    pub fn advance(&mut self, bar_index: usize) -> SwingUpdate {
        let mut update = SwingUpdate::default();
        let Some(visible) = bar_index.checked_sub(self.pivot_len) else {
            return update;
        };

        while self
            .swings
            .get(self.cursor)
            .is_some_and(|s| s.bar_index < visible)
        {
            self.cursor += 1;
        }
        while let Some(swing) = self.swings.get(self.cursor) {
            if swing.bar_index != visible {
                break;
            }
            match swing.kind {
                SwingKind::High => update.high = Some(swing.level()),
                SwingKind::Low => update.low = Some(swing.level()),
            }
            self.cursor += 1;
        }

        self.state.apply(update);
        update
    }
}
