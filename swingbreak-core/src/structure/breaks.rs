//! Break classifier: higher-high / lower-low detection with impulse and
//! break-strength filters. Stateless given the swing state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::swing_state::{SwingState, SwingUpdate};
use crate::domain::{Bar, Direction, SwingLevel};
use crate::indicators::average_body;

/// Trailing window for the impulse filter's average body.
pub const BODY_WINDOW: usize = 20;

/// Filter thresholds. A value `<= 0` disables the corresponding filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakFilters {
    /// Impulse bar body must be at least this multiple of the average body.
    pub impulse_mult: f64,
    /// Break distance must be at least this fraction of the prior swing range.
    pub break_mult: f64,
}

/// Per-bar classifier output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Breaks {
    pub up: bool,
    pub down: bool,
}

/// A raw structural break, recorded for reporting and charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakEvent {
    pub direction: Direction,
    /// Bar on which the break became known.
    pub bar_index: usize,
    pub time: NaiveDateTime,
    /// The swing that was broken (`sh0` / `sl0`).
    pub broken: SwingLevel,
    /// The new extreme (`sh1` / `sl1`).
    pub extreme: SwingLevel,
}

/// Decide whether the swings that became visible at `bar_index` broke
/// structure. `state` must already include `update`.
pub fn classify(
    bars: &[Bar],
    bar_index: usize,
    state: &SwingState,
    update: SwingUpdate,
    filters: BreakFilters,
) -> Breaks {
    if update.is_empty() {
        return Breaks::default();
    }
    let avg_body = if filters.impulse_mult > 0.0 {
        average_body(bars, bar_index, BODY_WINDOW)
    } else {
        0.0
    };

    let up = update.high.is_some()
        && side_breaks(
            bars,
            Direction::Buy,
            state.sh1,
            state.sh0,
            state.sl_before_sh,
            avg_body,
            filters,
        );
    let down = update.low.is_some()
        && side_breaks(
            bars,
            Direction::Sell,
            state.sl1,
            state.sl0,
            state.sh_before_sl,
            avg_body,
            filters,
        );

    Breaks { up, down }
}

fn side_breaks(
    bars: &[Bar],
    direction: Direction,
    newest: Option<SwingLevel>,
    previous: Option<SwingLevel>,
    opposite_anchor: Option<SwingLevel>,
    avg_body: f64,
    filters: BreakFilters,
) -> bool {
    let (Some(newest), Some(previous)) = (newest, previous) else {
        return false;
    };
    let sign = direction.sign();
    if (newest.price - previous.price) * sign <= 0.0 {
        return false;
    }

    if filters.impulse_mult > 0.0
        && !impulse_confirms(
            bars,
            previous.index,
            newest.index,
            previous.price,
            direction,
            filters.impulse_mult * avg_body,
        )
    {
        return false;
    }

    let Some(anchor) = opposite_anchor else {
        return false;
    };
    let swing_range = (previous.price - anchor.price) * sign;
    let break_distance = (newest.price - previous.price) * sign;
    strength_passes(swing_range, break_distance, filters.break_mult)
}

/// Scan `from..=to` for the first bar closing beyond `level`; that bar's body
/// must reach `min_body`. No crossing bar rejects the break.
pub fn impulse_confirms(
    bars: &[Bar],
    from: usize,
    to: usize,
    level: f64,
    direction: Direction,
    min_body: f64,
) -> bool {
    bars.iter()
        .take(to + 1)
        .skip(from)
        .find(|bar| (bar.close - level) * direction.sign() > 0.0)
        .is_some_and(|bar| bar.body() >= min_body)
}

/// Break-strength filter. `break_mult <= 0` always passes.
pub fn strength_passes(swing_range: f64, break_distance: f64, break_mult: f64) -> bool {
    if break_mult <= 0.0 {
        return true;
    }
    swing_range > 0.0 && break_distance >= swing_range * break_mult
}
