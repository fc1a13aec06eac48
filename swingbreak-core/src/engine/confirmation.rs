//! Confirmation state machine.
//!
//! A valid break opens a [`PendingCase`]. Each later bar is fed through
//! [`step`], which either keeps the case pending, invalidates it, or confirms
//! it. [`replay`] folds `step` over a bar range and is the only way the
//! detector advances a case, live or retroactive, so both paths apply the
//! same predicates in the same order.
//!
//! Two variants share the machine:
//! - `NoRetest`: WAVE → confirm when a bar closes beyond the wave-1 extreme.
//! - `WaveRetest`: WAVE (mini-wave counting) → RETEST → confirm when price
//!   returns to the break level.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction};

/// Which confirmation sequence a case follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Two phases: WAVE, then confirm on a close beyond wave 1.
    #[default]
    NoRetest,
    /// Three phases: WAVE, RETEST, then confirm on a touch of the break level.
    WaveRetest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Wave,
    Retest,
}

/// Why a pending case was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Price touched the stop anchor.
    StopTouched,
    /// Price came back to the break level before confirming (`NoRetest` only).
    BreakLevelLost,
}

/// Result of the wave-1 scan that follows a break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave1 {
    /// Highest high (BUY) / lowest low (SELL) of the impulse wave.
    pub extreme: f64,
    /// Worst opposite excursion seen during the wave.
    pub floor: f64,
    /// First bar after the crossing that closed against the break direction.
    /// `None` when the wave is still running at the scan's end.
    pub end_index: Option<usize>,
}

/// Locate wave 1 between `from` and `to` (inclusive).
///
/// The wave starts at the first bar closing beyond `level` and runs until the
/// first bar closing the other way; that reversing bar still contributes its
/// extremes. Returns `None` when no bar closes beyond `level`.
pub fn locate_wave1(
    bars: &[Bar],
    from: usize,
    to: usize,
    level: f64,
    direction: Direction,
) -> Option<Wave1> {
    let mut wave: Option<Wave1> = None;
    for (j, bar) in bars.iter().enumerate().take(to + 1).skip(from) {
        match wave.as_mut() {
            None => {
                if closes_beyond(direction, bar, level) {
                    wave = Some(Wave1 {
                        extreme: favourable(direction, bar),
                        floor: adverse(direction, bar),
                        end_index: None,
                    });
                }
            }
            Some(w) => {
                w.extreme = further(direction, w.extreme, favourable(direction, bar));
                w.floor = further(direction.opposite(), w.floor, adverse(direction, bar));
                if closes_against(direction, bar) {
                    w.end_index = Some(j);
                    break;
                }
            }
        }
    }
    wave
}

/// Mini-wave bookkeeping for `WaveRetest`.
///
/// A with-trend bar (bullish for BUY, bearish for SELL) starts or extends a
/// wave; the first counter-trend bar ends it and still contributes its
/// extreme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveCounter {
    pub completed: usize,
    pub wave1: Option<f64>,
    pub wave2: Option<f64>,
    in_wave: bool,
    current: Option<f64>,
}

impl WaveCounter {
    /// Feed one bar. Returns the extreme of a wave that ended on this bar.
    pub fn push(&mut self, direction: Direction, bar: &Bar) -> Option<f64> {
        let price = favourable(direction, bar);
        let with_trend = match direction {
            Direction::Buy => bar.is_bullish(),
            Direction::Sell => bar.is_bearish(),
        };

        if with_trend {
            self.current = Some(match (self.in_wave, self.current) {
                (true, Some(c)) => further(direction, c, price),
                _ => price,
            });
            self.in_wave = true;
            return None;
        }

        if !self.in_wave {
            return None;
        }
        let done = self.current.map_or(price, |c| further(direction, c, price));
        self.completed += 1;
        if self.completed == 1 {
            self.wave1 = Some(done);
        } else {
            self.wave2 = Some(done);
        }
        self.in_wave = false;
        self.current = None;
        Some(done)
    }
}

/// In-flight state of one directional setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingCase {
    pub variant: Variant,
    pub direction: Direction,
    pub phase: Phase,
    /// Entry level: the broken swing (`sh0` for BUY, `sl0` for SELL).
    pub break_point: f64,
    /// Opposite-side swing snapshot taken at break time.
    pub stop_anchor: f64,
    /// Bar index of the broken swing.
    pub break_index: usize,
    pub wave1_extreme: f64,
    /// Worst adverse excursion since the break.
    pub running_trough: f64,
    pub waves: WaveCounter,
    pub wave_confirm_index: Option<usize>,
}

impl PendingCase {
    pub fn open(
        variant: Variant,
        direction: Direction,
        break_point: f64,
        stop_anchor: f64,
        break_index: usize,
        wave1: &Wave1,
    ) -> Self {
        Self {
            variant,
            direction,
            phase: Phase::Wave,
            break_point,
            stop_anchor,
            break_index,
            wave1_extreme: wave1.extreme,
            running_trough: wave1.floor,
            waves: WaveCounter::default(),
            wave_confirm_index: None,
        }
    }

    /// A fresh same-direction break may not replace a case already waiting
    /// for its retest.
    pub fn blocks(&self, incoming: Direction) -> bool {
        self.phase == Phase::Retest && self.direction == incoming
    }
}

/// A case that confirmed on `bar_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confirmation {
    pub case: PendingCase,
    pub bar_index: usize,
    pub bar_high: f64,
    pub bar_low: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Pending(PendingCase),
    Invalidated(Invalidation),
    Confirmed(Confirmation),
}

/// Advance a case by one bar.
pub fn step(mut case: PendingCase, bar: &Bar, bar_index: usize) -> Step {
    let dir = case.direction;
    let confirmed = |case: PendingCase| {
        Step::Confirmed(Confirmation {
            case,
            bar_index,
            bar_high: bar.high,
            bar_low: bar.low,
        })
    };

    case.running_trough = further(dir.opposite(), case.running_trough, adverse(dir, bar));

    match (case.variant, case.phase) {
        (Variant::NoRetest, _) => {
            if touches(dir, bar, case.stop_anchor) {
                Step::Invalidated(Invalidation::StopTouched)
            } else if touches(dir, bar, case.break_point) {
                Step::Invalidated(Invalidation::BreakLevelLost)
            } else if closes_beyond(dir, bar, case.wave1_extreme) {
                confirmed(case)
            } else {
                Step::Pending(case)
            }
        }
        (Variant::WaveRetest, Phase::Retest) => {
            if touches(dir, bar, case.stop_anchor) {
                Step::Invalidated(Invalidation::StopTouched)
            } else if touches(dir, bar, case.break_point) {
                confirmed(case)
            } else {
                Step::Pending(case)
            }
        }
        (Variant::WaveRetest, Phase::Wave) => {
            if touches(dir, bar, case.stop_anchor) {
                return Step::Invalidated(Invalidation::StopTouched);
            }
            if case.waves.push(dir, bar).is_some() && case.waves.completed >= 2 {
                if let (Some(w1), Some(w2)) = (case.waves.wave1, case.waves.wave2) {
                    if beyond(dir, w2, w1) && beyond(dir, w2, case.break_point) {
                        case.phase = Phase::Retest;
                        case.wave_confirm_index = Some(bar_index);
                    }
                }
            }
            Step::Pending(case)
        }
    }
}

/// Fold [`step`] over `from..=to`.
///
/// Returns the confirmation, if one fired, and the case still pending after
/// the range (`None` once it confirmed or was invalidated). An empty range
/// returns the case unchanged.
pub fn replay(
    bars: &[Bar],
    from: usize,
    to: usize,
    initial: PendingCase,
) -> (Option<Confirmation>, Option<PendingCase>) {
    let mut case = initial;
    for (i, bar) in bars.iter().enumerate().take(to + 1).skip(from) {
        match step(case, bar, i) {
            Step::Pending(next) => case = next,
            Step::Invalidated(reason) => {
                tracing::trace!(bar = i, ?reason, direction = %case.direction, "case invalidated");
                return (None, None);
            }
            Step::Confirmed(c) => return (Some(c), None),
        }
    }
    (None, Some(case))
}

// ─── Direction-aware price helpers ──────────────────────────────────

fn favourable(direction: Direction, bar: &Bar) -> f64 {
    match direction {
        Direction::Buy => bar.high,
        Direction::Sell => bar.low,
    }
}

fn adverse(direction: Direction, bar: &Bar) -> f64 {
    match direction {
        Direction::Buy => bar.low,
        Direction::Sell => bar.high,
    }
}

/// The more extreme of two prices in `direction` (max for BUY, min for SELL).
fn further(direction: Direction, a: f64, b: f64) -> f64 {
    match direction {
        Direction::Buy => a.max(b),
        Direction::Sell => a.min(b),
    }
}

fn beyond(direction: Direction, price: f64, level: f64) -> bool {
    (price - level) * direction.sign() > 0.0
}

/// The bar reached back to `level` against the trade direction.
pub(crate) fn touches(direction: Direction, bar: &Bar, level: f64) -> bool {
    match direction {
        Direction::Buy => bar.low <= level,
        Direction::Sell => bar.high >= level,
    }
}

/// The bar reached `level` in the trade direction.
pub(crate) fn reaches(direction: Direction, bar: &Bar, level: f64) -> bool {
    match direction {
        Direction::Buy => bar.high >= level,
        Direction::Sell => bar.low <= level,
    }
}

fn closes_beyond(direction: Direction, bar: &Bar, level: f64) -> bool {
    beyond(direction, bar.close, level)
}

fn closes_against(direction: Direction, bar: &Bar) -> bool {
    match direction {
        Direction::Buy => bar.is_bearish(),
        Direction::Sell => bar.close > bar.open,
    }
}
