//! Single-pass signal detector.
//!
//! Walks the bar series once, feeding the swing tracker, the break classifier
//! and the confirmation state machine in that order on every bar. Everything
//! a bar decides depends only on bars at or before it.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::confirmation::{locate_wave1, replay, step, Confirmation, PendingCase, Step, Variant};
use crate::domain::{Bar, Direction, Signal, SignalResult, SwingPoint};
use crate::structure::{
    classify, find_swings, BreakEvent, BreakFilters, Breaks, PivotTies, SwingState,
    SwingTracker,
};

/// Minimum number of swing points before any signal can be emitted.
const MIN_SWINGS: usize = 4;

/// How the take-profit level is derived at confirmation time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetMode {
    /// Confirming bar's high (BUY) or low (SELL).
    #[default]
    StructureConfirm,
    /// `entry ± ratio × risk`.
    FixedRr { ratio: f64 },
    /// Whichever of the two above is farther from entry.
    StructureFloor { ratio: f64 },
    /// Wave-1 peak (BUY) or trough (SELL).
    Wave1Peak,
    /// Wave-1 extreme or `entry ± ratio × risk`, whichever is farther.
    Wave1Floor { ratio: f64 },
}

impl TargetMode {
    /// Target price for a trade entering at `entry` with positive `risk`.
    fn price(
        self,
        direction: Direction,
        entry: f64,
        risk: f64,
        structure: f64,
        wave1: f64,
    ) -> f64 {
        let sign = direction.sign();
        let fixed = |ratio: f64| entry + sign * ratio * risk;
        let farther = |a: f64, b: f64| if (a - b) * sign > 0.0 { a } else { b };
        match self {
            TargetMode::StructureConfirm => structure,
            TargetMode::FixedRr { ratio } => fixed(ratio),
            TargetMode::StructureFloor { ratio } => farther(structure, fixed(ratio)),
            TargetMode::Wave1Peak => wave1,
            TargetMode::Wave1Floor { ratio } => farther(wave1, fixed(ratio)),
        }
    }
}

/// Detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub pivot_len: usize,
    /// Impulse bar body must reach this multiple of the average body. `0` disables.
    pub impulse_mult: f64,
    /// Break excess must reach this fraction of the prior swing range. `0` disables.
    pub break_mult: f64,
    pub variant: Variant,
    pub target: TargetMode,
    /// Confirmations planning less than this reward:risk are dropped. `0` disables.
    pub min_rr: f64,
    /// Stop is pushed beyond the anchor by this fraction of the entry price.
    pub sl_buffer_pct: f64,
    pub pivot_ties: PivotTies,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pivot_len: 5,
            impulse_mult: 1.5,
            break_mult: 0.25,
            variant: Variant::NoRetest,
            target: TargetMode::StructureConfirm,
            min_rr: 0.0,
            sl_buffer_pct: 0.0,
            pivot_ties: PivotTies::default(),
        }
    }
}

impl DetectorConfig {
    /// Three-phase wave + retest setup with a fixed 2R target.
    pub fn wave_retest() -> Self {
        Self {
            variant: Variant::WaveRetest,
            target: TargetMode::FixedRr { ratio: 2.0 },
            ..Self::default()
        }
    }

    pub fn filters(&self) -> BreakFilters {
        BreakFilters {
            impulse_mult: self.impulse_mult,
            break_mult: self.break_mult,
        }
    }
}

/// Everything one detection pass produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub signals: Vec<Signal>,
    pub swings: Vec<SwingPoint>,
    pub breaks: Vec<BreakEvent>,
}

/// Ordered signals for `bars`.
pub fn detect_signals(bars: &[Bar], config: &DetectorConfig) -> Vec<Signal> {
    run_detection(bars, config).signals
}

/// Raw structural breaks, before any confirmation logic.
pub fn detect_breaks(bars: &[Bar], config: &DetectorConfig) -> Vec<BreakEvent> {
    let Some(swings) = usable_swings(bars, config) else {
        return Vec::new();
    };
    let mut tracker = SwingTracker::new(&swings, config.pivot_len);
    let filters = config.filters();
    let mut events = Vec::new();
    for i in 0..bars.len() {
        let update = tracker.advance(i);
        let breaks = classify(bars, i, tracker.state(), update, filters);
        record_breaks(bars, i, tracker.state(), breaks, &mut events);
    }
    events
}

/// Full detection pass: swings, raw breaks and signals with in-pass outcome
/// tracking.
pub fn run_detection(bars: &[Bar], config: &DetectorConfig) -> Detection {
    let Some(swings) = usable_swings(bars, config) else {
        return Detection::default();
    };

    let filters = config.filters();
    let mut detection = Detection::default();
    let mut tracker = SwingTracker::new(&swings, config.pivot_len);
    let mut pending: Option<PendingCase> = None;
    let mut active: Option<usize> = None;

    for (i, bar) in bars.iter().enumerate() {
        let update = tracker.advance(i);
        let breaks = classify(bars, i, tracker.state(), update, filters);
        record_breaks(bars, i, tracker.state(), breaks, &mut detection.breaks);

        let mut confirmed: Vec<Confirmation> = Vec::new();

        if let Some(case) = pending.take() {
            match step(case, bar, i) {
                Step::Pending(next) => pending = Some(next),
                Step::Invalidated(reason) => {
                    debug!(bar = i, direction = %case.direction, ?reason, "pending case cancelled");
                }
                Step::Confirmed(c) => confirmed.push(c),
            }
        }

        let state = *tracker.state();
        for (fired, direction) in [(breaks.up, Direction::Buy), (breaks.down, Direction::Sell)] {
            if !fired || pending.is_some_and(|p| p.blocks(direction)) {
                continue;
            }
            if let Some((case, conf)) = open_case(bars, i, &state, direction, config.variant) {
                pending = case;
                confirmed.extend(conf);
            }
        }

        for c in confirmed {
            emit(bars, i, &c, config, &mut detection.signals, &mut active);
        }

        if let Some(idx) = active {
            if let Some(signal) = detection.signals.get_mut(idx) {
                if signal.signal_index < i && resolve_on_bar(signal, bar) {
                    active = None;
                }
            }
        }
    }

    detection.swings = swings;
    detection
}

fn usable_swings(bars: &[Bar], config: &DetectorConfig) -> Option<Vec<SwingPoint>> {
    let p = config.pivot_len;
    if p == 0 || bars.len() < 2 * p + 1 {
        return None;
    }
    let swings = find_swings(bars, p, config.pivot_ties);
    (swings.len() >= MIN_SWINGS).then_some(swings)
}

fn record_breaks(
    bars: &[Bar],
    i: usize,
    state: &SwingState,
    breaks: Breaks,
    out: &mut Vec<BreakEvent>,
) {
    let sides = [
        (breaks.up, Direction::Buy, state.sh0, state.sh1),
        (breaks.down, Direction::Sell, state.sl0, state.sl1),
    ];
    for (fired, direction, broken, extreme) in sides {
        if let (true, Some(broken), Some(extreme)) = (fired, broken, extreme) {
            debug!(bar = i, %direction, level = broken.price, "structure break");
            out.push(BreakEvent {
                direction,
                bar_index: i,
                time: bars[i].time,
                broken,
                extreme,
            });
        }
    }
}

/// Open a fresh case for a break classified at bar `i`.
///
/// Returns `None` when wave 1 cannot be located, leaving the previous case in
/// place. Otherwise returns the new pending case (possibly already resolved)
/// and any confirmation found by replaying the bars after wave 1.
fn open_case(
    bars: &[Bar],
    i: usize,
    state: &SwingState,
    direction: Direction,
    variant: Variant,
) -> Option<(Option<PendingCase>, Option<Confirmation>)> {
    let (broken, anchor) = match direction {
        Direction::Buy => (state.sh0?, state.sl_before_sh?),
        Direction::Sell => (state.sl0?, state.sh_before_sl?),
    };
    let wave1 = locate_wave1(bars, broken.index, i, broken.price, direction)?;
    let case = PendingCase::open(
        variant,
        direction,
        broken.price,
        anchor.price,
        broken.index,
        &wave1,
    );
    debug!(
        bar = i,
        %direction,
        break_point = case.break_point,
        stop_anchor = case.stop_anchor,
        wave1 = case.wave1_extreme,
        "pending case opened"
    );

    match variant {
        Variant::WaveRetest => Some((Some(case), None)),
        Variant::NoRetest => match wave1.end_index {
            Some(end) => {
                trace!(from = end + 1, to = i, "replaying bars after wave 1");
                let (conf, rest) = replay(bars, end + 1, i, case);
                Some((rest, conf))
            }
            None => Some((Some(case), None)),
        },
    }
}

/// Turn a confirmation into a signal, applying the buffer, target mode and
/// R:R floor. A target at or behind entry drops the signal like a
/// degenerate stop does.
fn emit(
    bars: &[Bar],
    i: usize,
    conf: &Confirmation,
    config: &DetectorConfig,
    signals: &mut Vec<Signal>,
    active: &mut Option<usize>,
) {
    let case = &conf.case;
    let dir = case.direction;
    let sign = dir.sign();
    let entry = case.break_point;
    let stop = case.stop_anchor - sign * entry * config.sl_buffer_pct;
    let risk = (entry - stop) * sign;
    if risk.is_nan() || risk <= 0.0 {
        debug!(bar = i, %dir, entry, stop, "degenerate risk, signal skipped");
        return;
    }

    let structure = match dir {
        Direction::Buy => conf.bar_high,
        Direction::Sell => conf.bar_low,
    };
    let target = config.target.price(dir, entry, risk, structure, case.wave1_extreme);
    let rr = (target - entry) * sign / risk;
    if rr.is_nan() || rr <= 0.0 {
        debug!(bar = i, %dir, entry, target, "target not beyond entry, signal skipped");
        return;
    }
    if config.min_rr > 0.0 && rr < config.min_rr {
        debug!(bar = i, %dir, rr, min_rr = config.min_rr, "signal below minimum R:R");
        return;
    }

    if let Some(prev) = active.take().and_then(|idx| signals.get_mut(idx)) {
        if prev.is_open() {
            prev.result = SignalResult::CloseReverse;
            prev.pnl_r = prev.r_at(bars[i].close);
        }
    }

    debug!(bar = i, %dir, entry, stop, target, rr, confirm = conf.bar_index, "signal");
    signals.push(Signal {
        direction: dir,
        entry,
        stop,
        target,
        wave1_extreme: case.wave1_extreme,
        break_index: case.break_index,
        break_time: bars[case.break_index].time,
        confirm_index: conf.bar_index,
        confirm_time: bars[conf.bar_index].time,
        signal_index: i,
        signal_time: bars[i].time,
        wave_confirm_time: case.wave_confirm_index.map(|w| bars[w].time),
        result: SignalResult::Open,
        pnl_r: 0.0,
    });
    *active = Some(signals.len() - 1);
}

/// Resolve an open signal against one later bar. Stop first.
fn resolve_on_bar(signal: &mut Signal, bar: &Bar) -> bool {
    let (stop_hit, target_hit) = match signal.direction {
        Direction::Buy => (bar.low <= signal.stop, bar.high >= signal.target),
        Direction::Sell => (bar.high >= signal.stop, bar.low <= signal.target),
    };
    if stop_hit {
        signal.result = SignalResult::Sl;
        signal.pnl_r = -1.0;
        true
    } else if target_hit {
        signal.result = SignalResult::Tp;
        signal.pnl_r = signal.planned_rr();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bar_at, bars_from_hl};

    /// Hand-built BUY setup for pivot_len = 2 with filters off.
    ///
    /// Swing high 110 at bar 2, swing low 100 at bar 5, swing high 115 at
    /// bar 9 (breaks 110). Wave 1 crosses 110 at bar 7, peaks at bar 9 and
    /// ends at bar 10. Bar 13 closes above the wave-1 peak.
    fn buy_setup() -> Vec<Bar> {
        vec![
            bar_at(0, 104.0, 105.0, 103.0, 104.0),
            bar_at(1, 104.0, 107.0, 103.5, 106.0),
            bar_at(2, 106.0, 110.0, 105.0, 108.0), // SH 110
            bar_at(3, 108.0, 108.5, 103.0, 104.0),
            bar_at(4, 104.0, 105.0, 101.0, 102.0),
            bar_at(5, 102.0, 103.0, 100.0, 102.5), // SL 100
            bar_at(6, 102.5, 106.0, 101.0, 105.5),
            bar_at(7, 105.5, 112.0, 105.0, 111.5), // first close > 110
            bar_at(8, 111.5, 114.0, 111.0, 113.5),
            bar_at(9, 113.5, 115.0, 113.0, 114.5), // SH 115
            bar_at(10, 114.5, 114.8, 112.0, 112.5), // down close, wave 1 ends
            bar_at(11, 112.5, 113.0, 111.5, 112.0), // visible at 11
            bar_at(12, 112.0, 114.0, 111.8, 113.8),
            bar_at(13, 113.8, 118.0, 113.5, 117.0), // close > 115: confirm
            bar_at(14, 117.0, 119.0, 116.5, 118.5),
            bar_at(15, 118.5, 120.0, 118.0, 119.5),
        ]
    }

    fn no_filters() -> DetectorConfig {
        DetectorConfig {
            pivot_len: 2,
            impulse_mult: 0.0,
            break_mult: 0.0,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn emits_buy_on_close_above_wave1() {
        let bars = buy_setup();
        let detection = run_detection(&bars, &no_filters());
        assert_eq!(detection.breaks.len(), 1);
        assert_eq!(detection.breaks[0].bar_index, 11);

        let signals = &detection.signals;
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.direction, Direction::Buy);
        assert_eq!(s.entry, 110.0);
        assert_eq!(s.stop, 100.0);
        assert_eq!(s.target, 118.0);
        assert_eq!(s.wave1_extreme, 115.0);
        assert_eq!(s.break_index, 2);
        assert_eq!(s.confirm_index, 13);
        assert_eq!(s.signal_index, 13);
        assert_eq!(s.confirm_time, bars[13].time);
    }

    #[test]
    fn late_break_confirms_by_replay() {
        let mut bars = buy_setup();
        // Wave 1 ends on bar 8 at 112.5; bar 9 closes above it, two bars
        // before the break becomes visible.
        bars[8] = bar_at(8, 111.5, 112.5, 110.5, 111.0);
        let signals = detect_signals(&bars, &no_filters());
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.wave1_extreme, 112.5);
        assert_eq!(s.confirm_index, 9);
        assert_eq!(s.signal_index, 11);
        assert_eq!(s.target, 115.0);
        assert_eq!(s.signal_time, bars[11].time);
    }

    #[test]
    fn fixed_rr_and_buffer() {
        let bars = buy_setup();
        let config = DetectorConfig {
            target: TargetMode::FixedRr { ratio: 2.0 },
            sl_buffer_pct: 0.01,
            ..no_filters()
        };
        let s = &detect_signals(&bars, &config)[0];
        assert!((s.stop - 98.9).abs() < 1e-9);
        assert!((s.target - (110.0 + 2.0 * 11.1)).abs() < 1e-9);
        assert!((s.planned_rr() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn structure_floor_takes_farther_target() {
        let bars = buy_setup();
        let near = DetectorConfig {
            target: TargetMode::StructureFloor { ratio: 0.5 },
            ..no_filters()
        };
        assert_eq!(detect_signals(&bars, &near)[0].target, 118.0);
        let far = DetectorConfig {
            target: TargetMode::StructureFloor { ratio: 2.0 },
            ..no_filters()
        };
        assert_eq!(detect_signals(&bars, &far)[0].target, 130.0);
    }

    #[test]
    fn wave1_targets() {
        let bars = buy_setup();
        let peak = DetectorConfig {
            target: TargetMode::Wave1Peak,
            ..no_filters()
        };
        let s = &detect_signals(&bars, &peak)[0];
        assert_eq!(s.target, 115.0);
        assert!((s.planned_rr() - 0.5).abs() < 1e-9);

        let near = DetectorConfig {
            target: TargetMode::Wave1Floor { ratio: 0.3 },
            ..no_filters()
        };
        assert_eq!(detect_signals(&bars, &near)[0].target, 115.0);
        let far = DetectorConfig {
            target: TargetMode::Wave1Floor { ratio: 2.0 },
            ..no_filters()
        };
        assert_eq!(detect_signals(&bars, &far)[0].target, 130.0);
    }

    #[test]
    fn min_rr_suppresses() {
        let bars = buy_setup();
        let config = DetectorConfig {
            min_rr: 1.0,
            ..no_filters()
        };
        // planned R:R is 0.8
        assert!(detect_signals(&bars, &config).is_empty());
    }

    #[test]
    fn stop_touch_invalidates() {
        let mut bars = buy_setup();
        bars[12] = bar_at(12, 112.0, 112.5, 99.5, 111.0);
        assert!(detect_signals(&bars, &no_filters()).is_empty());
    }

    #[test]
    fn in_pass_tracking_resolves_tp() {
        let mut bars = buy_setup();
        bars.push(bar_at(16, 119.5, 121.0, 119.0, 120.0));
        let config = DetectorConfig {
            target: TargetMode::FixedRr { ratio: 1.0 },
            ..no_filters()
        };
        let s = &detect_signals(&bars, &config)[0];
        assert_eq!(s.target, 120.0);
        assert_eq!(s.result, SignalResult::Tp);
        assert!((s.pnl_r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn structure_target_is_not_hit_on_its_own_bar() {
        let bars = buy_setup();
        let s = &detect_signals(&bars, &no_filters())[0];
        // Bar 14 reaches 119 > 118, so TP resolves on the following bar.
        assert_eq!(s.result, SignalResult::Tp);
        let mut short = bars.clone();
        short.truncate(14);
        assert_eq!(detect_signals(&short, &no_filters())[0].result, SignalResult::Open);
    }

    #[test]
    fn too_few_bars_or_swings_yields_nothing() {
        let bars = buy_setup();
        assert!(detect_signals(&bars[..4], &no_filters()).is_empty());
        let zero = DetectorConfig {
            pivot_len: 0,
            ..no_filters()
        };
        assert!(detect_signals(&bars, &zero).is_empty());

        let flat = bars_from_hl(&[10.0; 30], &[9.0; 30]);
        assert!(run_detection(&flat, &no_filters()).signals.is_empty());
    }

    #[test]
    fn impulse_filter_rejects_weak_break() {
        let bars = buy_setup();
        let strict = DetectorConfig {
            impulse_mult: 10.0,
            ..no_filters()
        };
        assert!(detect_breaks(&bars, &strict).is_empty());
        assert_eq!(detect_breaks(&bars, &no_filters()).len(), 1);
    }

    /// `buy_setup` through bar 12, then two mini-waves peaking at 114.5 and
    /// 116.5. The second ends on bar 15 and arms the retest of 110.
    fn retest_setup(tail: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let mut bars = buy_setup();
        bars.truncate(13);
        let waves = [
            (113.8, 114.5, 112.5, 113.0),
            (113.0, 116.0, 112.8, 115.8),
            (115.8, 116.5, 114.0, 114.5),
        ];
        for &(o, h, l, c) in waves.iter().chain(tail) {
            bars.push(bar_at(bars.len(), o, h, l, c));
        }
        bars
    }

    fn wave_retest(target: TargetMode) -> DetectorConfig {
        DetectorConfig {
            variant: Variant::WaveRetest,
            target,
            ..no_filters()
        }
    }

    #[test]
    fn wave_retest_confirms_on_touch_of_break_level() {
        let bars = retest_setup(&[
            (114.5, 115.0, 113.0, 113.5),
            (113.5, 114.0, 112.8, 113.2),
            (113.2, 113.5, 109.5, 110.5), // retest of 110
            (110.5, 111.0, 109.0, 110.8),
        ]);
        let detection = run_detection(&bars, &wave_retest(TargetMode::FixedRr { ratio: 2.0 }));

        let up: Vec<usize> = detection.breaks.iter().map(|b| b.bar_index).collect();
        assert_eq!(up, vec![11, 17]);
        assert_eq!(detection.signals.len(), 1);
        let s = &detection.signals[0];
        assert_eq!(s.direction, Direction::Buy);
        assert_eq!(s.entry, 110.0);
        assert_eq!(s.stop, 100.0);
        assert_eq!(s.target, 130.0);
        assert_eq!(s.confirm_index, 18);
        assert_eq!(s.wave_confirm_time, Some(bars[15].time));
        assert_eq!(s.result, SignalResult::Open);
    }

    #[test]
    fn retest_case_survives_same_direction_break() {
        // The 116.5 high breaks 115 on bar 17. A replacing case would enter
        // at 115 with its stop at 111.5, which bar 18 then touches.
        let bars = retest_setup(&[
            (114.5, 115.0, 113.0, 113.5),
            (113.5, 114.0, 112.8, 113.2),
            (113.2, 113.5, 109.5, 110.5),
        ]);
        let signals = detect_signals(&bars, &wave_retest(TargetMode::FixedRr { ratio: 2.0 }));
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].entry, 110.0);
    }

    #[test]
    fn opposite_break_replaces_retest_case() {
        // Lower low 111.0 (bar 17) under 111.5 breaks down on bar 19, above
        // the 110 level the BUY case is waiting for. Bar 20 then touches 110.
        let bars = retest_setup(&[
            (114.5, 115.0, 112.5, 113.0),
            (113.0, 113.2, 111.0, 111.2),
            (111.2, 112.5, 111.1, 112.3),
            (112.3, 113.0, 111.8, 112.8),
            (112.8, 113.0, 109.5, 110.0),
            (110.0, 110.5, 109.0, 109.8),
        ]);
        let detection = run_detection(&bars, &wave_retest(TargetMode::FixedRr { ratio: 2.0 }));
        assert!(detection
            .breaks
            .iter()
            .any(|b| b.direction == Direction::Sell && b.bar_index == 19));
        assert!(detection.signals.is_empty());
    }

    #[test]
    fn retest_gap_through_entry_is_skipped() {
        // Bar 16 gaps below 110 and never trades back above it, so its high
        // sits under entry.
        let bars = retest_setup(&[
            (109.0, 109.5, 105.0, 106.0),
            (106.0, 107.0, 104.0, 106.5),
            (106.5, 109.6, 106.0, 109.0),
            (109.0, 109.2, 108.0, 108.5),
        ]);
        assert!(detect_signals(&bars, &wave_retest(TargetMode::StructureConfirm)).is_empty());

        let fixed = detect_signals(&bars, &wave_retest(TargetMode::FixedRr { ratio: 2.0 }));
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].confirm_index, 16);
        assert!(fixed[0].target > fixed[0].entry);
    }

    #[test]
    fn new_signal_closes_open_one_as_reverse() {
        let mut bars = buy_setup();
        for (o, h, l, c) in [
            (119.5, 119.8, 117.0, 117.5),
            (117.5, 118.0, 116.0, 116.5),
            (116.5, 119.0, 116.2, 118.8),
            (118.8, 122.0, 118.5, 121.5), // close > 120: second BUY
            (121.5, 123.0, 121.0, 122.5),
        ] {
            bars.push(bar_at(bars.len(), o, h, l, c));
        }
        let config = DetectorConfig {
            target: TargetMode::FixedRr { ratio: 5.0 },
            ..no_filters()
        };
        let signals = detect_signals(&bars, &config);
        assert_eq!(signals.len(), 2);

        let first = &signals[0];
        assert_eq!(first.result, SignalResult::CloseReverse);
        // (121.5 - 110) / 10
        assert!((first.pnl_r - 1.15).abs() < 1e-9);

        let second = &signals[1];
        assert_eq!(second.entry, 115.0);
        assert_eq!(second.stop, 111.5);
        assert_eq!(second.signal_index, 19);
        assert_eq!(second.result, SignalResult::Open);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DetectorConfig::wave_retest();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"mode\":\"fixed_rr\""));
        let back: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        let partial: DetectorConfig = serde_json::from_str(r#"{"pivot_len":3}"#).unwrap();
        assert_eq!(partial.pivot_len, 3);
        assert_eq!(partial.impulse_mult, 1.5);
    }
}
