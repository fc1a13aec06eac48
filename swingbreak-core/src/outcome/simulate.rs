//! Forward scan shared by every exit policy.

use tracing::debug;

use super::{ExitPolicy, ExitReason, LegOutcome, TradeOutcome};
use crate::domain::{Bar, Direction, Signal};
use crate::engine::confirmation::{reaches, touches};

/// Resolve every signal under `policy`. Signals with non-positive risk are
/// skipped.
pub fn simulate(bars: &[Bar], signals: &[Signal], policy: ExitPolicy) -> Vec<TradeOutcome> {
    (0..signals.len())
        .filter_map(|k| simulate_one(bars, signals, k, policy))
        .collect()
}

/// Resolve `signals[k]`. The full list is needed because a partial exit's
/// runner closes on the next opposite signal.
pub fn simulate_one(
    bars: &[Bar],
    signals: &[Signal],
    k: usize,
    policy: ExitPolicy,
) -> Option<TradeOutcome> {
    let signal = signals.get(k)?;
    let risk = signal.risk();
    if risk.is_nan() || risk <= 0.0 {
        debug!(signal = k, risk, "skipping signal with non-positive risk");
        return None;
    }
    let start = signal.signal_index + 1;

    let (exit, target, planned_rr) = match policy {
        ExitPolicy::Full => (
            scan_full(bars, signal, start),
            signal.target,
            signal.planned_rr(),
        ),
        ExitPolicy::Partial => {
            let opposite = signals[k + 1..]
                .iter()
                .find(|o| o.direction != signal.direction)
                .map(|o| o.signal_index);
            (
                scan_partial(bars, signal, start, opposite),
                signal.target,
                signal.planned_rr(),
            )
        }
        ExitPolicy::Trailing { lock_r, step_r } => (
            scan_trailing(bars, signal, start, lock_r, step_r),
            signal.target,
            signal.planned_rr(),
        ),
        ExitPolicy::Breakeven {
            trigger_r,
            target_r,
        } => {
            let target = signal.entry + signal.direction.sign() * target_r * risk;
            (
                scan_breakeven(bars, signal, start, trigger_r, target),
                target,
                target_r,
            )
        }
    };

    let last = bars.len().saturating_sub(1);
    Some(TradeOutcome {
        signal: k,
        direction: signal.direction,
        entry: signal.entry,
        stop: signal.stop,
        target,
        planned_rr,
        break_index: signal.break_index,
        confirm_index: signal.confirm_index,
        signal_index: signal.signal_index,
        signal_time: signal.signal_time,
        reason: exit.reason,
        exit_index: exit.index,
        exit_time: exit.index.and_then(|i| bars.get(i)).map(|b| b.time),
        exit_price: exit.price,
        pnl_r: exit.pnl_r,
        bars_held: exit.index.unwrap_or(last).saturating_sub(signal.signal_index),
        legs: exit.legs,
    })
}

struct Exit {
    reason: ExitReason,
    index: Option<usize>,
    price: f64,
    pnl_r: f64,
    legs: Vec<LegOutcome>,
}

impl Exit {
    fn at(reason: ExitReason, index: usize, price: f64, pnl_r: f64) -> Self {
        Self {
            reason,
            index: Some(index),
            price,
            pnl_r,
            legs: Vec::new(),
        }
    }

    fn open(bars: &[Bar], signal: &Signal) -> Self {
        let price = bars.last().map_or(signal.entry, |b| b.close);
        Self {
            reason: ExitReason::Open,
            index: None,
            price,
            pnl_r: signal.r_at(price),
            legs: Vec::new(),
        }
    }

    fn leg(&self) -> LegOutcome {
        LegOutcome {
            reason: self.reason,
            exit_index: self.index,
            exit_price: self.price,
            pnl_r: self.pnl_r,
        }
    }
}

fn scan_full(bars: &[Bar], signal: &Signal, start: usize) -> Exit {
    let dir = signal.direction;
    for (j, bar) in bars.iter().enumerate().skip(start) {
        if touches(dir, bar, signal.stop) {
            return Exit::at(ExitReason::Sl, j, signal.stop, -1.0);
        }
        if reaches(dir, bar, signal.target) {
            return Exit::at(ExitReason::Tp, j, signal.target, signal.planned_rr());
        }
    }
    Exit::open(bars, signal)
}

fn scan_partial(bars: &[Bar], signal: &Signal, start: usize, opposite: Option<usize>) -> Exit {
    let dir = signal.direction;
    let mut first: Option<Exit> = None;
    let mut runner: Option<Exit> = None;

    for (j, bar) in bars.iter().enumerate().skip(start) {
        if first.is_none() {
            if touches(dir, bar, signal.stop) {
                first = Some(Exit::at(ExitReason::Sl, j, signal.stop, -1.0));
                runner = Some(Exit::at(ExitReason::Sl, j, signal.stop, -1.0));
                break;
            }
            if reaches(dir, bar, signal.target) {
                first = Some(Exit::at(ExitReason::Tp, j, signal.target, signal.planned_rr()));
            }
        }
        if first.is_some() {
            if touches(dir, bar, signal.entry) {
                runner = Some(Exit::at(ExitReason::Breakeven, j, signal.entry, 0.0));
                break;
            }
            if opposite.is_some_and(|o| j >= o) {
                runner = Some(Exit::at(
                    ExitReason::Opposite,
                    j,
                    bar.close,
                    signal.r_at(bar.close),
                ));
                break;
            }
        }
    }

    let first = first.unwrap_or_else(|| Exit::open(bars, signal));
    let runner = runner.unwrap_or_else(|| Exit::open(bars, signal));
    let legs = vec![first.leg(), runner.leg()];
    let reason = if first.reason == ExitReason::Open || runner.reason == ExitReason::Open {
        ExitReason::Open
    } else {
        runner.reason
    };
    Exit {
        reason,
        index: if reason == ExitReason::Open {
            None
        } else {
            runner.index
        },
        price: runner.price,
        pnl_r: (first.pnl_r + runner.pnl_r) / 2.0,
        legs,
    }
}

fn scan_trailing(bars: &[Bar], signal: &Signal, start: usize, lock_r: f64, step_r: f64) -> Exit {
    let dir = signal.direction;
    let sign = dir.sign();
    let risk = signal.risk();
    let mut stop = signal.stop;
    let mut best_r = 0.0_f64;

    for (j, bar) in bars.iter().enumerate().skip(start) {
        if touches(dir, bar, stop) {
            return if stop == signal.stop {
                Exit::at(ExitReason::Sl, j, stop, -1.0)
            } else {
                Exit::at(ExitReason::Trail, j, stop, (stop - signal.entry) * sign / risk)
            };
        }
        let extreme = match dir {
            Direction::Buy => bar.high,
            Direction::Sell => bar.low,
        };
        best_r = best_r.max(signal.r_at(extreme));
        if best_r >= lock_r {
            let trailed = signal.entry + sign * (best_r - step_r) * risk;
            if (trailed - stop) * sign > 0.0 {
                stop = trailed;
            }
        }
    }
    Exit::open(bars, signal)
}

fn scan_breakeven(
    bars: &[Bar],
    signal: &Signal,
    start: usize,
    trigger_r: f64,
    target: f64,
) -> Exit {
    let dir = signal.direction;
    let trigger = signal.entry + dir.sign() * trigger_r * signal.risk();
    let target_r = signal.r_at(target);
    let mut moved = false;

    for (j, bar) in bars.iter().enumerate().skip(start) {
        if !moved && reaches(dir, bar, trigger) {
            moved = true;
        }
        let stop = if moved { signal.entry } else { signal.stop };
        if touches(dir, bar, stop) {
            return if moved {
                Exit::at(ExitReason::Breakeven, j, stop, 0.0)
            } else {
                Exit::at(ExitReason::Sl, j, stop, -1.0)
            };
        }
        if reaches(dir, bar, target) {
            return Exit::at(ExitReason::Tp, j, target, target_r);
        }
    }
    Exit::open(bars, signal)
}
