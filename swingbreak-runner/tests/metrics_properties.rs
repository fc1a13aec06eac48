//! Property tests for R-multiple statistics and breakdowns.
//!
//! Uses proptest to verify:
//! 1. Wins and losses partition the non-breakeven closed trades
//! 2. Total R is the sum of closed pnl; open trades never contribute
//! 3. Drawdown is non-positive and no deeper than the sum of all losses
//! 4. Profit factor stays within [0, cap]
//! 5. Breakdown groups account for every closed trade

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use swingbreak_core::domain::{Bar, Direction};
use swingbreak_core::outcome::{ExitReason, TradeOutcome};
use swingbreak_runner::metrics::{max_drawdown_r, PROFIT_FACTOR_CAP};
use swingbreak_runner::{Breakdown, GroupStats, RMetrics};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_outcome() -> impl Strategy<Value = TradeOutcome> {
    (
        prop_oneof![Just(Direction::Buy), Just(Direction::Sell)],
        prop_oneof![
            Just(ExitReason::Tp),
            Just(ExitReason::Sl),
            Just(ExitReason::Breakeven),
            Just(ExitReason::Trail),
            Just(ExitReason::Open),
        ],
        -1.0..4.0_f64,
        20usize..300,
        0usize..15,
        0.3..6.0_f64,
    )
        .prop_map(|(direction, reason, pnl, confirm, wait, rr)| {
            let pnl_r = match reason {
                ExitReason::Sl => -1.0,
                ExitReason::Breakeven => 0.0,
                _ => pnl,
            };
            let time = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::minutes(5 * confirm as i64);
            TradeOutcome {
                signal: 0,
                direction,
                entry: 100.0,
                stop: 99.0,
                target: 100.0 + rr,
                planned_rr: rr,
                break_index: confirm.saturating_sub(wait),
                confirm_index: confirm,
                signal_index: confirm,
                signal_time: time,
                reason,
                exit_index: (reason != ExitReason::Open).then_some(confirm + 3),
                exit_time: (reason != ExitReason::Open).then(|| time + Duration::minutes(15)),
                exit_price: 100.0 + pnl_r,
                pnl_r,
                bars_held: 3,
                legs: Vec::new(),
            }
        })
}

fn bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let r = 0.5 + (i % 11) as f64 * 0.1;
            Bar::new(start + Duration::minutes(5 * i as i64), 100.0, 100.0 + r, 100.0 - r, 100.0)
        })
        .collect()
}

fn total(groups: &[GroupStats]) -> usize {
    groups.iter().map(|g| g.total).sum()
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn wins_and_losses_partition_closed(outcomes in prop::collection::vec(arb_outcome(), 0..60)) {
        let m = RMetrics::compute(&outcomes);
        let closed: Vec<f64> = outcomes.iter().filter(|o| o.is_closed()).map(|o| o.pnl_r).collect();
        let flat = closed.iter().filter(|r| **r == 0.0).count();

        prop_assert_eq!(m.trades, outcomes.len());
        prop_assert_eq!(m.closed + m.open, m.trades);
        prop_assert_eq!(m.wins + m.losses + flat, m.closed);
        prop_assert_eq!(m.buy.closed + m.sell.closed, m.closed);
        prop_assert_eq!(m.by_reason.values().sum::<usize>(), m.trades);
        prop_assert!(m.win_rate >= 0.0 && m.win_rate <= 1.0);
    }

    #[test]
    fn open_trades_never_move_totals(outcomes in prop::collection::vec(arb_outcome(), 0..60)) {
        let m = RMetrics::compute(&outcomes);
        let closed_sum: f64 = outcomes.iter().filter(|o| o.is_closed()).map(|o| o.pnl_r).sum();
        prop_assert!((m.total_r - closed_sum).abs() < 1e-9);

        let only_closed: Vec<TradeOutcome> =
            outcomes.iter().filter(|o| o.is_closed()).cloned().collect();
        let m2 = RMetrics::compute(&only_closed);
        prop_assert!((m2.total_r - m.total_r).abs() < 1e-9);
        prop_assert!((m2.max_drawdown_r - m.max_drawdown_r).abs() < 1e-9);
        prop_assert_eq!(m2.max_consecutive_losses, m.max_consecutive_losses);
    }

    #[test]
    fn drawdown_bounded(pnl in prop::collection::vec(-3.0..3.0_f64, 0..80)) {
        let dd = max_drawdown_r(&pnl);
        let total_loss: f64 = pnl.iter().filter(|r| **r < 0.0).sum();
        prop_assert!(dd <= 0.0);
        prop_assert!(dd >= total_loss - 1e-9);
    }

    #[test]
    fn profit_factor_within_cap(outcomes in prop::collection::vec(arb_outcome(), 0..60)) {
        let m = RMetrics::compute(&outcomes);
        prop_assert!(m.profit_factor >= 0.0);
        prop_assert!(m.profit_factor <= PROFIT_FACTOR_CAP);
    }

    #[test]
    fn breakdown_groups_cover_closed_trades(outcomes in prop::collection::vec(arb_outcome(), 0..60)) {
        let b = Breakdown::compute(&bars(400), &outcomes);
        let closed = outcomes.iter().filter(|o| o.is_closed()).count();

        prop_assert_eq!(total(&b.by_hour), closed);
        prop_assert_eq!(total(&b.by_session), closed);
        prop_assert_eq!(total(&b.by_weekday), closed);
        prop_assert_eq!(total(&b.by_direction), closed);
        prop_assert_eq!(total(&b.by_bars_to_confirm), closed);
        prop_assert_eq!(total(&b.by_planned_rr), closed);
        let atr = total(&b.by_atr_quartile);
        prop_assert!(atr == closed || atr == 0);
    }
}
