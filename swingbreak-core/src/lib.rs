//! Swingbreak Core: swing-break-confirm-retest signal engine and its data layer.
//!
//! This crate contains:
//! - Domain types (bars, swing points, signals)
//! - Pivot detection, causal swing tracking and break classification
//! - The confirmation state machine and single-pass detector
//! - Trade outcome simulation under several exit policies
//! - Higher-timeframe trend filter and resampling
//! - Data access: CSV snapshots, market-data provider, synthetic series

pub mod data;
pub mod domain;
pub mod engine;
pub mod filters;
pub mod indicators;
pub mod outcome;
pub mod structure;
pub mod timeframe;

pub use domain::{Bar, BarSeries, Direction, Signal, SignalResult, SwingPoint};
pub use engine::{detect_signals, run_detection, DetectorConfig, TargetMode, Variant};


#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across sweep workers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::SwingPoint>();
        require_sync::<domain::SwingPoint>();

        require_send::<engine::DetectorConfig>();
        require_sync::<engine::DetectorConfig>();
        require_send::<engine::Detection>();
        require_sync::<engine::Detection>();
        require_send::<engine::PendingCase>();
        require_sync::<engine::PendingCase>();

        require_send::<outcome::ExitPolicy>();
        require_sync::<outcome::ExitPolicy>();
        require_send::<outcome::TradeOutcome>();
        require_sync::<outcome::TradeOutcome>();

        require_send::<filters::HtfFilter>();
        require_sync::<filters::HtfFilter>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    #[test]
    fn synthetic_series_runs_through_detector() {
        let series = data::synthetic_series("TEST", 2_000, 7);
        let config = DetectorConfig {
            impulse_mult: 0.0,
            break_mult: 0.0,
            ..DetectorConfig::default()
        };
        let detection = run_detection(series.bars(), &config);
        assert!(!detection.swings.is_empty());
        let open = detection.signals.iter().filter(|s| s.is_open()).count();
        assert!(open <= 1);
    }
}
