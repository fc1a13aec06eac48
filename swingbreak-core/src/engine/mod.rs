//! Signal engine: the confirmation state machine and the single-pass driver.

pub mod confirmation;
pub mod detector;

pub use confirmation::{
    locate_wave1, replay, step, Confirmation, Invalidation, PendingCase, Phase, Step, Variant,
    Wave1, WaveCounter,
};
pub use detector::{detect_breaks, detect_signals, run_detection, Detection, DetectorConfig, TargetMode};
