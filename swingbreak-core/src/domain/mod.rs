//! Domain types: bars, swing points, directions, signals.

pub mod bar;
pub mod signal;
pub mod swing;

pub use bar::{Bar, BarSeries};
pub use signal::{Direction, Signal, SignalResult};
pub use swing::{SwingKind, SwingLevel, SwingPoint};
