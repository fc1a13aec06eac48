//! Market structure: pivot detection, rolling swing state, break classification.
//!
//! These three stages run once per bar inside the detector, in this order:
//! the swing tracker absorbs pivots whose lookahead window just closed, then
//! the classifier decides whether the newest swing broke structure.

pub mod breaks;
pub mod pivots;
pub mod swing_state;

pub use breaks::{classify, BreakEvent, BreakFilters, Breaks, BODY_WINDOW};
pub use pivots::{find_swings, PivotTies};
pub use swing_state::{SwingState, SwingTracker, SwingUpdate};
