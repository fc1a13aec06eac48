//! Candle body statistics.

use crate::domain::Bar;

/// Mean `|close - open|` over the `window` bars ending at `end` (inclusive),
/// or fewer at the start of the series. Zero for an empty slice.
pub fn average_body(bars: &[Bar], end: usize, window: usize) -> f64 {
    if bars.is_empty() || window == 0 {
        return 0.0;
    }
    let end = end.min(bars.len() - 1);
    let start = (end + 1).saturating_sub(window);
    let slice = &bars[start..=end];
    slice.iter().map(Bar::body).sum::<f64>() / slice.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use crate::test_support::make_bars;

    #[test]
    fn uses_trailing_window() {
        // Bodies: 0, 1, 2, 3, 4 (open = previous close)
        let bars = make_bars(&[10.0, 11.0, 13.0, 16.0, 20.0]);
        assert_approx(average_body(&bars, 4, 2), 3.5, DEFAULT_EPSILON);
        assert_approx(average_body(&bars, 4, 20), 2.0, DEFAULT_EPSILON);
        assert_approx(average_body(&bars, 1, 20), 0.5, DEFAULT_EPSILON);
    }
}
