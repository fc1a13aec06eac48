//! Average True Range as a simple rolling mean of true range.

use crate::domain::Bar;

/// TR[0] = high - low; TR[t] = max(high-low, |high-prev_close|, |low-prev_close|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(pc) => range.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
                None => range,
            }
        })
        .collect()
}

/// Rolling mean of true range over `period` bars. NaN for the first
/// `period - 1` bars.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let tr = true_range(bars);
    let n = tr.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = tr[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += tr[i] - tr[i - period];
        result[i] = sum / period as f64;
    }
    result
}
