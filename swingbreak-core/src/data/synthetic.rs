//! Deterministic synthetic price series for tests, benches and offline demos.
//!
//! A random walk whose drift flips between regimes, so the series forms swing
//! structure. The per-symbol seed is derived with BLAKE3, so the same
//! `(symbol, seed)` always yields the same bars.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BarSeries};

/// Derive the RNG seed for `symbol` from a master `seed`.
pub fn symbol_seed(symbol: &str, seed: u64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// `n` consecutive five-minute bars starting Monday 2024-01-01 00:00.
pub fn synthetic_series(symbol: &str, n: usize, seed: u64) -> BarSeries {
    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol, seed));
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    let mut drift = 0.0_f64;
    for i in 0..n {
        if i % 40 == 0 {
            drift = rng.gen_range(-0.15..0.15);
        }
        let open = price;
        let close = (open + drift + rng.gen_range(-0.5..0.5)).max(1.0);
        let high = open.max(close) + rng.gen_range(0.0..0.3);
        let low = (open.min(close) - rng.gen_range(0.0..0.3)).max(0.5);
        let mut bar = Bar::new(start + Duration::minutes(5 * i as i64), open, high, low, close);
        bar.volume = Some(rng.gen_range(100.0..1_000.0_f64).round());
        bars.push(bar);
        price = close;
    }
    BarSeries::new(symbol, bars)
}
