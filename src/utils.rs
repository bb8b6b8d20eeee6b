use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Base seed for every random source; scenarios set it per iteration
pub static RAND_SEED: AtomicU64 = AtomicU64::new(0);

/// When set, the auction engine writes one CSV line per auction to LogEvent::Auction
pub static VERBOSE_AUCTION: AtomicBool = AtomicBool::new(false);

/// Count of simulation runs since the last reset (reported by main)
pub static TOTAL_SIMULATION_RUNS: AtomicU64 = AtomicU64::new(0);

/// Derive a seed for one random source from the global RAND_SEED
/// Different salts give independent streams for the same iteration
pub fn get_seed(salt: u64) -> u64 {
    RAND_SEED.load(Ordering::Relaxed).wrapping_mul(1_000_003).wrapping_add(salt)
}

/// Round to two decimal places (cents)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to two decimals, stepping down a cent if nearest rounding went above `value`
/// Used where the rounded amount must stay within a cap
pub fn round2_not_above(value: f64) -> f64 {
    let rounded = round2(value);
    if rounded > value {
        round2(rounded - 0.01)
    } else {
        rounded
    }
}
