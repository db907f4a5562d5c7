//! Injectable randomness for side and amount selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RandomSource supplies the random draws of the booster.
pub trait RandomSource: Send {
    /// Returns true for a buy, false for a sell.
    fn choose_buy(&mut self) -> bool;

    /// Uniform draw from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Entropy-seeded source used in production.
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn choose_buy(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let (low, high) = if low > high { (high, low) } else { (low, high) };
        if high - low <= f64::EPSILON {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Source with forced draws.
///
/// `uniform` returns the fixed value clamped into the requested range, so a
/// single instance can drive both amount and delay draws.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    next_buy: bool,
    alternate: bool,
    value: f64,
}

impl FixedRandom {
    /// Always buys.
    pub fn buy(value: f64) -> Self {
        Self {
            next_buy: true,
            alternate: false,
            value,
        }
    }

    /// Always sells.
    pub fn sell(value: f64) -> Self {
        Self {
            next_buy: false,
            alternate: false,
            value,
        }
    }

    /// Buy, sell, buy, ...
    pub fn alternating(value: f64) -> Self {
        Self {
            next_buy: true,
            alternate: true,
            value,
        }
    }
}

impl RandomSource for FixedRandom {
    fn choose_buy(&mut self) -> bool {
        let buy = self.next_buy;
        if self.alternate {
            self.next_buy = !self.next_buy;
        }
        buy
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let (low, high) = if low > high { (high, low) } else { (low, high) };
        self.value.clamp(low, high)
    }
}
