//! Deterministic, portable pseudo-random number generation.
//!
//! `SeededRandom` is a mulberry32 generator keyed by a 32-bit seed. String
//! seeds are first folded to 32 bits with an xmur3-style avalanche hash over
//! UTF-16 code units. Everything is wrapping `u32` arithmetic, so the output
//! stream is identical on every platform and build profile.
//!
//! There is no shared generator anywhere in the workspace. Every call site
//! constructs its own instance from an explicit seed, which keeps results
//! independent of call order elsewhere in the process.

use serde::{Deserialize, Serialize};

/// Mulberry32 PRNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Creates a generator from a string seed.
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_seed_u32(hash_seed_str(seed))
    }

    /// Creates a generator from an integer seed.
    #[must_use]
    pub const fn from_seed_u32(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform integer in `[min, max]`, inclusive on both ends.
    ///
    /// Reversed bounds are swapped.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        // The full i64 range spans 2^64 values, so widen before subtracting.
        let span = i128::from(hi) - i128::from(lo) + 1;
        let offset = (self.next_f64() * span as f64).floor() as i128;
        (i128::from(lo) + offset).min(i128::from(hi)) as i64
    }

    /// Picks one element, or `None` for an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = (self.next_f64() * items.len() as f64).floor() as usize;
        items.get(index.min(items.len() - 1))
    }

    /// Returns a shuffled copy (Fisher–Yates, walking from the back).
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            out.swap(i, j.min(i));
        }
        out
    }
}

/// Folds a string into a 32-bit seed with good avalanche behaviour.
#[must_use]
pub fn hash_seed_str(seed: &str) -> u32 {
    let units: Vec<u16> = seed.encode_utf16().collect();
    let mut h = 1_779_033_703u32 ^ units.len() as u32;
    for unit in units {
        h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}
