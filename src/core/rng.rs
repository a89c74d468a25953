//! Deterministic Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. The fight session owns one
//! instance and lends it to every routine query, so randomized enemy
//! movement is reproduced exactly when a fight is replayed from the same
//! seed and inputs.

use serde::{Serialize, Deserialize};

/// Seeded Xorshift128+ generator.
///
/// ```
/// use bullet_hell::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_int_range(-100, 100), b.next_int_range(-100, 100));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state = [splitmix64(&mut s), splitmix64(&mut s)];

        // An all-zero state would only ever yield zeros
        if state == [0, 0] {
            return Self { state: [1, 1] };
        }
        Self { state }
    }

    /// Next raw 64-bit value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [s0, mut s1] = self.state;
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state = [s0.rotate_left(24) ^ s1 ^ (s1 << 16), s1.rotate_left(37)];

        result
    }

    /// Integer in `[min, max]`, both ends inclusive.
    ///
    /// Returns `min` when `max <= min`.
    #[inline]
    pub fn next_int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max.abs_diff(min).saturating_add(1);
        min.wrapping_add((self.next_u64() % span) as i64)
    }

    /// Internal state, for hashing.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
