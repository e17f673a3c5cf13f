//! Seeded, reproducible pseudo-randomness.
//!
//! The only probabilistic decision on the hot path is the priority queue's
//! overflow drop (spec §4.8). It must be reproducible given a fixed seed,
//! never drawn from wall-clock entropy, so we carry our own tiny xorshift64
//! generator instead of pulling in `rand`.

/// Minimal xorshift64* generator.
///
/// Not cryptographically secure, not meant to be: this exists purely to
/// make "drop this packet with probability p" reproducible across runs
/// given the same seed.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Create a generator from a non-zero seed (zero is remapped to a fixed
    /// non-zero constant, since xorshift is fixed-point at zero).
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9e3779b97f4a7c15 } else { seed },
        }
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Next value uniformly distributed in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        // Top 53 bits give a uniform double in [0, 1).
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
