// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// This is a hand-rolled implementation (no PRNG crate dependency), so
// the same seed yields the same stream on every platform.
//
// This crate is the single PRNG used across Versewright: `versewright_music`
// draws root pitches, tempo defaults, contour jitter and pitch-contour noise
// from it. A generation call owns exactly one `SongRng`, seeded once; units
// of work that run in parallel (per-line contour generation) get their own
// sub-stream via `SongRng::substream`, so output does not depend on thread
// scheduling.
//
// **Critical constraint: determinism.** The integer core (`next_u64` and the
// range helpers) must produce identical output given the same prior state.
// Floating-point helpers (`next_f64`, `next_gaussian`) are derived from that
// core and are reproducible on a given platform.

use serde::{Deserialize, Serialize};

/// Golden-ratio increment used by SplitMix64 and for stream separation.
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Xoshiro256++ PRNG, the composition engine's sole source of randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `SongRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive the `index`-th independent stream from a base seed.
    ///
    /// Pure function of `(seed, index)`: parallel workers can each build
    /// their own generator without touching shared state.
    pub fn substream(seed: u64, index: u64) -> Self {
        let mut sm = seed ^ index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
        Self::new(splitmix64(&mut sm))
    }

    /// Split off a child generator, advancing this one by a single draw.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1).
    ///
    /// Uses the upper 53 bits of a `u64` to fill the mantissa of an f64.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        // Rejection sampling to avoid modulo bias.
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `u32` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        self.range_u64(u64::from(low), u64::from(high)) as u32
    }

    /// Pick one element uniformly. Returns `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        items.get(idx)
    }

    /// Pick an index with probability proportional to its integer weight.
    ///
    /// Returns `None` if `weights` is empty or every weight is zero.
    /// Integer weights keep the draw on the deterministic integer core.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return None;
        }
        let mut r = self.range_u64(0, total);
        for (i, &w) in weights.iter().enumerate() {
            let w = u64::from(w);
            if r < w {
                return Some(i);
            }
            r -= w;
        }
        None
    }

    /// Sample a normal distribution via the Box–Muller transform.
    ///
    /// A `std_dev` of zero returns `mean` exactly (one draw pair is still
    /// consumed so stream positions do not depend on the parameter).
    pub fn next_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - [0, 1) lies in (0, 1], keeping ln() finite.
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + z * std_dev
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
///
/// This is the standard recommendation from the xoshiro authors for
/// expanding a small seed into a larger state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(GOLDEN_GAMMA);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(43);
        // Extremely unlikely to collide on the first value.
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = SongRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_u64_within_bounds() {
        let mut rng = SongRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
        }
    }

    #[test]
    fn range_u32_within_bounds() {
        let mut rng = SongRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_u32(100, 140);
            assert!((100..140).contains(&v), "range_u32 out of range: {v}");
        }
    }

    #[test]
    fn substreams_are_pure_and_distinct() {
        let mut a = SongRng::substream(7, 3);
        let mut b = SongRng::substream(7, 3);
        let mut c = SongRng::substream(7, 4);
        let a1 = a.next_u64();
        assert_eq!(a1, b.next_u64());
        assert_ne!(a1, c.next_u64());
    }

    #[test]
    fn fork_advances_parent_once() {
        let mut parent = SongRng::new(9);
        let mut reference = SongRng::new(9);
        let _child = parent.fork();
        reference.next_u64();
        assert_eq!(parent.next_u64(), reference.next_u64());
    }

    #[test]
    fn choose_covers_all_items_and_handles_empty() {
        let mut rng = SongRng::new(1);
        let items = [60, 62, 64, 67];
        let mut seen = [false; 4];
        for _ in 0..1000 {
            let v = *rng.choose(&items).unwrap();
            let idx = items.iter().position(|&x| x == v).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s), "every candidate should be drawn");
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn weighted_index_follows_weights() {
        let mut rng = SongRng::new(2024);
        let weights = [20, 60, 20];
        let mut counts = [0usize; 3];
        let n = 20_000;
        for _ in 0..n {
            counts[rng.weighted_index(&weights).unwrap()] += 1;
        }
        let middle = counts[1] as f64 / n as f64;
        assert!(
            (0.55..0.65).contains(&middle),
            "middle weight should be ~60%, got {:.1}%",
            middle * 100.0
        );
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
        assert_eq!(rng.weighted_index(&[0, 5]), Some(1));
    }

    #[test]
    fn gaussian_moments_are_plausible() {
        let mut rng = SongRng::new(31337);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.next_gaussian(0.0, 2.0)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.1, "mean should be ~0, got {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std dev should be ~2, got {}", var.sqrt());
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn gaussian_zero_std_dev_returns_mean() {
        let mut rng = SongRng::new(5);
        assert_eq!(rng.next_gaussian(440.0, 0.0), 440.0);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = SongRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SongRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
