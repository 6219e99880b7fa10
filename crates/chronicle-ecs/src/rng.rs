//! Deterministic, seedable, forkable pseudo-random number generation.
//!
//! The simulation core never touches a global or thread-local RNG: every
//! consumer (the cascade engine, domain systems, noise sampling) is handed
//! its own [`SimRng`] descended from a single seed, so that two runs
//! constructed with the same seed produce byte-identical event chains.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

// ---------------------------------------------------------------------------
// SimRng
// ---------------------------------------------------------------------------

/// A deterministic PRNG wrapper used throughout the simulation core.
///
/// Backed by a PCG32 generator (`rand_pcg`), chosen for its small state,
/// good statistical quality, and stable output across platforms -- all
/// properties the cascade engine's determinism guarantees depend on.
#[derive(Clone)]
pub struct SimRng {
    inner: Pcg32,
}

impl SimRng {
    /// Create a generator seeded deterministically from a 64-bit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Draw a uniform value in `[0, 1)`.
    ///
    /// This is the shape the cascade engine's `RandomFn` expects; see
    /// [`crate::rng::SimRng::as_random_fn`].
    pub fn next_f64(&mut self) -> f64 {
        // Use the top 53 bits of a u64 draw for full f64 mantissa precision.
        let bits = self.inner.next_u64() >> 11;
        (bits as f64) * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw `u64`.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Spawn an independent child generator, deterministically derived from
    /// this one's current state. Advances `self` exactly once.
    ///
    /// Forking is how the core hands each domain system (or each snapshot
    /// branch) its own stream without introducing shared mutable RNG state.
    pub fn fork(&mut self) -> Self {
        let child_seed = self.inner.next_u64();
        Self::from_seed(child_seed)
    }

    /// Wrap this generator as a boxed closure matching the cascade engine's
    /// injectable `RandomFn: () -> [0,1)` contract.
    pub fn as_random_fn(mut self) -> impl FnMut() -> f64 {
        move || self.next_f64()
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Simplex noise
// ---------------------------------------------------------------------------

/// 2D simplex noise sampler, seeded independently of [`SimRng`]'s event
/// stream so that terrain/heightmap-style sampling never perturbs the
/// cascade engine's random draws.
///
/// The gradient table is a deterministic permutation of a fixed base table,
/// shuffled by a seeded [`SimRng`] at construction -- not touched again
/// afterwards, so repeated `sample` calls are a pure function of `(x, y)`.
#[derive(Clone)]
pub struct SimplexNoise2D {
    perm: [u8; 512],
}

const GRAD2: [(f64, f64); 8] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

impl SimplexNoise2D {
    /// Build a noise sampler from a seed, independent of any other RNG
    /// stream in use.
    pub fn from_seed(seed: u64) -> Self {
        let mut base: [u8; 256] = [0; 256];
        for (i, slot) in base.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut rng = SimRng::from_seed(seed);
        // Fisher-Yates shuffle using the seeded stream.
        for i in (1..256).rev() {
            let j = (rng.next_u64() % (i as u64 + 1)) as usize;
            base.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = base[i % 256];
        }
        Self { perm }
    }

    fn grad(&self, hash: u8) -> (f64, f64) {
        GRAD2[(hash % 8) as usize]
    }

    /// Sample noise at `(x, y)`. Output is in roughly `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        const F2: f64 = 0.366_025_403_784_438_6; // (sqrt(3) - 1) / 2
        const G2: f64 = 0.211_324_865_405_187_1; // (3 - sqrt(3)) / 6

        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0_origin = i - t;
        let y0_origin = j - t;
        let x0 = x - x0_origin;
        let y0 = y - y0_origin;

        let (i1, j1) = if x0 > y0 { (1.0, 0.0) } else { (0.0, 1.0) };

        let x1 = x0 - i1 + G2;
        let y1 = y0 - j1 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;

        let mut total = 0.0;
        for (dx, dy, dii, djj) in [
            (x0, y0, 0usize, 0usize),
            (x1, y1, i1 as usize, j1 as usize),
            (x2, y2, 1usize, 1usize),
        ] {
            let t = 0.5 - dx * dx - dy * dy;
            if t > 0.0 {
                let gi = self.perm[(ii + dii + self.perm[(jj + djj) % 512] as usize) % 512];
                let (gx, gy) = self.grad(gi);
                let t2 = t * t;
                total += t2 * t2 * (gx * dx + gy * dy);
            }
        }
        70.0 * total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::from_seed(42);
        let mut b = SimRng::from_seed(42);
        for _ in 0..50 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimRng::from_seed(1);
        let mut b = SimRng::from_seed(2);
        let seq_a: Vec<u64> = (0..10).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..10).map(|_| b.next_u64()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn next_f64_in_unit_range() {
        let mut rng = SimRng::from_seed(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn fork_produces_independent_deterministic_stream() {
        let mut parent_a = SimRng::from_seed(99);
        let mut parent_b = SimRng::from_seed(99);
        let mut child_a = parent_a.fork();
        let mut child_b = parent_b.fork();
        // Forked children from identically-seeded parents are identical.
        for _ in 0..20 {
            assert_eq!(child_a.next_u64(), child_b.next_u64());
        }
        // The parents themselves advanced identically and remain in sync.
        assert_eq!(parent_a.next_u64(), parent_b.next_u64());
    }

    #[test]
    fn simplex_noise_deterministic_and_bounded() {
        let noise = SimplexNoise2D::from_seed(5);
        let a = noise.sample(1.23, 4.56);
        let b = noise.sample(1.23, 4.56);
        assert_eq!(a, b);
        assert!(a.abs() <= 1.5);
    }

    #[test]
    fn simplex_noise_varies_across_space() {
        let noise = SimplexNoise2D::from_seed(5);
        let samples: Vec<f64> = (0..20).map(|i| noise.sample(i as f64 * 0.3, 0.0)).collect();
        let distinct = samples
            .windows(2)
            .filter(|w| (w[0] - w[1]).abs() > 1e-9)
            .count();
        assert!(distinct > 0);
    }
}
