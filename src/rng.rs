//! Per-thread random number generation (spec §5/§9: "no process-wide RNG
//! singleton"). Each worker owns one `Rng`, seeded from `(thread_id,
//! base_seed)`, never shared.

use crate::core::geometry::{Onb, Vector3};
use crate::core::pbrt::{Float, PI};

/// Xorshift64* generator (spec §5 names this exact algorithm as the
/// default). Grounded on `original_source`'s per-thread seeding convention
/// (`render.cpp` seeds one RNG per worker thread from its thread index).
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // Xorshift64* requires a nonzero seed.
        Self { state: seed.wrapping_add(0x9E3779B97F4A7C15) | 1 }
    }

    /// Seeds deterministically from a worker/thread index and a base seed,
    /// per spec §9: "replaced by per-worker RNG seeded deterministically
    /// from (thread_id, base_seed)".
    pub fn for_worker(thread_id: u64, base_seed: u64) -> Self {
        Self::new(base_seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(thread_id))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        // Top 53 bits give a uniform double in [0, 1).
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn next_float(&mut self) -> Float {
        self.next_f64() as Float
    }

    pub fn uniform_range(&mut self, lo: Float, hi: Float) -> Float {
        lo + (hi - lo) * self.next_float()
    }

    /// Uniform point in the unit sphere via rejection sampling, used by the
    /// PBR material's roughness term (spec §4.4).
    pub fn random_in_unit_sphere(&mut self) -> Vector3 {
        loop {
            let p = Vector3::new(
                self.uniform_range(-1.0, 1.0),
                self.uniform_range(-1.0, 1.0),
                self.uniform_range(-1.0, 1.0),
            );
            if p.length_squared() < 1.0 {
                return p;
            }
        }
    }

    /// Cosine-weighted direction in the local frame whose `z` axis is the
    /// hemisphere's pole; combine with an `Onb` to align with a surface
    /// normal.
    pub fn cosine_direction(&mut self) -> Vector3 {
        let r1 = self.next_float();
        let r2 = self.next_float();
        let phi = 2.0 * PI * r1;
        let z = (1.0 - r2).sqrt();
        let r = r2.sqrt();
        Vector3::new(r * phi.cos(), r * phi.sin(), z)
    }

    /// Cosine-weighted direction aligned with normal `n`.
    pub fn cosine_direction_around(&mut self, n: Vector3) -> Vector3 {
        let onb = Onb::from_w(n);
        onb.local(self.cosine_direction())
    }
}
