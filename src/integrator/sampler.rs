use crate::core::pbrt::Float;
use crate::rng::Rng;

/// `sqrt_spp × sqrt_spp` stratified pixel sampler (spec §4.6
/// "Stratification"). Grounded on
/// `original_source/src/render.cpp::sample_square_stratified`.
pub struct StratifiedSampler {
    pub sqrt_spp: usize,
}

impl StratifiedSampler {
    pub fn new(samples_per_pixel: usize) -> Self {
        let sqrt_spp = (samples_per_pixel as Float).sqrt().floor() as usize;
        Self {
            sqrt_spp: sqrt_spp.max(1),
        }
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.sqrt_spp * self.sqrt_spp
    }

    /// Offset within a pixel, in `[-0.5, 0.5)` along each axis, for
    /// sub-sample `sample_index` of `samples_per_pixel()`.
    pub fn stratum_offset(&self, sample_index: usize, rng: &mut Rng) -> (Float, Float) {
        let s_i = sample_index % self.sqrt_spp;
        let s_j = sample_index / self.sqrt_spp;
        let recip = 1.0 / self.sqrt_spp as Float;
        let dx = (s_i as Float + rng.next_float()) * recip - 0.5;
        let dy = (s_j as Float + rng.next_float()) * recip - 0.5;
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_spp_floors_non_square_counts() {
        assert_eq!(StratifiedSampler::new(10).sqrt_spp, 3);
        assert_eq!(StratifiedSampler::new(16).sqrt_spp, 4);
        assert_eq!(StratifiedSampler::new(1).sqrt_spp, 1);
    }

    #[test]
    fn every_stratum_offset_is_in_range() {
        let sampler = StratifiedSampler::new(64);
        let mut rng = Rng::new(3);
        for s in 0..sampler.samples_per_pixel() {
            let (dx, dy) = sampler.stratum_offset(s, &mut rng);
            assert!((-0.5..0.5).contains(&dx));
            assert!((-0.5..0.5).contains(&dy));
        }
    }

    /// Spec §4.6: sub-sample offsets fall into disjoint `1/k x 1/k` strata,
    /// exactly — sample `s`'s offset must lie in *its own* cell, not just
    /// somewhere in the pixel.
    #[test]
    fn stratum_offsets_stay_within_their_own_cell() {
        let k = 8;
        let sampler = StratifiedSampler::new(k * k);
        assert_eq!(sampler.sqrt_spp, k);
        let mut rng = Rng::new(11);

        for s in 0..sampler.samples_per_pixel() {
            let s_i = s % k;
            let s_j = s / k;
            let (dx, dy) = sampler.stratum_offset(s, &mut rng);

            let recip = 1.0 / k as Float;
            let cell_x_lo = s_i as Float * recip - 0.5;
            let cell_x_hi = (s_i + 1) as Float * recip - 0.5;
            let cell_y_lo = s_j as Float * recip - 0.5;
            let cell_y_hi = (s_j + 1) as Float * recip - 0.5;

            assert!(
                dx >= cell_x_lo && dx < cell_x_hi,
                "sample {s} (s_i={s_i}): dx={dx} not in [{cell_x_lo}, {cell_x_hi})"
            );
            assert!(
                dy >= cell_y_lo && dy < cell_y_hi,
                "sample {s} (s_j={s_j}): dy={dy} not in [{cell_y_lo}, {cell_y_hi})"
            );
        }
    }
}
