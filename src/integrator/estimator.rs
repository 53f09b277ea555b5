//! Explicit-loop path estimator (spec §4.6 "Estimator"). Grounded on
//! `original_source/src/render.cpp::ray_color`'s structure (fast-preview
//! branch, visibility bias, `skip_pdf` shortcut, light/BSDF mixture for the
//! general branch) — spec §9's REDESIGN FLAG replaces the original's
//! recursion with an explicit accumulator loop to avoid unbounded native
//! stack growth at high `max_depth`.

use crate::core::geometry::{Onb, Ray};
use crate::core::pbrt::{Float, INFINITY, PDF_EPSILON, RAY_EPSILON, VISIBILITY_BIAS};
use crate::core::spectrum::Spectrum;
use crate::material::ScatterRecord;
use crate::rng::Rng;
use crate::scene::Scene;

/// Estimates the radiance arriving along `ray`, up to `max_depth` bounces
/// (spec §4.6 steps 1-8). `hero_wavelength` is `Some` in hero-wavelength
/// mode and threaded through to wavelength-dependent IOR evaluation.
pub fn estimate_radiance(
    mut ray: Ray,
    scene: &Scene,
    rng: &mut Rng,
    max_depth: usize,
    fast_preview: bool,
    hero_wavelength: Option<f32>,
) -> Spectrum {
    let mut radiance = Spectrum::zero();
    let mut throughput = Spectrum::constant(1.0);
    let mut depth = max_depth;

    loop {
        if depth == 0 {
            break;
        }

        let hit = match scene.intersect(&ray, RAY_EPSILON, INFINITY) {
            Some(hit) => hit,
            None => break, // background: 0 (spec step 2)
        };

        if fast_preview {
            radiance += throughput * hit.material.fast_emit(&ray, &hit);
            break;
        }

        if !hit.material.is_visible() {
            let origin = hit.p + ray.d * VISIBILITY_BIAS;
            ray = Ray::new(origin, ray.d);
            continue;
        }

        radiance += throughput * hit.material.emit(&hit);

        let scatter = match hit.material.sample_scatter(&ray, &hit, rng, hero_wavelength) {
            Some(scatter) => scatter,
            None => break,
        };

        match scatter {
            ScatterRecord::SkipPdf {
                attenuation,
                ray: next_ray,
            } => {
                throughput = throughput * attenuation;
                ray = next_ray;
                depth -= 1;
            }
            ScatterRecord::Pdf { attenuation } => {
                let (scattered, p_mix) = sample_mixture(&ray, &hit, scene, rng);
                if p_mix <= PDF_EPSILON {
                    break;
                }
                let f_s = hit.material.scattering_pdf(&ray, &hit, &scattered);
                throughput = throughput * attenuation * (f_s / p_mix) as f32;
                ray = scattered;
                depth -= 1;
            }
        }
    }

    radiance
}

/// Equal-weight mixture of light-sampling and the material's own BSDF
/// density (spec §4.6 step 8). Returns the sampled ray and the mixture
/// density at the sampled direction.
fn sample_mixture(
    r_in: &Ray,
    hit: &crate::core::geometry::Hit,
    scene: &Scene,
    rng: &mut Rng,
) -> (Ray, Float) {
    let direction = if !scene.lights.is_empty() && rng.next_float() < 0.5 {
        let index = ((rng.next_float() * scene.lights.len() as Float) as usize)
            .min(scene.lights.len() - 1);
        scene.lights[index].sample_direction(hit.p, rng)
    } else {
        let onb = Onb::from_w(hit.n);
        onb.local(rng.cosine_direction())
    };

    let scattered = hit.spawn_ray(direction);
    let p_mix = mixture_pdf_value(r_in, hit, scene, &scattered);
    (scattered, p_mix)
}

fn mixture_pdf_value(
    r_in: &Ray,
    hit: &crate::core::geometry::Hit,
    scene: &Scene,
    scattered: &Ray,
) -> Float {
    let light_pdf = if scene.lights.is_empty() {
        0.0
    } else {
        scene
            .lights
            .iter()
            .map(|light| light.pdf_value(hit.p, scattered.d))
            .sum::<Float>()
            / scene.lights.len() as Float
    };
    let bsdf_pdf = hit.material.scattering_pdf(r_in, hit, scattered);
    0.5 * light_pdf + 0.5 * bsdf_pdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Point3, Vector3};
    use crate::core::spectrum::Spectrum as Spd;
    use crate::light::AreaLight;
    use crate::material::{EmissiveMaterial, Material};
    use std::sync::Arc;

    #[test]
    fn zero_depth_returns_black() {
        let scene = Scene::new(Vec::new(), Vec::new());
        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let mut rng = Rng::new(1);
        let l = estimate_radiance(ray, &scene, &mut rng, 0, false, None);
        assert!(l.is_black());
    }

    #[test]
    fn empty_scene_returns_background_black() {
        let scene = Scene::new(Vec::new(), Vec::new());
        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let mut rng = Rng::new(1);
        let l = estimate_radiance(ray, &scene, &mut rng, 5, false, None);
        assert!(l.is_black());
    }

    #[test]
    fn direct_hit_on_emissive_quad_returns_its_emission() {
        let emission = Spd::constant(2.0);
        let light = Arc::new(AreaLight::new(
            Point3::new(-1.0, -1.0, -2.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Arc::new(Material::Emissive(EmissiveMaterial::new(emission))),
        ));
        let scene = Scene::new(Vec::new(), vec![light]);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let mut rng = Rng::new(9);
        let l = estimate_radiance(ray, &scene, &mut rng, 4, false, None);
        assert!((l.samples()[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn fast_preview_stops_after_first_hit() {
        let emission = Spd::constant(2.0);
        let light = Arc::new(AreaLight::new(
            Point3::new(-1.0, -1.0, -2.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Arc::new(Material::Emissive(EmissiveMaterial::new(emission))),
        ));
        let scene = Scene::new(Vec::new(), vec![light]);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let mut rng = Rng::new(9);
        let l = estimate_radiance(ray, &scene, &mut rng, 4, true, None);
        // Fast-preview on an emissive surface uses the generic fast_emit path
        // (= emit for Emissive/Constant), so the result is the same here.
        assert!((l.samples()[0] - 2.0).abs() < 1e-5);
    }
}
