//! Material/BSDF model: a tagged variant over `{Pbr, Emissive, Constant}`
//! (spec §9 REDESIGN FLAG: inheritance-based polymorphism becomes a match on
//! a variant rather than virtual dispatch, since the hot loop here is the
//! BSDF branch, not primitive aggregation).

mod constant;
mod emissive;
mod pbr;

pub use constant::ConstantMaterial;
pub use emissive::EmissiveMaterial;
pub use pbr::PbrMaterial;

use crate::core::geometry::{Hit, Ray};
use crate::core::pbrt::Float;
use crate::core::spectrum::Spectrum;
use crate::rng::Rng;

/// Result of sampling a scatter event (spec §3 `ScatterRecord`). Exactly one
/// of a PDF-sampled direction or a `skip_pdf` direct-sampled ray is active;
/// the two are modeled as enum variants rather than an "active" flag plus
/// two optional fields, so the invariant is enforced by the type.
pub enum ScatterRecord {
    /// Sampling was done directly (cosine-weighted diffuse, Fresnel-chosen
    /// specular/transmission); the integrator multiplies by `attenuation`
    /// without dividing by a PDF (spec §4.4).
    SkipPdf { attenuation: Spectrum, ray: Ray },
    /// Sampling defers to the integrator's mixture PDF of light- and
    /// BSDF-sampling (spec §4.6 step 8). None of the three concrete
    /// materials below currently produce this variant — PBR always uses
    /// `SkipPdf`, and emissive/constant never scatter — but the integrator
    /// implements the general path because `scattering_pdf` is part of
    /// every material's contract (spec §4.4) and is exercised directly by
    /// the energy-conservation test (spec §8).
    Pdf { attenuation: Spectrum },
}

/// Polymorphic material (spec §3/§4.4). All three variants also carry
/// `visible`/`cast_shadow` flags per the shared `Material` invariants.
pub enum Material {
    Pbr(PbrMaterial),
    Emissive(EmissiveMaterial),
    Constant(ConstantMaterial),
}

impl Material {
    pub fn sample_scatter(
        &self,
        r_in: &Ray,
        hit: &Hit,
        rng: &mut Rng,
        hero_wavelength: Option<f32>,
    ) -> Option<ScatterRecord> {
        match self {
            Material::Pbr(m) => m.sample_scatter(r_in, hit, rng, hero_wavelength),
            Material::Emissive(_) | Material::Constant(_) => None,
        }
    }

    /// Density (solid angle, upper hemisphere) of the scattered direction
    /// under this material's BSDF (spec §4.4). Used by the integrator's
    /// generic MIS branch and by the energy-conservation test.
    pub fn scattering_pdf(&self, r_in: &Ray, hit: &Hit, scattered: &Ray) -> Float {
        match self {
            Material::Pbr(m) => m.scattering_pdf(r_in, hit, scattered),
            Material::Emissive(_) | Material::Constant(_) => 0.0,
        }
    }

    pub fn emit(&self, hit: &Hit) -> Spectrum {
        match self {
            Material::Pbr(m) => m.emit(hit),
            Material::Emissive(m) => m.emit(hit),
            Material::Constant(m) => m.emit(hit),
        }
    }

    /// Fast-preview color, resolving spec §9's Open Question: "treat it as
    /// returning `base_color * shading_factor`" uniformly, including for
    /// transmissive materials (the source left this undefined for them).
    pub fn fast_emit(&self, r_in: &Ray, hit: &Hit) -> Spectrum {
        match self {
            Material::Pbr(m) => m.fast_emit(r_in, hit),
            Material::Emissive(m) => m.emit(hit),
            Material::Constant(m) => m.emit(hit),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Material::Pbr(m) => m.visible,
            Material::Emissive(m) => m.visible,
            Material::Constant(m) => m.visible,
        }
    }

    /// Emissive materials never occlude shadow rays (spec §4.4: "it does
    /// not cast shadows").
    pub fn casts_shadow(&self) -> bool {
        match self {
            Material::Pbr(m) => m.cast_shadow,
            Material::Emissive(_) => false,
            Material::Constant(m) => m.cast_shadow,
        }
    }

    /// Synthetic fallback material for an unresolved material binding
    /// (spec §6: `load_materials` provides a synthetic `"error"` entry).
    pub fn error() -> Material {
        Material::Constant(ConstantMaterial {
            color: bright_red(),
            visible: true,
            cast_shadow: true,
        })
    }
}

fn bright_red() -> Spectrum {
    Spectrum::from_fn(|l| if l < 590.0 { 0.05 } else { 1.0 })
}
