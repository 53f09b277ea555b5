use std::sync::Arc;

use crate::core::geometry::{Point3, Ray, Vector3};
use crate::core::pbrt::Float;
use crate::material::Material;

/// Surface intersection record (spec §3 `HitRecord`). Transient: overwritten
/// by each BVH query, never retained across calls.
#[derive(Clone)]
pub struct Hit {
    pub p: Point3,
    pub n: Vector3,
    pub front_face: bool,
    pub u: Float,
    pub v: Float,
    pub t: Float,
    pub material: Arc<Material>,
}

/// Alias kept for readability at call sites that want to stress this is an
/// intersection result rather than a general interaction.
pub type HitRecord = Hit;

impl Hit {
    /// Orients `n_geom` to face against the incoming ray direction `d` and
    /// records whether the geometric normal originally faced the ray
    /// (spec §4.2: `front_face = (d . n_geom < 0)`).
    pub fn set_face_normal(d: Vector3, n_geom: Vector3) -> (bool, Vector3) {
        let front_face = d.dot(&n_geom) < 0.0;
        let n = if front_face { n_geom } else { -n_geom };
        (front_face, n)
    }

    pub fn spawn_ray(&self, d: Vector3) -> Ray {
        Ray::spawn(self.p, self.n, d)
    }

    pub fn spawn_ray_to(&self, target: Point3) -> Ray {
        let d = target - self.p;
        Ray::spawn(self.p, self.n, d)
    }
}
