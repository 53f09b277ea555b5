use crate::core::geometry::{Point3, Vector3};
use crate::core::pbrt::Float;

/// A ray `o + t*d`. `t` is restricted to `[t_min, t_max]` by callers via a
/// mutable interval argument rather than carried on the ray itself, matching
/// the teacher's `Hit::spawn_ray`/`spawn_ray_to` style of passing intervals
/// at the call site.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub o: Point3,
    pub d: Vector3,
}

impl Ray {
    pub fn new(o: Point3, d: Vector3) -> Self {
        Self { o, d }
    }

    pub fn at(&self, t: Float) -> Point3 {
        self.o + self.d * t
    }

    /// A ray spawned from a hit point, offset along `n` by `RAY_EPSILON` to
    /// avoid self-intersection (spec §4.2 `ε_ray_min`).
    pub fn spawn(p: Point3, n: Vector3, d: Vector3) -> Self {
        let bias = if d.dot(&n) > 0.0 {
            n * crate::core::pbrt::RAY_EPSILON
        } else {
            n * -crate::core::pbrt::RAY_EPSILON
        };
        Self::new(p + bias, d)
    }
}
