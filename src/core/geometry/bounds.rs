use crate::core::geometry::{Point3, Ray};
use crate::core::pbrt::Float;

/// Axis-aligned bounding box, stored as two corner points (spec §3). The
/// empty-box sentinel uses +inf/-inf per axis so that `union` with any real
/// box yields that box unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(Float::INFINITY, Float::INFINITY, Float::INFINITY),
            max: Point3::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY),
        }
    }

    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    pub fn union_point(&self, p: Point3) -> Self {
        Self {
            min: self.min.min(&p),
            max: self.max.max(&p),
        }
    }

    pub fn centroid(&self) -> Point3 {
        (self.min + self.max.to_vector()) * 0.5
    }

    pub fn diagonal(&self) -> crate::core::geometry::Vector3 {
        self.max - self.min
    }

    /// Expands any axis whose extent is below `eps`, so degenerate (flat)
    /// bounds still have a nonzero slab test width (spec §4.2).
    pub fn pad(&self, eps: Float) -> Self {
        let d = self.diagonal();
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            if d[axis] < eps {
                let half = eps * 0.5;
                match axis {
                    0 => {
                        min.x -= half;
                        max.x += half;
                    }
                    1 => {
                        min.y -= half;
                        max.y += half;
                    }
                    _ => {
                        min.z -= half;
                        max.z += half;
                    }
                }
            }
        }
        Self { min, max }
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    pub fn max_extent(&self) -> usize {
        self.diagonal().max_dimension()
    }

    /// Ray-slab intersection test. `t_min`/`t_max` bound the caller's
    /// `ray_t` interval; on hit the returned pair is the narrowed
    /// sub-interval `[t_enter, t_exit] ⊆ [t_min, t_max]` (spec §4.2: accepted
    /// iff `tmin < tmax && tmax > 0`).
    pub fn hit(&self, ray: &Ray, mut t_min: Float, mut t_max: Float) -> Option<(Float, Float)> {
        for axis in 0..3 {
            let inv_d = 1.0 / ray.d[axis];
            let mut t0 = (self.min[axis] - ray.o[axis]) * inv_d;
            let mut t1 = (self.max[axis] - ray.o[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max <= t_min {
                return None;
            }
        }
        if t_max > 0.0 {
            Some((t_min, t_max))
        } else {
            None
        }
    }
}
