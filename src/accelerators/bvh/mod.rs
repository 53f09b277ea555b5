//! Bounding-volume hierarchy over meshes and area lights (spec §2 item 2,
//! §4.3). Binned-SAH build only (spec §9 REDESIGN FLAG narrows the
//! teacher's `{SAH, HLBVH, Middle, EqualCounts}` split-method enum to SAH).

mod build;

pub use build::Bvh;

use std::sync::Arc;

use crate::core::geometry::{Bounds3, Hit, Mesh, Point3, Ray};
use crate::core::pbrt::Float;
use crate::light::AreaLight;

/// A top-level BVH primitive: either a (post-split, <= 10 triangle) mesh
/// piece or an area light, which is itself directly hittable (spec §2 item
/// 2: "binary tree of AABBs wrapping meshes (and area lights)").
pub enum Primitive {
    Mesh(Mesh),
    Light(Arc<AreaLight>),
}

impl Primitive {
    pub fn bounding_box(&self) -> Bounds3 {
        match self {
            Primitive::Mesh(m) => m.bounding_box(),
            Primitive::Light(l) => l.bounding_box(),
        }
    }

    pub fn centroid(&self) -> Point3 {
        match self {
            Primitive::Mesh(m) => m.centroid(),
            Primitive::Light(l) => l.centroid(),
        }
    }

    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Hit> {
        match self {
            Primitive::Mesh(m) => m.intersect(ray, t_min, t_max),
            Primitive::Light(l) => l.intersect(ray, t_min, t_max),
        }
    }
}
