use std::sync::Arc;

use crate::core::geometry::{Bounds3, Hit, Point3, Ray, Vector3};
use crate::core::pbrt::{Float, MESH_SPLIT_MAX_TRIANGLES, PARALLEL_EPSILON};
use crate::material::Material;

/// A single triangle with precomputed edges and per-vertex shading normals
/// (spec §3). Immutable after construction.
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    pub edge1: Vector3,
    pub edge2: Vector3,
    pub n0: Vector3,
    pub n1: Vector3,
    pub n2: Vector3,
    pub material: Arc<Material>,
}

impl Triangle {
    pub fn new(
        v0: Point3,
        v1: Point3,
        v2: Point3,
        n0: Vector3,
        n1: Vector3,
        n2: Vector3,
        material: Arc<Material>,
    ) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        Self {
            v0,
            v1,
            v2,
            edge1,
            edge2,
            n0,
            n1,
            n2,
            material,
        }
    }

    /// Constructs a triangle with a single flat geometric normal replicated
    /// at every vertex (spec §4.2: "if unavailable, use geometric normal").
    pub fn flat(v0: Point3, v1: Point3, v2: Point3, material: Arc<Material>) -> Self {
        let n = (v1 - v0).cross(&(v2 - v0)).normalized();
        Self::new(v0, v1, v2, n, n, n, material)
    }

    pub fn geometric_normal(&self) -> Vector3 {
        self.edge1.cross(&self.edge2).normalized()
    }

    pub fn bounding_box(&self) -> Bounds3 {
        Bounds3::from_point(self.v0)
            .union_point(self.v1)
            .union_point(self.v2)
            .pad(1e-6)
    }

    pub fn centroid(&self) -> Point3 {
        Point3::ZERO + (self.v0.to_vector() + self.v1.to_vector() + self.v2.to_vector()) / 3.0
    }

    /// Moller-Trumbore intersection (spec §4.2). `ray_t` is `[t_min, t_max]`.
    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Hit> {
        let h = ray.d.cross(&self.edge2);
        let a = self.edge1.dot(&h);
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }
        let f = 1.0 / a;
        let s = ray.o - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(&self.edge1);
        let v = f * ray.d.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * self.edge2.dot(&q);
        if t < t_min || t > t_max {
            return None;
        }

        let p = ray.at(t);
        let w = 1.0 - u - v;
        let interpolated = self.n0 * w + self.n1 * u + self.n2 * v;
        let n_shading = if interpolated.length_squared() < 1e-12 {
            self.geometric_normal()
        } else {
            interpolated.normalized()
        };
        let n_geom = self.geometric_normal();
        let front_face = ray.d.dot(&n_geom) < 0.0;
        // The shading normal is interpolated from vertex normals assumed to
        // already agree with the geometric winding; flip it the same way
        // the geometric normal flips so both face against the ray.
        let n = if front_face { n_shading } else { -n_shading };

        Some(Hit {
            p,
            n,
            front_face,
            u,
            v,
            t,
            material: self.material.clone(),
        })
    }
}

/// An ordered sequence of triangles sharing a union AABB (spec §3). Acts as
/// a BVH primitive: its `bounding_box`/`centroid` are used for SAH binning
/// and its `intersect` linearly scans its (post-split, ≤10) triangles.
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    bounds: Bounds3,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .fold(Bounds3::empty(), |b, t| b.union(&t.bounding_box()));
        Self { triangles, bounds }
    }

    pub fn bounding_box(&self) -> Bounds3 {
        self.bounds
    }

    pub fn centroid(&self) -> Point3 {
        self.bounds.centroid()
    }

    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Hit> {
        let mut closest = t_max;
        let mut result = None;
        for tri in &self.triangles {
            if let Some(hit) = tri.intersect(ray, t_min, closest) {
                closest = hit.t;
                result = Some(hit);
            }
        }
        result
    }

    /// Recursively splits a mesh along its most-balanced centroid axis until
    /// every leaf mesh has at most `MESH_SPLIT_MAX_TRIANGLES` triangles
    /// (spec §4.3 mesh-splitting pre-pass). Consumes `self` and returns the
    /// leaf meshes in arbitrary order.
    pub fn split(self) -> Vec<Mesh> {
        if self.triangles.len() <= MESH_SPLIT_MAX_TRIANGLES {
            return vec![self];
        }

        let centroid_bounds = self
            .triangles
            .iter()
            .fold(Bounds3::empty(), |b, t| b.union_point(t.centroid()));
        let axis = centroid_bounds.max_extent();
        let mid = centroid_bounds.centroid()[axis];

        let mut left = Vec::new();
        let mut right = Vec::new();
        for tri in self.triangles {
            if tri.centroid()[axis] < mid {
                left.push(tri);
            } else {
                right.push(tri);
            }
        }

        if left.is_empty() || right.is_empty() {
            // Degenerate split (all centroids coincide on this axis): stop
            // and emit the input as a single leaf mesh rather than looping.
            let all = if left.is_empty() { right } else { left };
            return vec![Mesh::new(all)];
        }

        let mut out = Mesh::new(left).split();
        out.extend(Mesh::new(right).split());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    fn error_material() -> Arc<Material> {
        Arc::new(Material::error())
    }

    #[test]
    fn ray_hits_triangle_center() {
        let tri = Triangle::flat(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            error_material(),
        );
        let ray = Ray::new(Point3::new(0.0, -0.2, -5.0), Vector3::new(0.0, 0.0, 1.0));
        let hit = tri.intersect(&ray, 1e-3, Float::INFINITY);
        assert!(hit.is_some());
        let hit = hit.unwrap();
        assert!((hit.n.length() - 1.0).abs() < 1e-6);
        let p_expected = ray.at(hit.t);
        assert!((hit.p - p_expected).length() < 1e-6);
    }

    #[test]
    fn ray_misses_outside_triangle() {
        let tri = Triangle::flat(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            error_material(),
        );
        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(tri.intersect(&ray, 1e-3, Float::INFINITY).is_none());
    }

    #[test]
    fn split_terminates_under_budget() {
        let mut tris = Vec::new();
        for i in 0..25 {
            let off = i as Float;
            tris.push(Triangle::flat(
                Point3::new(off, 0.0, 0.0),
                Point3::new(off + 0.5, 0.0, 0.0),
                Point3::new(off, 1.0, 0.0),
                error_material(),
            ));
        }
        let mesh = Mesh::new(tris);
        let pieces = mesh.split();
        let total: usize = pieces.iter().map(|m| m.triangles.len()).sum();
        assert_eq!(total, 25);
        for piece in &pieces {
            assert!(piece.triangles.len() <= MESH_SPLIT_MAX_TRIANGLES);
        }
    }
}
