//! Hand-rolled vector/point/normal types. Kept separate per spec's data
//! model even though all three share the same (x, y, z) layout, so that
//! misuse (e.g. adding two points) is a type error rather than a silent bug.

use std::ops::{Add, Div, Index, Mul, Neg, Sub};

use crate::core::pbrt::Float;

macro_rules! vec3_common {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            pub x: Float,
            pub y: Float,
            pub z: Float,
        }

        impl $name {
            pub const fn new(x: Float, y: Float, z: Float) -> Self {
                Self { x, y, z }
            }

            pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

            pub fn length_squared(&self) -> Float {
                self.x * self.x + self.y * self.y + self.z * self.z
            }

            pub fn length(&self) -> Float {
                self.length_squared().sqrt()
            }

            pub fn dot(&self, other: &Self) -> Float {
                self.x * other.x + self.y * other.y + self.z * other.z
            }

            pub fn cross(&self, other: &Self) -> Self {
                Self::new(
                    self.y * other.z - self.z * other.y,
                    self.z * other.x - self.x * other.z,
                    self.x * other.y - self.y * other.x,
                )
            }

            pub fn normalized(&self) -> Self {
                let len = self.length();
                if len == 0.0 {
                    *self
                } else {
                    Self::new(self.x / len, self.y / len, self.z / len)
                }
            }

            pub fn max_component(&self) -> Float {
                self.x.max(self.y).max(self.z)
            }

            pub fn min_component(&self) -> Float {
                self.x.min(self.y).min(self.z)
            }

            /// Index of the axis with the largest absolute extent. Used by
            /// BVH splitting and AABB slab ordering.
            pub fn max_dimension(&self) -> usize {
                if self.x > self.y && self.x > self.z {
                    0
                } else if self.y > self.z {
                    1
                } else {
                    2
                }
            }
        }

        impl Index<usize> for $name {
            type Output = Float;
            fn index(&self, i: usize) -> &Float {
                match i {
                    0 => &self.x,
                    1 => &self.y,
                    2 => &self.z,
                    _ => panic!("axis index out of range: {}", i),
                }
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
            }
        }

        impl Mul<Float> for $name {
            type Output = Self;
            fn mul(self, rhs: Float) -> Self {
                Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
            }
        }

        impl Div<Float> for $name {
            type Output = Self;
            fn div(self, rhs: Float) -> Self {
                Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self::new(-self.x, -self.y, -self.z)
            }
        }
    };
}

vec3_common!(Vector3);
vec3_common!(Point3);
vec3_common!(Normal3);

impl Vector3 {
    pub fn from_point(p: Point3) -> Self {
        Self::new(p.x, p.y, p.z)
    }

    pub fn to_normal(self) -> Normal3 {
        Normal3::new(self.x, self.y, self.z)
    }
}

impl Normal3 {
    pub fn to_vector(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Flips the normal so it faces against `d`, matching spec §4.2's
    /// `front_face` convention.
    pub fn face_forward(self, d: Vector3) -> Self {
        if self.to_vector().dot(&d) < 0.0 {
            self
        } else {
            -self
        }
    }
}

impl Point3 {
    pub fn to_vector(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl Add<Vector3> for Point3 {
    type Output = Point3;
    fn add(self, rhs: Vector3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vector3> for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Vector3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vector3;
    fn sub(self, rhs: Point3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Reflects `d` about normal `n` (both must already be appropriately
/// oriented); used by the PBR material's specular branch.
pub fn reflect(d: Vector3, n: Vector3) -> Vector3 {
    d - n * (2.0 * d.dot(&n))
}

/// Refracts `uv` through a surface with normal `n` and relative index of
/// refraction `etai_over_etat`. Returns `None` on total internal reflection.
pub fn refract(uv: Vector3, n: Vector3, etai_over_etat: Float) -> Option<Vector3> {
    let cos_theta = (-uv).dot(&n).min(1.0);
    let sin2_theta = (1.0 - cos_theta * cos_theta) * etai_over_etat * etai_over_etat;
    if sin2_theta > 1.0 {
        return None;
    }
    let r_out_perp = (uv + n * cos_theta) * etai_over_etat;
    let r_out_parallel = n * -((1.0 - r_out_perp.length_squared()).abs().sqrt());
    Some(r_out_perp + r_out_parallel)
}

/// Orthonormal basis built from a single axis vector, used to align
/// cosine-weighted samples with a surface normal.
pub struct Onb {
    pub u: Vector3,
    pub v: Vector3,
    pub w: Vector3,
}

impl Onb {
    pub fn from_w(n: Vector3) -> Self {
        let w = n.normalized();
        let a = if w.x.abs() > 0.9 {
            Vector3::new(0.0, 1.0, 0.0)
        } else {
            Vector3::new(1.0, 0.0, 0.0)
        };
        let v = w.cross(&a).normalized();
        let u = w.cross(&v);
        Self { u, v, w }
    }

    pub fn local(&self, a: Vector3) -> Vector3 {
        self.u * a.x + self.v * a.y + self.w * a.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_product_orthogonal() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 0.0);
        let c = a.cross(&b);
        assert!((c.dot(&a)).abs() < 1e-12);
        assert!((c.dot(&b)).abs() < 1e-12);
        assert_eq!(c, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn onb_is_orthonormal() {
        let onb = Onb::from_w(Vector3::new(0.3, 0.7, 0.2));
        assert!((onb.u.length() - 1.0).abs() < 1e-9);
        assert!((onb.v.length() - 1.0).abs() < 1e-9);
        assert!((onb.w.length() - 1.0).abs() < 1e-9);
        assert!(onb.u.dot(&onb.v).abs() < 1e-9);
        assert!(onb.v.dot(&onb.w).abs() < 1e-9);
    }

    #[test]
    fn reflect_preserves_length() {
        let d = Vector3::new(1.0, -1.0, 0.0).normalized();
        let n = Vector3::new(0.0, 1.0, 0.0);
        let r = reflect(d, n);
        assert!((r.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn refract_tir_returns_none() {
        // Steep grazing angle going from dense to less-dense medium triggers TIR.
        let d = Vector3::new(0.99, -0.01, 0.0).normalized();
        let n = Vector3::new(0.0, 1.0, 0.0);
        assert!(refract(d, n, 1.5).is_none());
    }
}
