//! Geometry primitives: vectors, rays, bounding boxes, triangles, meshes.

mod bounds;
mod interaction;
mod ray;
mod triangle;
mod vector;

pub use bounds::Bounds3;
pub use interaction::{Hit, HitRecord};
pub use ray::Ray;
pub use triangle::{Mesh, Triangle};
pub use vector::{reflect, refract, Normal3, Onb, Point3, Vector3};
