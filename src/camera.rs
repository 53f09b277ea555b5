//! Pinhole camera (spec §4.6 "Primary ray"). Grounded on
//! `original_source/src/render.cpp::initialize`/`get_ray` (viewport
//! construction from fov/center/look_at/look_up, stratified pixel-sample
//! mapping), using the spec's vertical-fov convention rather than the
//! original's horizontal-fov default.

use crate::core::geometry::{Point3, Ray, Vector3};
use crate::core::pbrt::{degrees_to_radians, Float};

/// Camera parameters as returned by a `SceneLoader` (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub fov_deg: Float,
    pub center: Point3,
    pub look_at: Point3,
    pub look_up: Vector3,
}

/// The camera's resolved viewport frame for a given image resolution.
/// Computed once per render; immutable and shared read-only across workers.
pub struct CameraFrame {
    pub center: Point3,
    pixel00_loc: Point3,
    pixel_delta_u: Vector3,
    pixel_delta_v: Vector3,
}

impl CameraFrame {
    pub fn new(camera: &Camera, image_width: usize, image_height: usize) -> Self {
        let focal_length = (camera.center - camera.look_at).length();
        let fov_radians = degrees_to_radians(camera.fov_deg);
        let aspect = image_width as Float / image_height as Float;

        let viewport_height = 2.0 * focal_length * (fov_radians / 2.0).tan();
        let viewport_width = viewport_height * aspect;

        let w = (camera.center - camera.look_at).normalized();
        let u = camera.look_up.cross(&w).normalized();
        let v = w.cross(&u);

        let viewport_u = u * viewport_width;
        let viewport_v = -v * viewport_height;

        let pixel_delta_u = viewport_u / image_width as Float;
        let pixel_delta_v = viewport_v / image_height as Float;

        let viewport_upper_left =
            camera.center - w * focal_length - viewport_u * 0.5 - viewport_v * 0.5;
        let pixel00_loc = viewport_upper_left + (pixel_delta_u + pixel_delta_v) * 0.5;

        Self {
            center: camera.center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
        }
    }

    /// A ray through pixel `(i, j)`, offset within the pixel by `(dx, dy)`
    /// (a stratified sample offset in `[-0.5, 0.5]`, spec §4.6).
    pub fn get_ray(&self, i: usize, j: usize, dx: Float, dy: Float) -> Ray {
        let pixel_sample = self.pixel00_loc
            + self.pixel_delta_u * (i as Float + dx)
            + self.pixel_delta_v * (j as Float + dy);
        let direction = pixel_sample - self.center;
        Ray::new(self.center, direction)
    }
}
