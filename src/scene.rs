//! Scene aggregate and the `SceneLoader` interface (spec §6). Grounded on
//! `examples/hackmad-pbr-rust/src/core/scene.rs` (`Scene::new`/`intersect`
//! shape) and `original_source/src/render.cpp`'s constructor (load camera,
//! load materials with synthetic `"error"` entry, load meshes, load area
//! lights, mesh-split, build BVH).

use std::collections::HashMap;
use std::sync::Arc;

use crate::accelerators::bvh::{Bvh, Primitive};
use crate::camera::Camera;
use crate::core::geometry::{Bounds3, Hit, Mesh, Ray};
use crate::core::pbrt::Float;
use crate::core::spectrum::Observer;
use crate::light::AreaLight;
use crate::material::Material;

/// A fully loaded, render-ready scene: the BVH aggregate over meshes and
/// area lights, the list of lights for direct-lighting sampling, and the
/// world bounding box.
pub struct Scene {
    aggregate: Bvh,
    pub lights: Vec<Arc<AreaLight>>,
    pub world_bound: Bounds3,
}

impl Scene {
    pub fn new(meshes: Vec<Mesh>, lights: Vec<Arc<AreaLight>>) -> Self {
        let mut primitives: Vec<Primitive> = Vec::new();
        for mesh in meshes {
            for piece in mesh.split() {
                primitives.push(Primitive::Mesh(piece));
            }
        }
        for light in &lights {
            primitives.push(Primitive::Light(light.clone()));
        }
        let aggregate = Bvh::build(primitives);
        let world_bound = aggregate.world_bound();
        Self {
            aggregate,
            lights,
            world_bound,
        }
    }

    pub fn intersect(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<Hit> {
        self.aggregate.intersect(ray, t_min, t_max)
    }

    pub fn intersect_p(&self, ray: &Ray, t_min: Float, t_max: Float) -> bool {
        self.aggregate.intersect_p(ray, t_min, t_max)
    }
}

/// Error produced while loading a scene (spec §7: surfaces as
/// `RenderError::SceneLoad`, never retried).
#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("no camera found in scene")]
    NoCamera,
    #[error("mesh {mesh_index} references unknown material {material_name:?}")]
    UnknownMaterial { mesh_index: usize, material_name: String },
    #[error("{0}")]
    Other(String),
}

/// Interface a scene source implements to feed the renderer (spec §6). The
/// built-in `demo_scene` module is one concrete implementation; this crate
/// does not ship a general-purpose scene-file importer (spec §1 scopes
/// format parsing out).
pub trait SceneLoader {
    fn find_first_camera(&self) -> Result<Camera, SceneLoadError>;

    /// Loaded materials by name, always including a synthetic `"error"`
    /// entry (bright red constant) for unresolved material references.
    fn load_materials(&self) -> Result<HashMap<String, Arc<Material>>, SceneLoadError>;

    fn load_meshes(
        &self,
        materials: &HashMap<String, Arc<Material>>,
    ) -> Result<Vec<Mesh>, SceneLoadError>;

    fn load_area_lights(&self, observer: &Observer) -> Result<Vec<Arc<AreaLight>>, SceneLoadError>;
}

/// Loads a scene end to end via a `SceneLoader`, inserting the synthetic
/// `"error"` material and building the BVH (spec §6).
pub fn load_scene(
    loader: &dyn SceneLoader,
    observer: &Observer,
) -> Result<(Scene, Camera), SceneLoadError> {
    let camera = loader.find_first_camera()?;

    let mut materials = loader.load_materials()?;
    materials
        .entry("error".to_string())
        .or_insert_with(|| Arc::new(Material::error()));

    let meshes = loader.load_meshes(&materials)?;
    let lights = loader.load_area_lights(observer)?;

    Ok((Scene::new(meshes, lights), camera))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Point3, Triangle, Vector3};
    use crate::core::spectrum::Spectrum;
    use crate::material::EmissiveMaterial;

    #[test]
    fn empty_scene_misses_every_ray() {
        let scene = Scene::new(Vec::new(), Vec::new());
        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray, 1e-3, Float::INFINITY).is_none());
        assert!(!scene.intersect_p(&ray, 1e-3, Float::INFINITY));
    }

    #[test]
    fn scene_with_single_mesh_is_hit() {
        let material = Arc::new(Material::error());
        let tri = Triangle::flat(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            material,
        );
        let mesh = Mesh::new(vec![tri]);
        let scene = Scene::new(vec![mesh], Vec::new());
        let ray = Ray::new(Point3::new(0.0, -0.2, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(scene.intersect(&ray, 1e-3, Float::INFINITY).is_some());
    }

    #[test]
    fn scene_includes_area_lights_as_hittable_and_listed() {
        let light = Arc::new(AreaLight::new(
            Point3::new(-1.0, -1.0, -2.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Arc::new(Material::Emissive(EmissiveMaterial::new(Spectrum::constant(1.0)))),
        ));
        let scene = Scene::new(Vec::new(), vec![light]);
        assert_eq!(scene.lights.len(), 1);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray, 1e-3, Float::INFINITY).is_some());
    }
}
