//! Minimal built-in scene description, read from a small RON file. This
//! stands in for "import a scene from some particular file format," which
//! spec.md explicitly scopes out; it exists only so the CLI has something to
//! render end to end and is not a general-purpose importer.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::camera::Camera;
use crate::core::geometry::{Mesh, Point3, Triangle, Vector3};
use crate::core::pbrt::Float;
use crate::core::spectrum::{d65, Observer, RgbSpectrumTable, Spectrum};
use crate::light::AreaLight;
use crate::material::{ConstantMaterial, EmissiveMaterial, Material, PbrMaterial};
use crate::scene::{SceneLoadError, SceneLoader};

fn default_one() -> Float {
    1.0
}

fn default_ior() -> Float {
    1.5
}

fn default_one_f32() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct CameraDesc {
    fov_deg: Float,
    center: [Float; 3],
    look_at: [Float; 3],
    look_up: [Float; 3],
}

#[derive(Deserialize)]
enum MaterialDesc {
    Pbr {
        base_color: [f32; 3],
        #[serde(default = "default_one")]
        base_weight: Float,
        #[serde(default)]
        base_metalness: Float,
        #[serde(default)]
        specular_weight: Float,
        #[serde(default)]
        specular_roughness: Float,
        #[serde(default = "default_ior")]
        specular_ior: Float,
        #[serde(default)]
        transmission_weight: Float,
    },
    Emissive {
        color: [f32; 3],
        #[serde(default = "default_one_f32")]
        intensity: f32,
    },
    Constant {
        color: [f32; 3],
    },
}

#[derive(Deserialize)]
struct TriangleDesc {
    v0: [Float; 3],
    v1: [Float; 3],
    v2: [Float; 3],
}

#[derive(Deserialize)]
struct MeshDesc {
    material: String,
    triangles: Vec<TriangleDesc>,
}

#[derive(Deserialize)]
struct LightDesc {
    q: [Float; 3],
    u: [Float; 3],
    v: [Float; 3],
    /// Explicit RGB emission color. Ignored if `use_d65` is set.
    #[serde(default)]
    color: Option<[f32; 3]>,
    #[serde(default = "default_one_f32")]
    intensity: f32,
    /// Uses the D65 illuminant as emission rather than `color` (spec §8
    /// scenario 2's emissive parallelogram).
    #[serde(default)]
    use_d65: bool,
}

#[derive(Deserialize)]
struct SceneFile {
    camera: CameraDesc,
    #[serde(default)]
    materials: HashMap<String, MaterialDesc>,
    #[serde(default)]
    meshes: Vec<MeshDesc>,
    #[serde(default)]
    lights: Vec<LightDesc>,
}

/// A `SceneLoader` backed by a RON-encoded [`SceneFile`].
pub struct DemoScene {
    file: SceneFile,
    rgb_table: RgbSpectrumTable,
}

impl DemoScene {
    pub fn load(path: impl AsRef<Path>, observer: &Observer) -> Result<Self, SceneLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SceneLoadError::Other(format!("failed to read {}: {e}", path.display())))?;
        let file: SceneFile =
            ron::from_str(&text).map_err(|e| SceneLoadError::Other(format!("malformed scene file: {e}")))?;
        let rgb_table = RgbSpectrumTable::build(17, observer);
        Ok(Self { file, rgb_table })
    }

    fn spectrum_from_rgb(&self, rgb: [f32; 3]) -> Spectrum {
        Spectrum::from_rgb(rgb, &self.rgb_table)
    }

    fn point(p: [Float; 3]) -> Point3 {
        Point3::new(p[0], p[1], p[2])
    }

    fn vector(v: [Float; 3]) -> Vector3 {
        Vector3::new(v[0], v[1], v[2])
    }
}

impl SceneLoader for DemoScene {
    fn find_first_camera(&self) -> Result<Camera, SceneLoadError> {
        let c = &self.file.camera;
        Ok(Camera {
            fov_deg: c.fov_deg,
            center: Self::point(c.center),
            look_at: Self::point(c.look_at),
            look_up: Self::vector(c.look_up),
        })
    }

    fn load_materials(&self) -> Result<HashMap<String, Arc<Material>>, SceneLoadError> {
        let mut out = HashMap::new();
        for (name, desc) in &self.file.materials {
            let material = match desc {
                MaterialDesc::Pbr {
                    base_color,
                    base_weight,
                    base_metalness,
                    specular_weight,
                    specular_roughness,
                    specular_ior,
                    transmission_weight,
                } => Material::Pbr(PbrMaterial {
                    base_weight: *base_weight,
                    base_color: self.spectrum_from_rgb(*base_color),
                    base_metalness: *base_metalness,
                    specular_weight: *specular_weight,
                    specular_roughness: *specular_roughness,
                    specular_ior: *specular_ior,
                    transmission_weight: *transmission_weight,
                    ..PbrMaterial::default()
                }),
                MaterialDesc::Emissive { color, intensity } => {
                    Material::Emissive(EmissiveMaterial::new(self.spectrum_from_rgb(*color) * *intensity))
                }
                MaterialDesc::Constant { color } => {
                    Material::Constant(ConstantMaterial::new(self.spectrum_from_rgb(*color)))
                }
            };
            out.insert(name.clone(), Arc::new(material));
        }
        Ok(out)
    }

    fn load_meshes(&self, materials: &HashMap<String, Arc<Material>>) -> Result<Vec<Mesh>, SceneLoadError> {
        let mut meshes = Vec::with_capacity(self.file.meshes.len());
        for (mesh_index, mesh_desc) in self.file.meshes.iter().enumerate() {
            let material = materials.get(&mesh_desc.material).cloned().ok_or_else(|| {
                SceneLoadError::UnknownMaterial {
                    mesh_index,
                    material_name: mesh_desc.material.clone(),
                }
            })?;
            let triangles = mesh_desc
                .triangles
                .iter()
                .map(|t| Triangle::flat(Self::point(t.v0), Self::point(t.v1), Self::point(t.v2), material.clone()))
                .collect();
            meshes.push(Mesh::new(triangles));
        }
        Ok(meshes)
    }

    fn load_area_lights(&self, _observer: &Observer) -> Result<Vec<Arc<AreaLight>>, SceneLoadError> {
        let mut lights = Vec::with_capacity(self.file.lights.len());
        for light in &self.file.lights {
            let emission = if light.use_d65 {
                d65() * light.intensity
            } else {
                self.spectrum_from_rgb(light.color.unwrap_or([1.0, 1.0, 1.0])) * light.intensity
            };
            let material = Arc::new(Material::Emissive(EmissiveMaterial::new(emission)));
            lights.push(Arc::new(AreaLight::new(
                Self::point(light.q),
                Self::vector(light.u),
                Self::vector(light.v),
                material,
            )));
        }
        Ok(lights)
    }
}
