use crate::core::geometry::Hit;
use crate::core::spectrum::Spectrum;

/// Single-sided emitter backing an `AreaLight` (spec §4.4). Never scatters,
/// never occludes shadow rays.
pub struct EmissiveMaterial {
    pub emission: Spectrum,
    pub visible: bool,
}

impl Default for EmissiveMaterial {
    fn default() -> Self {
        Self {
            emission: Spectrum::zero(),
            visible: true,
        }
    }
}

impl EmissiveMaterial {
    pub fn new(emission: Spectrum) -> Self {
        Self { emission, visible: true }
    }

    /// Single-sided emission (spec §4.4): radiates only from the front
    /// face, matching `front_face = (d . n_geom < 0)`.
    pub fn emit(&self, hit: &Hit) -> Spectrum {
        if hit.front_face {
            self.emission
        } else {
            Spectrum::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Point3, Vector3};
    use crate::material::Material;
    use std::sync::Arc;

    #[test]
    fn emits_only_on_front_face() {
        let mat = EmissiveMaterial::new(Spectrum::constant(2.0));
        let mut hit = Hit {
            p: Point3::ZERO,
            n: Vector3::new(0.0, 0.0, 1.0),
            front_face: true,
            u: 0.0,
            v: 0.0,
            t: 1.0,
            material: Arc::new(Material::error()),
        };
        assert_eq!(mat.emit(&hit).samples()[0], 2.0);
        hit.front_face = false;
        assert_eq!(mat.emit(&hit).samples()[0], 0.0);
    }
}
