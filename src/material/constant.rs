use crate::core::geometry::Hit;
use crate::core::spectrum::Spectrum;

/// Flat constant-color material (spec §4.4). Used for the synthetic
/// `"error"` fallback and for simple unlit debug geometry; never scatters.
pub struct ConstantMaterial {
    pub color: Spectrum,
    pub visible: bool,
    pub cast_shadow: bool,
}

impl ConstantMaterial {
    pub fn new(color: Spectrum) -> Self {
        Self {
            color,
            visible: true,
            cast_shadow: true,
        }
    }

    pub fn emit(&self, _hit: &Hit) -> Spectrum {
        self.color
    }
}
