use super::{wavelength, Spectrum, N};

/// RGB primaries/whitepoint convention used to derive the XYZ->RGB matrix
/// (spec §4.1 lists all five as acceptable targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbWorkingSpace {
    Srgb,
    AdobeRgb,
    Rec709,
    Rec2020,
    DciP3,
}

/// Standard colorimetric observer: CIE 1931 2-degree color matching
/// functions sampled on the spectral grid, plus the 3x3 matrix mapping CIE
/// XYZ to a chosen RGB working space (spec §3/§4.1).
///
/// The color matching functions are generated from the multi-lobe Gaussian
/// analytic fit of Wyman, Sloan & Shirley ("Simple Analytic Approximations
/// to the CIE XYZ Color Matching Functions", JCGT 2013) rather than from a
/// tabulated tristimulus dataset: it reproduces the standard observer to
/// within photometric tolerance and lets the curves be evaluated directly
/// on this crate's 81-sample grid instead of resampling a foreign one.
pub struct Observer {
    x_bar: [f32; N],
    y_bar: [f32; N],
    z_bar: [f32; N],
    xyz_to_rgb: [[f32; 3]; 3],
}

fn gaussian(x: f32, mu: f32, sigma1: f32, sigma2: f32) -> f32 {
    let sigma = if x < mu { sigma1 } else { sigma2 };
    let t = (x - mu) / sigma;
    (-0.5 * t * t).exp()
}

fn x_bar_fn(l: f32) -> f32 {
    1.056 * gaussian(l, 599.8, 37.9, 31.0) + 0.362 * gaussian(l, 442.0, 16.0, 26.7)
        - 0.065 * gaussian(l, 501.1, 20.4, 26.2)
}

fn y_bar_fn(l: f32) -> f32 {
    0.821 * gaussian(l, 568.8, 46.9, 40.5) + 0.286 * gaussian(l, 530.9, 16.3, 31.1)
}

fn z_bar_fn(l: f32) -> f32 {
    1.217 * gaussian(l, 437.0, 11.8, 36.0) + 0.681 * gaussian(l, 459.0, 26.0, 13.8)
}

/// Chromaticity primaries and whitepoint for a working space, and the
/// derivation of its XYZ->RGB matrix (ported from
/// `original_source/src/data/color.h`'s `rgb_colorspace`).
fn primaries_and_white(space: RgbWorkingSpace) -> ([(f32, f32); 3], (f32, f32)) {
    match space {
        RgbWorkingSpace::Srgb | RgbWorkingSpace::Rec709 => (
            [(0.64, 0.33), (0.30, 0.60), (0.15, 0.06)],
            (0.3127, 0.3290), // D65
        ),
        RgbWorkingSpace::AdobeRgb => (
            [(0.64, 0.33), (0.21, 0.71), (0.15, 0.06)],
            (0.3127, 0.3290), // D65
        ),
        RgbWorkingSpace::Rec2020 => (
            [(0.708, 0.292), (0.170, 0.797), (0.131, 0.046)],
            (0.3127, 0.3290), // D65
        ),
        RgbWorkingSpace::DciP3 => (
            [(0.680, 0.320), (0.265, 0.690), (0.150, 0.060)],
            (0.3127, 0.3290), // D65
        ),
    }
}

fn xyz_from_xy(x: f32, y: f32) -> [f32; 3] {
    [x / y, 1.0, (1.0 - x - y) / y]
}

fn mat3_mul_vec(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn invert3(m: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    let inv_det = 1.0 / det;
    [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ]
}

/// Derives the RGB->XYZ matrix from chromaticity primaries and a whitepoint
/// (standard colorimetry: columns are primaries scaled so they sum to the
/// whitepoint), then inverts it to get XYZ->RGB.
fn xyz_to_rgb_matrix(space: RgbWorkingSpace) -> [[f32; 3]; 3] {
    let (primaries, white) = primaries_and_white(space);
    let xyz_r = xyz_from_xy(primaries[0].0, primaries[0].1);
    let xyz_g = xyz_from_xy(primaries[1].0, primaries[1].1);
    let xyz_b = xyz_from_xy(primaries[2].0, primaries[2].1);
    let p = [
        [xyz_r[0], xyz_g[0], xyz_b[0]],
        [xyz_r[1], xyz_g[1], xyz_b[1]],
        [xyz_r[2], xyz_g[2], xyz_b[2]],
    ];
    let white_xyz = xyz_from_xy(white.0, white.1);
    let p_inv = invert3(&p);
    let s = mat3_mul_vec(&p_inv, white_xyz);
    let rgb_to_xyz = [
        [p[0][0] * s[0], p[0][1] * s[1], p[0][2] * s[2]],
        [p[1][0] * s[0], p[1][1] * s[1], p[1][2] * s[2]],
        [p[2][0] * s[0], p[2][1] * s[1], p[2][2] * s[2]],
    ];
    invert3(&rgb_to_xyz)
}

impl Observer {
    pub fn new(space: RgbWorkingSpace) -> Self {
        let mut x_bar = [0.0f32; N];
        let mut y_bar = [0.0f32; N];
        let mut z_bar = [0.0f32; N];
        for i in 0..N {
            let l = wavelength(i);
            x_bar[i] = x_bar_fn(l);
            y_bar[i] = y_bar_fn(l);
            z_bar[i] = z_bar_fn(l);
        }
        Self {
            x_bar,
            y_bar,
            z_bar,
            xyz_to_rgb: xyz_to_rgb_matrix(space),
        }
    }

    pub fn srgb() -> Self {
        Self::new(RgbWorkingSpace::Srgb)
    }

    /// Integrates `s` against (x-bar, y-bar, z-bar) to produce CIE XYZ.
    /// A Riemann sum over the fixed grid, scaled by the wavelength step so
    /// the result is independent of `N` (spec §4.1).
    pub fn to_xyz(&self, s: &Spectrum) -> [f32; 3] {
        let samples = s.samples();
        let mut xyz = [0.0f32; 3];
        for i in 0..N {
            xyz[0] += samples[i] * self.x_bar[i];
            xyz[1] += samples[i] * self.y_bar[i];
            xyz[2] += samples[i] * self.z_bar[i];
        }
        let step = super::LAMBDA_STEP;
        [xyz[0] * step, xyz[1] * step, xyz[2] * step]
    }

    pub fn xyz_to_rgb(&self, xyz: [f32; 3]) -> [f32; 3] {
        mat3_mul_vec(&self.xyz_to_rgb, xyz)
    }

    pub fn spectrum_to_rgb(&self, s: &Spectrum) -> [f32; 3] {
        self.xyz_to_rgb(self.to_xyz(s))
    }

    pub fn x_bar(&self) -> &[f32; N] {
        &self.x_bar
    }

    pub fn y_bar(&self) -> &[f32; N] {
        &self.y_bar
    }

    pub fn z_bar(&self) -> &[f32; N] {
        &self.z_bar
    }
}
