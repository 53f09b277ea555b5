//! Spectral image accumulator: pixel storage, tone mapping to PNG, and the
//! raw spectral (SPD) file format (spec §4.7). Grounded on
//! `original_source/src/image/image.h` (`set_pixel`/`add_to_pixel`/
//! `get_pixel`/`normalize`) and `image_spd.h` (`save_spectrum`/
//! `load_spectrum`'s exact binary layout).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use image::{Rgb, RgbImage};

use crate::core::pbrt::clamp;
use crate::core::spectrum::{Observer, Spectrum, N};

/// `width * height` spectra, stored row-major `(y, x, lambda)` exactly as
/// the on-disk SPD layout, so save/load is a straight memcpy-shaped walk.
pub struct ImageBuffer {
    width: usize,
    height: usize,
    gamma: f32,
    exposure: f32,
    pixels: Vec<Spectrum>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            gamma: 2.2,
            exposure: 0.0,
            pixels: vec![Spectrum::zero(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    pub fn set_gamma(&mut self, gamma: f32) {
        self.gamma = gamma;
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, s: Spectrum) {
        let i = self.index(x, y);
        self.pixels[i] = s;
    }

    pub fn add_to_pixel(&mut self, x: usize, y: usize, s: Spectrum) {
        let i = self.index(x, y);
        self.pixels[i] += s;
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Spectrum {
        self.pixels[self.index(x, y)]
    }

    /// Scales every sample so the single brightest sample in the whole
    /// buffer becomes 1 (spec §4.7 "normalize").
    pub fn normalize(&mut self) {
        let max = self
            .pixels
            .iter()
            .flat_map(|s| s.samples().iter().copied())
            .fold(0.0f32, f32::max);
        if max > 0.0 {
            for p in self.pixels.iter_mut() {
                *p = *p * (1.0 / max);
            }
        }
    }

    /// Tone-maps and encodes to an 8-bit sRGB PNG (spec §4.7 "Save-to-PNG
    /// path"): spectrum -> RGB via the observer, `2^exposure` multiplier,
    /// gamma encode `pow(clamp(c, 0, 1), 1/gamma)`, 8-bit quantize.
    pub fn save_png(&self, path: impl AsRef<Path>, observer: &Observer) -> io::Result<()> {
        let exposure_scale = 2f32.powf(self.exposure);
        let inv_gamma = 1.0 / self.gamma;

        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let rgb = self.get_pixel(x, y).to_rgb(observer);
                let mut out = [0u8; 3];
                for c in 0..3 {
                    let scaled = rgb[c] * exposure_scale;
                    let encoded = clamp(scaled as f64, 0.0, 1.0).powf(inv_gamma as f64);
                    out[c] = (encoded * 255.0 + 0.5).min(255.0) as u8;
                }
                img.put_pixel(x as u32, y as u32, Rgb(out));
            }
        }
        img.save(path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Writes the raw spectral image (spec §6 "Spectral file format"):
    /// `int32 W, int32 H, float32 gamma, float32 exposure, int32 N`, then
    /// `W*H*N` little-endian `float32`s in `(y, x, lambda)` order.
    pub fn save_spd(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(&(self.width as i32).to_le_bytes())?;
        w.write_all(&(self.height as i32).to_le_bytes())?;
        w.write_all(&self.gamma.to_le_bytes())?;
        w.write_all(&self.exposure.to_le_bytes())?;
        w.write_all(&(N as i32).to_le_bytes())?;
        for pixel in &self.pixels {
            for &sample in pixel.samples() {
                w.write_all(&sample.to_le_bytes())?;
            }
        }
        w.flush()
    }

    /// Loads a previously saved spectral image, used by `--spd` to resume a
    /// render (spec §4 expansion: "resume-from-SPD").
    pub fn load_spd(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut r = BufReader::new(File::open(path)?);

        let mut i32_buf = [0u8; 4];
        r.read_exact(&mut i32_buf)?;
        let width = i32::from_le_bytes(i32_buf) as usize;
        r.read_exact(&mut i32_buf)?;
        let height = i32::from_le_bytes(i32_buf) as usize;
        r.read_exact(&mut i32_buf)?;
        let gamma = f32::from_le_bytes(i32_buf);
        r.read_exact(&mut i32_buf)?;
        let exposure = f32::from_le_bytes(i32_buf);
        r.read_exact(&mut i32_buf)?;
        let n_stored = i32::from_le_bytes(i32_buf) as usize;

        if n_stored != N {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("SPD file has {} spectral samples, expected {}", n_stored, N),
            ));
        }

        let mut pixels = Vec::with_capacity(width * height);
        let mut sample_buf = [0u8; 4];
        for _ in 0..width * height {
            let mut s = Spectrum::zero();
            for i in 0..N {
                r.read_exact(&mut sample_buf)?;
                s[i] = f32::from_le_bytes(sample_buf);
            }
            pixels.push(s);
        }

        Ok(Self {
            width,
            height,
            gamma,
            exposure,
            pixels,
        })
    }
}
