//! Command-line surface (spec §6). Built on `clap`'s derive API.

use std::path::PathBuf;

use clap::Parser;

use crate::error::RenderError;
use crate::integrator::RegionOfInterest;

#[derive(Parser, Debug)]
#[command(name = "spectral-pt", about = "A spectral, physically based Monte Carlo path tracer")]
pub struct Args {
    /// Scene file to render.
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Output PNG path.
    #[arg(short = 'i', long = "image", default_value = "output.png")]
    pub image: PathBuf,

    /// Image resolution as `W,H`.
    #[arg(short = 'r', long = "resolution", default_value = "1024,768")]
    pub resolution: String,

    /// Samples per pixel.
    #[arg(short = 's', long = "samples", default_value_t = 4)]
    pub samples: usize,

    /// Maximum path depth.
    #[arg(short = 'd', long = "depth", default_value_t = 8)]
    pub depth: usize,

    /// Restrict rendering to a rectangle `x,y,w,h`; pixels outside it are
    /// left untouched (spec §6, SPEC_FULL.md §4 region-restricted render).
    #[arg(long = "region")]
    pub region: Option<String>,

    /// Resume rendering from a previously saved raw spectral image.
    #[arg(long = "spd")]
    pub spd: Option<PathBuf>,
}

impl Args {
    pub fn resolution(&self) -> Result<(usize, usize), RenderError> {
        parse_pair(&self.resolution)
            .ok_or_else(|| RenderError::Args(format!("malformed --resolution {:?}, expected W,H", self.resolution)))
    }

    pub fn region_of_interest(&self) -> Result<Option<RegionOfInterest>, RenderError> {
        let Some(region) = &self.region else {
            return Ok(None);
        };
        let parts: Vec<&str> = region.split(',').collect();
        if parts.len() != 4 {
            return Err(RenderError::Args(format!("malformed --region {region:?}, expected x,y,w,h")));
        }
        let mut values = [0usize; 4];
        for (i, part) in parts.iter().enumerate() {
            values[i] = part
                .trim()
                .parse()
                .map_err(|_| RenderError::Args(format!("malformed --region {region:?}, expected x,y,w,h")))?;
        }
        Ok(Some(RegionOfInterest {
            x: values[0],
            y: values[1],
            width: values[2],
            height: values[3],
        }))
    }
}

fn parse_pair(s: &str) -> Option<(usize, usize)> {
    let (a, b) = s.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_comma_pair() {
        let args = Args::parse_from(["spectral-pt", "-f", "scene.ron", "-r", "640,480"]);
        assert_eq!(args.resolution().unwrap(), (640, 480));
    }

    #[test]
    fn malformed_resolution_is_an_args_error() {
        let args = Args::parse_from(["spectral-pt", "-f", "scene.ron", "-r", "nope"]);
        assert!(matches!(args.resolution(), Err(RenderError::Args(_))));
    }

    #[test]
    fn region_parses_four_values() {
        let args = Args::parse_from(["spectral-pt", "-f", "scene.ron", "--region", "10,20,30,40"]);
        let region = args.region_of_interest().unwrap().unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (10, 20, 30, 40));
    }

    #[test]
    fn region_defaults_to_none() {
        let args = Args::parse_from(["spectral-pt", "-f", "scene.ron"]);
        assert!(args.region_of_interest().unwrap().is_none());
    }
}
