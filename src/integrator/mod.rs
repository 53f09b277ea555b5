//! Stratified sampling, the path estimator, and the bucket-parallel render
//! scheduler (spec §4.6). Grounded on
//! `examples/hackmad-pbr-rust/src/core/integrator/sampler_integrator.rs`
//! and `original_source/src/render.cpp`.

mod estimator;
mod sampler;
mod scheduler;

pub use estimator::estimate_radiance;
pub use sampler::StratifiedSampler;
pub use scheduler::{render, render_with_threads, RegionOfInterest, RenderSettings, WavelengthMode};
