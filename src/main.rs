//! CLI entry point (spec §6): parses arguments, loads a scene, renders it,
//! and writes the PNG plus a `.spd` sidecar for later resumption.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use spectral_pt::camera::CameraFrame;
use spectral_pt::cli::Args;
use spectral_pt::core::spectrum::Observer;
use spectral_pt::demo_scene::DemoScene;
use spectral_pt::error::RenderError;
use spectral_pt::image::ImageBuffer;
use spectral_pt::integrator::{render, RenderSettings, WavelengthMode};
use spectral_pt::scene::load_scene;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run() -> Result<(), RenderError> {
    let args = Args::parse();
    let (width, height) = args.resolution()?;
    let region = args.region_of_interest()?;

    let observer = Observer::srgb();
    let loader = DemoScene::load(&args.file, &observer)?;
    let (scene, camera) = load_scene(&loader, &observer)?;
    let camera_frame = CameraFrame::new(&camera, width, height);

    let image_buffer = match &args.spd {
        Some(path) => ImageBuffer::load_spd(path)?,
        None => ImageBuffer::new(width, height),
    };

    let buckets_x = (width + 31) / 32;
    let buckets_y = (height + 31) / 32;
    let progress = ProgressBar::new((buckets_x * buckets_y) as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} buckets ({elapsed_precise})")
            .expect("valid progress bar template"),
    );

    let settings = RenderSettings {
        image_width: width,
        image_height: height,
        samples_per_pixel: args.samples,
        max_depth: args.depth,
        fast_preview: false,
        wavelength_mode: WavelengthMode::Full,
        region,
    };

    let cancel = AtomicBool::new(false);
    let image_mutex = Mutex::new(image_buffer);
    render(&scene, &camera_frame, &image_mutex, &settings, 0, &cancel, &|_, _, _, _| {
        progress.inc(1);
    });
    progress.finish();
    let image_buffer = image_mutex.into_inner().expect("render never poisons the image lock");

    image_buffer.save_png(&args.image, &observer)?;
    let spd_path = args.image.with_extension("spd");
    image_buffer.save_spd(&spd_path)?;

    info!("Wrote {} and {}", args.image.display(), spd_path.display());
    Ok(())
}
