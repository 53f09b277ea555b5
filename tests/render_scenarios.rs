//! End-to-end scenarios exercised against the public crate API, without a
//! scene file on disk (spec §8's "empty scene", "single emissive
//! parallelogram", and "BVH matches a linear scan" properties).

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use spectral_pt::camera::{Camera, CameraFrame};
use spectral_pt::core::geometry::{Mesh, Point3, Ray, Triangle, Vector3};
use spectral_pt::core::pbrt::INFINITY;
use spectral_pt::core::spectrum::Spectrum;
use spectral_pt::image::ImageBuffer;
use spectral_pt::integrator::{render, render_with_threads, RenderSettings, WavelengthMode};
use spectral_pt::light::AreaLight;
use spectral_pt::material::{EmissiveMaterial, Material};
use spectral_pt::rng::Rng;
use spectral_pt::scene::Scene;

fn settings(width: usize, height: usize) -> RenderSettings {
    RenderSettings {
        image_width: width,
        image_height: height,
        samples_per_pixel: 4,
        max_depth: 4,
        fast_preview: false,
        wavelength_mode: WavelengthMode::Full,
        region: None,
    }
}

#[test]
fn empty_scene_renders_an_all_black_image() {
    let scene = Scene::new(Vec::new(), Vec::new());
    let camera = Camera {
        fov_deg: 40.0,
        center: Point3::new(0.0, 0.0, 5.0),
        look_at: Point3::ZERO,
        look_up: Vector3::new(0.0, 1.0, 0.0),
    };
    let frame = CameraFrame::new(&camera, 16, 16);
    let image = Mutex::new(ImageBuffer::new(16, 16));
    let cancel = AtomicBool::new(false);

    render(&scene, &frame, &image, &settings(16, 16), 1, &cancel, &|_, _, _, _| {});

    let image = image.into_inner().unwrap();
    for y in 0..16 {
        for x in 0..16 {
            assert!(image.get_pixel(x, y).is_black());
        }
    }
}

#[test]
fn camera_facing_emissive_quad_sees_its_emission() {
    let emission = Spectrum::constant(2.0);
    let light = Arc::new(AreaLight::new(
        Point3::new(-5.0, -5.0, -10.0),
        Vector3::new(10.0, 0.0, 0.0),
        Vector3::new(0.0, 10.0, 0.0),
        Arc::new(Material::Emissive(EmissiveMaterial::new(emission))),
    ));
    let scene = Scene::new(Vec::new(), vec![light]);

    let camera = Camera {
        fov_deg: 20.0,
        center: Point3::ZERO,
        look_at: Point3::new(0.0, 0.0, -1.0),
        look_up: Vector3::new(0.0, 1.0, 0.0),
    };
    let frame = CameraFrame::new(&camera, 32, 32);
    let image = Mutex::new(ImageBuffer::new(32, 32));
    let cancel = AtomicBool::new(false);

    render(&scene, &frame, &image, &settings(32, 32), 7, &cancel, &|_, _, _, _| {});

    let image = image.into_inner().unwrap();
    let center = image.get_pixel(16, 16);
    for &s in center.samples() {
        assert!((s - 2.0).abs() / 2.0 < 0.05, "sample {s} not within 5% of 2.0");
    }
}

/// Spec §8 "Thread-safety": rendering the same scene/seed with 1 thread vs
/// N threads agrees within numerical tolerance of the accumulated mean. The
/// fixture here (a camera whose whole frame sees a large emissive quad, no
/// scattering) has a per-pixel radiance independent of which rng stream
/// produced the sub-pixel jitter, so 1 vs N threads should match exactly.
#[test]
fn render_is_identical_with_one_thread_and_with_many_threads() {
    let emission = Spectrum::constant(2.0);
    let light = Arc::new(AreaLight::new(
        Point3::new(-5.0, -5.0, -10.0),
        Vector3::new(10.0, 0.0, 0.0),
        Vector3::new(0.0, 10.0, 0.0),
        Arc::new(Material::Emissive(EmissiveMaterial::new(emission))),
    ));
    let scene = Scene::new(Vec::new(), vec![light]);

    let camera = Camera {
        fov_deg: 20.0,
        center: Point3::ZERO,
        look_at: Point3::new(0.0, 0.0, -1.0),
        look_up: Vector3::new(0.0, 1.0, 0.0),
    };
    let frame = CameraFrame::new(&camera, 24, 24);
    let base_settings = settings(24, 24);

    let render_with = |num_threads: usize| -> ImageBuffer {
        let image = Mutex::new(ImageBuffer::new(24, 24));
        let cancel = AtomicBool::new(false);
        render_with_threads(
            &scene,
            &frame,
            &image,
            &base_settings,
            3,
            &cancel,
            &|_, _, _, _| {},
            Some(num_threads),
        );
        image.into_inner().unwrap()
    };

    let single_threaded = render_with(1);
    let multi_threaded = render_with(4);

    for y in 0..24 {
        for x in 0..24 {
            let a = single_threaded.get_pixel(x, y);
            let b = multi_threaded.get_pixel(x, y);
            for i in 0..a.samples().len() {
                assert!(
                    (a.samples()[i] - b.samples()[i]).abs() < 1e-6,
                    "pixel ({x},{y}) sample {i}: 1-thread={}, 4-thread={}",
                    a.samples()[i],
                    b.samples()[i]
                );
            }
        }
    }
}

#[test]
fn bvh_intersection_matches_a_linear_scan_over_the_same_triangles() {
    fn build_triangles(seed_base: u64, count: u64) -> Vec<Triangle> {
        (0..count)
            .map(|i| {
                let mut rng = Rng::new(seed_base + i);
                let center = Point3::new(
                    rng.uniform_range(-15.0, 15.0),
                    rng.uniform_range(-15.0, 15.0),
                    rng.uniform_range(-15.0, 15.0),
                );
                Triangle::flat(
                    center,
                    center + Vector3::new(1.0, 0.0, 0.0),
                    center + Vector3::new(0.0, 1.0, 0.0),
                    Arc::new(Material::error()),
                )
            })
            .collect()
    }

    let bvh_triangles = build_triangles(2000, 400);
    let linear_triangles = build_triangles(2000, 400);

    let mesh = Mesh::new(bvh_triangles);
    let scene = Scene::new(vec![mesh], Vec::new());

    let mut rng = Rng::new(99);
    for _ in 0..1000 {
        let origin = Point3::new(
            rng.uniform_range(-25.0, 25.0),
            rng.uniform_range(-25.0, 25.0),
            rng.uniform_range(-25.0, 25.0),
        );
        let dir = Vector3::new(
            rng.uniform_range(-1.0, 1.0),
            rng.uniform_range(-1.0, 1.0),
            rng.uniform_range(-1.0, 1.0),
        )
        .normalized();
        let ray = Ray::new(origin, dir);

        let scene_hit = scene.intersect(&ray, 1e-4, INFINITY);
        let linear_hit = linear_triangles
            .iter()
            .filter_map(|t| t.intersect(&ray, 1e-4, INFINITY))
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap());

        match (&scene_hit, &linear_hit) {
            (None, None) => {}
            (Some(a), Some(b)) => assert!((a.t - b.t).abs() < 1e-6),
            _ => panic!("scene (BVH) and linear scan disagree on hit/miss"),
        }
    }
}
