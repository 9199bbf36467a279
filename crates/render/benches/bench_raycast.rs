use std::hint::black_box;
use std::time::Instant;

use glam::{UVec2, Vec3};
use voxelspace_kernel::{FieldConfig, Scene, VoxelField};
use voxelspace_render::{
    CpuRenderer, FlyCamera, MAX_TRACE_STEPS, Ray, RenderView, Renderer, cast_ray,
};

fn make_field(scene: Scene, size: u32) -> VoxelField {
    let grid = match scene.build(size) {
        Ok(grid) => grid,
        Err(e) => panic!("scene build failed: {e}"),
    };
    VoxelField::new(grid, FieldConfig::default())
}

fn bench_cast_ray(scene: Scene, iterations: usize) {
    let field = make_field(scene, 128);
    let origin = Vec3::new(64.0, 108.0, -30.0);
    let dirs: Vec<Vec3> = (0..64)
        .map(|i| {
            let a = i as f32 / 64.0 * std::f32::consts::TAU;
            Vec3::new(a.cos() * 0.6, -0.5, 0.8 + a.sin() * 0.3)
        })
        .collect();

    let start = Instant::now();
    for i in 0..iterations {
        let ray = Ray::new(origin, dirs[i % dirs.len()]);
        let _ = black_box(cast_ray(black_box(&field), &ray, MAX_TRACE_STEPS));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  cast_ray ({scene:?}, {iterations} rays): {per_iter:?}/ray, total {elapsed:?}");
}

fn bench_frame(width: u32, height: u32, frames: usize) {
    let field = make_field(Scene::Terrain, 128);
    let renderer = CpuRenderer::default();
    let view = RenderView::new(FlyCamera::default(), UVec2::new(width, height));

    let start = Instant::now();
    for _ in 0..frames {
        let _ = black_box(renderer.render(black_box(&field), &view));
    }
    let elapsed = start.elapsed();
    let per_frame = elapsed / frames as u32;
    println!(
        "  cpu frame ({width}x{height}, {frames} frames): {per_frame:?}/frame, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Ray Cast Benchmarks ===\n");

    println!("Single rays:");
    bench_cast_ray(Scene::Empty, 2000);
    bench_cast_ray(Scene::Sphere, 20000);
    bench_cast_ray(Scene::Terrain, 20000);

    println!("\nCPU frames:");
    bench_frame(160, 90, 20);
    bench_frame(320, 180, 10);
    bench_frame(640, 360, 3);

    println!("\n=== Done ===");
}
