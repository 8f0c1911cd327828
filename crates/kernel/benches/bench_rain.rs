use std::hint::black_box;
use std::time::Instant;

use lavaworld_kernel::{Camera, ClockTick, DrawTarget, FrameOrchestrator, LavaScene, ManualSource};
use lavaworld_kernel::{RainConfig, RainParticleSet, SceneConfig, SimulationClock};
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn bench_rain_advance(count: usize, iterations: usize) {
    let config = RainConfig {
        count,
        ..RainConfig::default()
    };
    let mut rain = RainParticleSet::initialize(&config, &mut Pcg32::seed_from_u64(42));

    let start = Instant::now();
    for _ in 0..iterations {
        rain.advance();
        black_box(rain.positions());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  rain advance ({count} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

struct NullTarget;

impl DrawTarget for NullTarget {
    type Error = std::convert::Infallible;

    fn draw(
        &mut self,
        scene: &LavaScene,
        _camera: &Camera,
        _tick: &ClockTick,
    ) -> Result<(), Self::Error> {
        black_box(scene.rain().positions());
        Ok(())
    }
}

fn bench_full_frame(count: usize, iterations: usize) {
    let mut config = SceneConfig::default();
    config.rain.count = count;
    config.seed = Some(42);
    config.creature.path = None;
    let mut orch = FrameOrchestrator::new(
        LavaScene::new(config),
        SimulationClock::new(ManualSource::default()),
    );
    let camera = Camera::default();

    let start = Instant::now();
    for _ in 0..iterations {
        orch.clock_mut().source_mut().advance(1.0 / 60.0);
        black_box(orch.run_frame(&camera, &mut NullTarget, &|| {}));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  frame ({count} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Lava Scene Benchmarks ===\n");

    println!("Rain advance:");
    bench_rain_advance(1_000, 10_000);
    bench_rain_advance(10_000, 1_000);
    bench_rain_advance(100_000, 100);

    println!("\nHeadless frame (no creature):");
    bench_full_frame(10_000, 1_000);
    bench_full_frame(100_000, 100);

    println!("\n=== Done ===");
}
