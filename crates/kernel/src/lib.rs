//! Lava World kernel: the per-frame animation and scene-update loop.
//!
//! Every frame the [`FrameOrchestrator`] ticks the clock, pushes the elapsed
//! time into the wave field, advances the rain, moves the orbiting light,
//! steps the creature's animation mixer, and issues one composite draw.
//!
//! # Invariants
//! - Elapsed time never decreases; per-frame deltas are never negative.
//! - Each piece of scene state has exactly one writer.
//! - Nothing that goes wrong inside a frame stops the loop.

pub mod camera;
pub mod clock;
pub mod config;
pub mod creature;
pub mod frame;
pub mod light;
pub mod rain;
pub mod scene;
pub mod viewport;
pub mod wave;

pub use camera::{Camera, Projection};
pub use clock::{ClockTick, InstantSource, ManualSource, SimulationClock, TimeSource};
pub use config::{
    CameraConfig, ConfigError, CreatureConfig, LightConfig, RainConfig, SceneConfig, SkyConfig,
    TerrainConfig, WaveConfig,
};
pub use creature::{CreatureAnimation, CreatureStatus};
pub use frame::{DrawTarget, FrameOrchestrator, FramePhase, FrameReport, FrameScheduler};
pub use light::{LightState, OrbitingLight};
pub use rain::RainParticleSet;
pub use scene::LavaScene;
pub use viewport::{OutputSurface, ViewportReconciler, ViewportState};
pub use wave::{WaveField, WaveUniforms};
