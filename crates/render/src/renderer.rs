use std::fmt::Write;

use lavaworld_kernel::{Camera, CreatureStatus, LavaScene};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and the camera, then produces output. It never
/// mutates the scene; the frame orchestrator owns all writes.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the scene as seen from `camera`.
    fn render(&self, scene: &LavaScene, camera: &Camera) -> Self::Output;
}

/// Produces a human-readable dump of the scene state.
///
/// Used by the CLI, in logs, and to test the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// How many rain particles to list individually.
    pub sample_particles: usize,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self {
            sample_particles: 3,
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &LavaScene, camera: &Camera) -> String {
        let mut out = String::new();
        let wave = scene.wave();
        let light = scene.light_state();
        let rain = scene.rain();

        let _ = writeln!(
            out,
            "=== Lava World (t={:.3}s, seed={}) ===",
            wave.time(),
            scene.seed()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.eye.x,
            camera.eye.y,
            camera.eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.projection.fov_y_degrees,
            camera.projection.aspect,
        );
        let _ = writeln!(
            out,
            "Wave: height={:.2} freq={:.2} center={:.4}",
            wave.uniforms().wave_height,
            wave.uniforms().wave_frequency,
            wave.displacement(0.0, 0.0)
        );
        let _ = writeln!(
            out,
            "Light: pos=({:.2}, {:.2}, {:.2}) color={} intensity={:.1}",
            light.position.x, light.position.y, light.position.z, light.color, light.intensity
        );
        let _ = writeln!(out, "Rain: {} particles", rain.len());
        for (i, p) in rain.positions().iter().take(self.sample_particles).enumerate() {
            let _ = writeln!(out, "  [{i}] pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        }

        let status = scene.creature().status();
        let _ = match status {
            CreatureStatus::Disabled => writeln!(out, "Creature: disabled"),
            CreatureStatus::Loading => writeln!(out, "Creature: loading"),
            CreatureStatus::Static => writeln!(out, "Creature: loaded (no animations)"),
            CreatureStatus::Animating { clips } => {
                let time = scene.creature().mixer().map_or(0.0, |m| m.time());
                writeln!(out, "Creature: animating {clips} clip(s), mixer t={time:.3}s")
            }
            CreatureStatus::Failed(reason) => writeln!(out, "Creature: failed ({reason})"),
        };

        out
    }
}
