use lavaworld_assets::CreatureAsset;
use lavaworld_kernel::{FrameReport, LavaScene};
use serde::Serialize;

/// Read-only queries against the scene for debugging and overlays.
pub struct FrameInspector;

impl FrameInspector {
    /// Produce a summary of the scene after a frame ran.
    pub fn summary(scene: &LavaScene, report: &FrameReport) -> FrameSummary {
        let (lowest, highest) = scene
            .rain()
            .positions()
            .iter()
            .fold(None, |acc: Option<(f32, f32)>, p| {
                Some(acc.map_or((p.y, p.y), |(lo, hi)| (lo.min(p.y), hi.max(p.y))))
            })
            .unwrap_or((0.0, 0.0));
        let light = scene.light_state().position;

        FrameSummary {
            frame: report.frame,
            elapsed: report.tick.elapsed,
            delta: report.tick.delta,
            drawn: report.drawn,
            seed: scene.seed(),
            wave_time: scene.wave().time(),
            wave_center: scene.wave().displacement(0.0, 0.0),
            rain_particles: scene.rain().len(),
            rain_lowest: lowest,
            rain_highest: highest,
            light_position: light.to_array(),
            creature: report.creature.to_string(),
            mixer_time: scene.creature().mixer().map(|m| m.time()),
        }
    }

    /// Describe a decoded creature model.
    pub fn asset(asset: &CreatureAsset) -> AssetInfo {
        AssetInfo {
            source: asset.source.clone(),
            nodes: asset.hierarchy.len(),
            meshes: asset.meshes.len(),
            primitives: asset.meshes.iter().map(|m| m.primitives.len()).sum(),
            vertices: asset.vertex_count(),
            triangles: asset.index_count() / 3,
            skins: asset.skins.len(),
            joints: asset.palette_len(),
            clips: asset
                .clips
                .iter()
                .map(|c| (c.name().to_string(), c.duration()))
                .collect(),
        }
    }
}

/// Scene state after one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub frame: u64,
    pub elapsed: f64,
    pub delta: f64,
    pub drawn: bool,
    pub seed: u64,
    pub wave_time: f32,
    /// Surface height at the origin.
    pub wave_center: f32,
    pub rain_particles: usize,
    pub rain_lowest: f32,
    pub rain_highest: f32,
    pub light_position: [f32; 3],
    pub creature: String,
    pub mixer_time: Option<f64>,
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame {}: t={:.3}s dt={:.4}s rain={} [{:.2}, {:.2}] light=({:.2}, {:.2}, {:.2}) creature={}",
            self.frame,
            self.elapsed,
            self.delta,
            self.rain_particles,
            self.rain_lowest,
            self.rain_highest,
            self.light_position[0],
            self.light_position[1],
            self.light_position[2],
            self.creature,
        )?;
        if !self.drawn {
            f.write_str(" (draw failed)")?;
        }
        Ok(())
    }
}

/// Counts and clip list of a creature model.
#[derive(Debug, Clone, Serialize)]
pub struct AssetInfo {
    pub source: String,
    pub nodes: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub skins: usize,
    /// Joint matrices needed to pose every mesh instance.
    pub joints: usize,
    /// Clip names with their durations in seconds.
    pub clips: Vec<(String, f32)>,
}

impl std::fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Asset: {}", self.source)?;
        writeln!(
            f,
            "  nodes={} meshes={} primitives={} vertices={} triangles={}",
            self.nodes, self.meshes, self.primitives, self.vertices, self.triangles
        )?;
        writeln!(f, "  skins={} joints={}", self.skins, self.joints)?;
        if self.clips.is_empty() {
            writeln!(f, "  no animation clips")?;
        }
        for (name, duration) in &self.clips {
            writeln!(f, "  clip {name:?} {duration:.3}s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lavaworld_anim::{AnimationClip, NodeHierarchy};
    use lavaworld_assets::{MeshData, MeshInstance, Primitive, SkinnedVertex};
    use lavaworld_kernel::{ClockTick, CreatureStatus, SceneConfig};

    fn scene(count: usize) -> LavaScene {
        let mut config = SceneConfig::default();
        config.rain.count = count;
        config.seed = Some(11);
        config.creature.path = None;
        LavaScene::new(config)
    }

    fn report(frame: u64, drawn: bool) -> FrameReport {
        FrameReport {
            frame,
            tick: ClockTick {
                elapsed: 1.5,
                delta: 0.25,
            },
            drawn,
            creature: CreatureStatus::Disabled,
        }
    }

    #[test]
    fn summary_reflects_scene() {
        let scene = scene(32);
        let summary = FrameInspector::summary(&scene, &report(3, true));
        assert_eq!(summary.frame, 3);
        assert_eq!(summary.seed, 11);
        assert_eq!(summary.rain_particles, 32);
        assert!(summary.rain_lowest <= summary.rain_highest);
        assert!(summary.rain_lowest >= 0.0 && summary.rain_highest <= 50.0);
        assert_eq!(summary.creature, "disabled");
        assert!(summary.mixer_time.is_none());
    }

    #[test]
    fn summary_without_rain() {
        let summary = FrameInspector::summary(&scene(0), &report(1, true));
        assert_eq!(summary.rain_particles, 0);
        assert_eq!((summary.rain_lowest, summary.rain_highest), (0.0, 0.0));
    }

    #[test]
    fn summary_display() {
        let s = FrameInspector::summary(&scene(4), &report(7, false)).to_string();
        assert!(s.starts_with("Frame 7: t=1.500s"));
        assert!(s.contains("rain=4"));
        assert!(s.ends_with("(draw failed)"));
    }

    #[test]
    fn asset_info_counts() {
        let vertex = SkinnedVertex {
            position: [0.0; 3],
            normal: [0.0, 1.0, 0.0],
            joints: [0; 4],
            weights: [1.0, 0.0, 0.0, 0.0],
        };
        let asset = CreatureAsset {
            source: "blob.glb".into(),
            hierarchy: Arc::new(NodeHierarchy::single_root("root")),
            meshes: vec![MeshData {
                name: "blob".into(),
                primitives: vec![Primitive {
                    vertices: vec![vertex; 4],
                    indices: vec![0, 1, 2, 2, 3, 0],
                    base_color: [1.0; 4],
                }],
            }],
            instances: vec![MeshInstance {
                node: 0,
                mesh: 0,
                skin: None,
            }],
            skins: Vec::new(),
            clips: vec![Arc::new(AnimationClip::new("idle", Vec::new()))],
        };

        let info = FrameInspector::asset(&asset);
        assert_eq!(info.nodes, 1);
        assert_eq!(info.vertices, 4);
        assert_eq!(info.triangles, 2);
        assert_eq!(info.joints, 1);
        assert_eq!(info.clips, vec![("idle".to_string(), 0.0)]);
        assert!(info.to_string().contains("clip \"idle\""));
    }
}
