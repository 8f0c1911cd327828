//! Creature asset pipeline: glTF/GLB import and background loading.
//!
//! The renderer and the animation adapter consume a decoded
//! [`CreatureAsset`], never raw file contents.
//!
//! # Invariants
//! - Decoding happens off the frame thread; results arrive exactly once.
//! - Every animation clip in a loaded asset targets a node of its hierarchy.

mod import;
mod loader;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use lavaworld_anim::{AnimError, AnimationClip, NodeHierarchy, Skin};

pub use loader::{AssetLoader, PendingAsset};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid animation data: {0}")]
    Anim(#[from] AnimError),
    #[error("asset contains no drawable triangle geometry")]
    NoGeometry,
    #[error("unsupported asset source {0:?} (only local files are loaded)")]
    UnsupportedSource(String),
    #[error("asset loader thread exited without a result")]
    LoaderVanished,
}

/// Vertex layout shared with the skinned-mesh shader.
///
/// Rigid meshes use joint 0 with full weight.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

/// One triangle list with a flat base colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// A mesh placed on a node, optionally deformed by a skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInstance {
    pub node: usize,
    pub mesh: usize,
    pub skin: Option<usize>,
}

/// A decoded animated model: scene node tree, geometry, skins, and clips.
#[derive(Debug, Clone)]
pub struct CreatureAsset {
    pub source: String,
    pub hierarchy: Arc<NodeHierarchy>,
    pub meshes: Vec<MeshData>,
    pub instances: Vec<MeshInstance>,
    pub skins: Vec<Skin>,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl CreatureAsset {
    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.vertices.len())
            .sum()
    }

    pub fn index_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.indices.len())
            .sum()
    }

    pub fn clip_names(&self) -> Vec<&str> {
        self.clips.iter().map(|c| c.name()).collect()
    }

    /// Total joint matrices needed to pose every instance (rigid ones use one).
    pub fn palette_len(&self) -> usize {
        self.instances
            .iter()
            .map(|inst| {
                inst.skin
                    .and_then(|s| self.skins.get(s))
                    .map_or(1, Skin::joint_count)
            })
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two-node scene: a triangle on "body" that hovers up over one second.
    pub const HOVER_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "root", "children": [1] },
    { "name": "body", "mesh": 0, "translation": [0.0, 1.0, 0.0] }
  ],
  "meshes": [{ "name": "shell", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "animations": [{
    "name": "hover",
    "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
    "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }]
  }],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
      "min": [0.0], "max": [1.0] },
    { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
    { "buffer": 0, "byteOffset": 44, "byteLength": 24 }
  ],
  "buffers": [{
    "byteLength": 68,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAAAAAAAAQAAAAAA="
  }]
}"#;

    /// The same triangle without any animations.
    pub fn still_gltf() -> String {
        let start = HOVER_GLTF.find("\"animations\"").unwrap_or(0);
        let end = HOVER_GLTF.find("\"accessors\"").unwrap_or(0);
        format!("{}{}", &HOVER_GLTF[..start], &HOVER_GLTF[end..])
    }
}
