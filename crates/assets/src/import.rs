use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use lavaworld_anim::{
    AnimationClip, Channel, ChannelTarget, Interpolation, Node, NodeHierarchy, Skin, Track,
};
use lavaworld_common::Transform;

use crate::{AssetError, CreatureAsset, MeshData, MeshInstance, Primitive, SkinnedVertex};

impl CreatureAsset {
    /// Import a `.glb` or `.gltf` file from disk.
    ///
    /// External buffers of a `.gltf` are resolved relative to its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        if source.starts_with("http://") || source.starts_with("https://") {
            return Err(AssetError::UnsupportedSource(source));
        }
        let _span = tracing::info_span!("import_gltf", %source).entered();
        let bytes = std::fs::read(path)?;
        decode(&bytes, path.parent(), source)
    }

    /// Import from an in-memory GLB or self-contained glTF document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetError> {
        decode(bytes, None, "<memory>".into())
    }
}

fn decode(bytes: &[u8], base: Option<&Path>, source: String) -> Result<CreatureAsset, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let hierarchy = Arc::new(load_hierarchy(&document)?);
    let meshes = load_meshes(&document, &buffers);
    if meshes.iter().all(|m| m.primitives.is_empty()) {
        return Err(AssetError::NoGeometry);
    }
    let instances = document
        .nodes()
        .filter_map(|node| {
            node.mesh().map(|mesh| MeshInstance {
                node: node.index(),
                mesh: mesh.index(),
                skin: node.skin().map(|s| s.index()),
            })
        })
        .collect();
    let skins = load_skins(&document, &buffers)?;
    let clips = load_clips(&document, &buffers)?;

    tracing::debug!(
        nodes = hierarchy.len(),
        meshes = meshes.len(),
        skins = skins.len(),
        clips = clips.len(),
        "decoded glTF document"
    );

    Ok(CreatureAsset {
        source,
        hierarchy,
        meshes,
        instances,
        skins,
        clips,
    })
}

fn load_hierarchy(document: &gltf::Document) -> Result<NodeHierarchy, AssetError> {
    let mut nodes: Vec<Node> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            Node {
                name: node
                    .name()
                    .map_or_else(|| format!("node_{}", node.index()), str::to_string),
                parent: None,
                rest: Transform {
                    position: Vec3::from(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from(s),
                },
            }
        })
        .collect();
    for node in document.nodes() {
        for child in node.children() {
            nodes[child.index()].parent = Some(node.index());
        }
    }
    Ok(NodeHierarchy::new(nodes)?)
}

fn load_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<MeshData> {
    document
        .meshes()
        .map(|mesh| {
            let name = mesh
                .name()
                .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);
            let primitives = mesh
                .primitives()
                .filter_map(|primitive| load_primitive(&name, &primitive, buffers))
                .collect();
            MeshData { name, primitives }
        })
        .collect()
}

fn load_primitive(
    mesh_name: &str,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Option<Primitive> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        tracing::warn!(mesh = mesh_name, mode = ?primitive.mode(), "skipping non-triangle primitive");
        return None;
    }
    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let Some(positions) = reader.read_positions() else {
        tracing::warn!(mesh = mesh_name, "skipping primitive without positions");
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let count = positions.len();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; count]);
    let joints: Vec<[u32; 4]> = reader
        .read_joints(0)
        .map(|j| j.into_u16().map(|j| j.map(u32::from)).collect())
        .unwrap_or_else(|| vec![[0; 4]; count]);
    let weights: Vec<[f32; 4]> = reader
        .read_weights(0)
        .map(|w| w.into_f32().collect())
        .unwrap_or_else(|| vec![[1.0, 0.0, 0.0, 0.0]; count]);

    let vertices = (0..count)
        .map(|i| SkinnedVertex {
            position: positions[i],
            normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            joints: joints.get(i).copied().unwrap_or([0; 4]),
            weights: normalize_weights(weights.get(i).copied().unwrap_or([1.0, 0.0, 0.0, 0.0])),
        })
        .collect();
    let indices = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..count as u32).collect());
    let base_color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    Some(Primitive {
        vertices,
        indices,
        base_color,
    })
}

/// Weights that do not sum to one would shrink or inflate the skinned mesh.
fn normalize_weights(w: [f32; 4]) -> [f32; 4] {
    let sum: f32 = w.iter().sum();
    if sum > f32::EPSILON {
        w.map(|x| x / sum)
    } else {
        [1.0, 0.0, 0.0, 0.0]
    }
}

fn load_skins(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<Skin>, AssetError> {
    document
        .skins()
        .map(|skin| {
            let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let reader = skin.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            match reader.read_inverse_bind_matrices() {
                Some(ibms) => {
                    let ibms = ibms.map(|m| Mat4::from_cols_array_2d(&m)).collect();
                    Ok(Skin::new(joints, ibms)?)
                }
                None => Ok(Skin::with_identity_binds(joints)),
            }
        })
        .collect()
}

fn load_clips(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<Arc<AnimationClip>>, AssetError> {
    let mut clips = Vec::new();
    for animation in document.animations() {
        let name = animation
            .name()
            .map_or_else(|| format!("clip_{}", animation.index()), str::to_string);
        let mut channels = Vec::new();
        for channel in animation.channels() {
            let reader = channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let node = channel.target().node().index();
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs())
            else {
                tracing::warn!(clip = %name, node, "skipping channel with unreadable samplers");
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let target = match outputs {
                ReadOutputs::Translations(values) => ChannelTarget::Translation(Track::new(
                    times,
                    values.map(Vec3::from).collect(),
                    interpolation,
                )?),
                ReadOutputs::Rotations(values) => ChannelTarget::Rotation(Track::new(
                    times,
                    values.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                )?),
                ReadOutputs::Scales(values) => ChannelTarget::Scale(Track::new(
                    times,
                    values.map(Vec3::from).collect(),
                    interpolation,
                )?),
                ReadOutputs::MorphTargetWeights(_) => {
                    tracing::debug!(clip = %name, node, "morph target weights are not animated");
                    continue;
                }
            };
            channels.push(Channel { node, target });
        }
        clips.push(Arc::new(AnimationClip::new(name, channels)));
    }
    Ok(clips)
}
