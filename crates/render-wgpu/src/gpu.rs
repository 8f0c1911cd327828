use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use lavaworld_assets::{CreatureAsset, SkinnedVertex};
use lavaworld_kernel::{Camera, LavaScene};
use wgpu::util::DeviceExt;

use crate::mesh::{self, PlaneVertex};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    wave: [f32; 4],
    deep_color: [f32; 4],
    glow_color: [f32; 4],
    light_pos: [f32; 4],
    light_color: [f32; 4],
    sky_top: [f32; 4],
    sky_bottom: [f32; 4],
    rain_color: [f32; 4],
    rain_params: [f32; 4],
}

impl FrameUniforms {
    fn new(scene: &LavaScene, camera: &Camera) -> Self {
        let wave = scene.wave().uniforms();
        let light = scene.light_state();
        let config = scene.config();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).to_array(),
            camera_right: camera.right().extend(0.0).to_array(),
            camera_up: camera.up().extend(0.0).to_array(),
            wave: [wave.time, wave.wave_height, wave.wave_frequency, 0.0],
            deep_color: wave.deep_color.with_w(1.0),
            glow_color: wave.glow_color.with_w(1.0),
            light_pos: light.position.extend(light.range).to_array(),
            light_color: light.color.with_w(light.intensity),
            sky_top: config.sky.top_color.with_w(1.0),
            sky_bottom: config.sky.bottom_color.with_w(1.0),
            rain_color: config.rain.color.with_w(config.rain.opacity),
            rain_params: [config.rain.size, 0.0, 0.0, 0.0],
        }
    }
}

/// Per-primitive creature uniforms. Must match `Draw` in the creature shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    base_color: [f32; 4],
    palette_offset: u32,
    _pad: [u32; 3],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    index_format: wgpu::IndexFormat,
}

impl GpuMesh {
    fn new<V: Pod>(device: &wgpu::Device, label: &str, vertices: &[V], indices: &[u32]) -> Self {
        Self::with_indices(
            device,
            label,
            bytemuck::cast_slice(vertices),
            bytemuck::cast_slice(indices),
            indices.len() as u32,
            wgpu::IndexFormat::Uint32,
        )
    }

    fn with_indices(
        device: &wgpu::Device,
        label: &str,
        vertices: &[u8],
        indices: &[u8],
        index_count: u32,
        index_format: wgpu::IndexFormat,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count,
            index_format,
        }
    }
}

struct CreatureDraw {
    mesh: GpuMesh,
    bind_group: wgpu::BindGroup,
}

struct CreatureGpu {
    draws: Vec<CreatureDraw>,
    palette_buffer: wgpu::Buffer,
    palette: Vec<Mat4>,
}

/// Pipeline settings that differ between the scene's passes.
struct PipelineDesc<'a> {
    label: &'a str,
    source: String,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    blend: wgpu::BlendState,
}

/// wgpu-based lava scene renderer.
pub struct WgpuRenderer {
    sky_pipeline: wgpu::RenderPipeline,
    lava_pipeline: wgpu::RenderPipeline,
    creature_pipeline: wgpu::RenderPipeline,
    rain_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    creature_layout: wgpu::BindGroupLayout,
    sky: GpuMesh,
    lava: GpuMesh,
    billboard: GpuMesh,
    rain_buffer: wgpu::Buffer,
    creature: Option<CreatureGpu>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &LavaScene,
    ) -> Self {
        let config = scene.config();

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let creature_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("creature_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let creature_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("creature_pipeline_layout"),
                bind_group_layouts: &[&frame_layout, &creature_layout],
                push_constant_ranges: &[],
            });

        let sky_pipeline = create_pipeline(
            device,
            &scene_layout,
            surface_format,
            PipelineDesc {
                label: "sky",
                source: shaders::sky_shader(),
                vs: "vs_sky",
                fs: "fs_sky",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                // Seen from inside.
                cull_mode: Some(wgpu::Face::Front),
                depth_write: false,
                blend: wgpu::BlendState::REPLACE,
            },
        );

        let lava_pipeline = create_pipeline(
            device,
            &scene_layout,
            surface_format,
            PipelineDesc {
                label: "lava",
                source: shaders::lava_shader(),
                vs: "vs_lava",
                fs: "fs_lava",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PlaneVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                cull_mode: None,
                depth_write: true,
                blend: wgpu::BlendState::REPLACE,
            },
        );

        let creature_pipeline = create_pipeline(
            device,
            &creature_pipeline_layout,
            surface_format,
            PipelineDesc {
                label: "creature",
                source: shaders::creature_shader(),
                vs: "vs_creature",
                fs: "fs_creature",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SkinnedVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Uint32x4,
                        3 => Float32x4,
                    ],
                }],
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                blend: wgpu::BlendState::ALPHA_BLENDING,
            },
        );

        let rain_pipeline = create_pipeline(
            device,
            &scene_layout,
            surface_format,
            PipelineDesc {
                label: "rain",
                source: shaders::rain_shader(),
                vs: "vs_rain",
                fs: "fs_rain",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<glam::Vec3>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x3],
                    },
                ],
                cull_mode: None,
                depth_write: false,
                blend: wgpu::BlendState::ALPHA_BLENDING,
            },
        );

        let (sky_verts, sky_indices) = mesh::sphere(config.sky.radius, config.sky.segments);
        let sky = GpuMesh::new(device, "sky", &sky_verts, &sky_indices);

        let (plane_verts, plane_indices) = mesh::plane(config.terrain.size, config.terrain.segments);
        let lava = GpuMesh::new(device, "lava", &plane_verts, &plane_indices);

        let billboard = GpuMesh::with_indices(
            device,
            "billboard",
            bytemuck::cast_slice(&mesh::BILLBOARD_CORNERS),
            bytemuck::cast_slice(&mesh::BILLBOARD_INDICES),
            mesh::BILLBOARD_INDICES.len() as u32,
            wgpu::IndexFormat::Uint16,
        );

        let rain_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rain_instance_buffer"),
            size: (scene.rain().len().max(1) * std::mem::size_of::<glam::Vec3>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::info!(
            terrain_vertices = plane_verts.len(),
            sky_vertices = sky_verts.len(),
            rain = scene.rain().len(),
            "scene GPU resources created"
        );

        Self {
            sky_pipeline,
            lava_pipeline,
            creature_pipeline,
            rain_pipeline,
            frame_buffer,
            frame_bind_group,
            creature_layout,
            sky,
            lava,
            billboard,
            rain_buffer,
            creature: None,
            depth_texture: create_depth_texture(device, width, height),
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: sky, lava, creature, rain.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &LavaScene,
        camera: &Camera,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(scene, camera)),
        );

        let rain = scene.rain().positions();
        if !rain.is_empty() {
            queue.write_buffer(&self.rain_buffer, 0, bytemuck::cast_slice(rain));
        }

        if self.creature.is_none() {
            if let Some(asset) = scene.creature().asset() {
                self.creature = Some(upload_creature(device, &self.creature_layout, asset));
            }
        }
        if let Some(creature) = &mut self.creature {
            creature.palette.clear();
            scene.creature().write_palette(&mut creature.palette);
            if !creature.palette.is_empty() {
                queue.write_buffer(
                    &creature.palette_buffer,
                    0,
                    bytemuck::cast_slice(&creature.palette),
                );
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            pass.set_pipeline(&self.sky_pipeline);
            draw_mesh(&mut pass, &self.sky, 1);

            pass.set_pipeline(&self.lava_pipeline);
            draw_mesh(&mut pass, &self.lava, 1);

            if let Some(creature) = &self.creature {
                pass.set_pipeline(&self.creature_pipeline);
                for draw in &creature.draws {
                    pass.set_bind_group(1, &draw.bind_group, &[]);
                    draw_mesh(&mut pass, &draw.mesh, 1);
                }
            }

            if !rain.is_empty() {
                pass.set_pipeline(&self.rain_pipeline);
                pass.set_vertex_buffer(1, self.rain_buffer.slice(..));
                draw_mesh(&mut pass, &self.billboard, rain.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh, instances: u32) {
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), mesh.index_format);
    pass.draw_indexed(0..mesh.index_count, 0, 0..instances);
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{}_shader", desc.label)),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{}_pipeline", desc.label)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Build vertex, index and uniform buffers for every creature primitive.
///
/// Palette offsets follow [`CreatureAsset::palette_len`]: one slot per joint
/// for skinned instances, one for rigid ones.
fn upload_creature(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    asset: &CreatureAsset,
) -> CreatureGpu {
    let palette_len = asset.palette_len().max(1);
    let palette_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("creature_palette_buffer"),
        size: (palette_len * std::mem::size_of::<Mat4>()) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut draws = Vec::new();
    let mut offset = 0u32;
    for instance in &asset.instances {
        let slots = instance
            .skin
            .and_then(|s| asset.skins.get(s))
            .map_or(1, |skin| skin.joint_count());
        for primitive in asset
            .meshes
            .get(instance.mesh)
            .map_or(&[][..], |m| m.primitives.as_slice())
        {
            if primitive.indices.is_empty() {
                continue;
            }
            let uniforms = DrawUniforms {
                base_color: primitive.base_color,
                palette_offset: offset,
                _pad: [0; 3],
            };
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("creature_draw_uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("creature_bind_group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: palette_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            });
            draws.push(CreatureDraw {
                mesh: GpuMesh::new(device, "creature", &primitive.vertices, &primitive.indices),
                bind_group,
            });
        }
        offset += slots as u32;
    }

    tracing::info!(
        draws = draws.len(),
        palette = palette_len,
        "creature uploaded to GPU"
    );
    CreatureGpu {
        draws,
        palette_buffer,
        palette: Vec::with_capacity(palette_len),
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavaworld_kernel::SceneConfig;

    fn scene() -> LavaScene {
        let mut config = SceneConfig::default();
        config.rain.count = 4;
        config.seed = Some(1);
        config.creature.path = None;
        LavaScene::new(config)
    }

    #[test]
    fn uniform_layouts_match_shaders() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 256);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 32);
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 56);
        assert_eq!(std::mem::size_of::<PlaneVertex>(), 20);
    }

    #[test]
    fn frame_uniforms_carry_scene_state() {
        let mut scene = scene();
        scene.wave_mut().set_time(2.5);
        let camera = Camera::default();
        let u = FrameUniforms::new(&scene, &camera);

        assert_eq!(u.wave, [2.5, 0.3, 0.8, 0.0]);
        assert_eq!(u.light_pos, [0.0, 10.0, 10.0, 50.0]);
        assert_eq!(u.light_color[3], 8.0);
        assert_eq!(u.rain_color[3], 0.8);
        assert_eq!(u.rain_params[0], 0.5);
        assert_eq!(u.camera_pos, [0.0, 5.0, 15.0, 1.0]);
        assert_eq!(u.view_proj, camera.view_projection().to_cols_array_2d());
    }
}
