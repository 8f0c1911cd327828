/// Per-frame uniforms shared by every pipeline. Must match `FrameUniforms` in gpu.rs.
const FRAME_UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    // x: time, y: height, z: frequency
    wave: vec4<f32>,
    deep_color: vec4<f32>,
    glow_color: vec4<f32>,
    // xyz: position, w: range
    light_pos: vec4<f32>,
    // rgb: colour, w: intensity
    light_color: vec4<f32>,
    sky_top: vec4<f32>,
    sky_bottom: vec4<f32>,
    // rgb: colour, w: opacity
    rain_color: vec4<f32>,
    // x: particle size
    rain_params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

const SKY_BODY: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> SkyOutput {
    var out: SkyOutput;
    out.clip_position = frame.view_proj * vec4<f32>(position, 1.0);
    out.world_pos = position;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let h = normalize(in.world_pos).y;
    return vec4<f32>(mix(frame.sky_bottom.rgb, frame.sky_top.rgb, max(h, 0.0)), 1.0);
}
"#;

const LAVA_BODY: &str = r#"
struct LavaOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_lava(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> LavaOutput {
    let t = frame.wave.x;
    let height = frame.wave.y;
    let freq = frame.wave.z;
    var pos = position;
    pos.y += sin(pos.x * freq + t) * height * 0.8;
    pos.y += cos(pos.z * freq + t * 1.5) * height * 0.6;

    var out: LavaOutput;
    out.clip_position = frame.view_proj * vec4<f32>(pos, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_lava(in: LavaOutput) -> @location(0) vec4<f32> {
    let flow = sin(in.uv.y * 10.0 + in.uv.x * 5.0) * 0.5 + 0.5;
    return vec4<f32>(mix(frame.deep_color.rgb, frame.glow_color.rgb, flow), 1.0);
}
"#;

const CREATURE_BODY: &str = r#"
struct Draw {
    base_color: vec4<f32>,
    palette_offset: u32,
};

@group(1) @binding(0)
var<storage, read> palette: array<mat4x4<f32>>;
@group(1) @binding(1)
var<uniform> draw_info: Draw;

struct SkinnedVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) joints: vec4<u32>,
    @location(3) weights: vec4<f32>,
};

struct CreatureOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_creature(v: SkinnedVertex) -> CreatureOutput {
    let o = draw_info.palette_offset;
    let skin = palette[o + v.joints.x] * v.weights.x
        + palette[o + v.joints.y] * v.weights.y
        + palette[o + v.joints.z] * v.weights.z
        + palette[o + v.joints.w] * v.weights.w;
    let world = skin * vec4<f32>(v.position, 1.0);

    var out: CreatureOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normalize((skin * vec4<f32>(v.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_creature(in: CreatureOutput) -> @location(0) vec4<f32> {
    let to_light = frame.light_pos.xyz - in.world_pos;
    let d = length(to_light);
    let falloff = pow(clamp(1.0 - d / frame.light_pos.w, 0.0, 1.0), 2.0);
    let diffuse = max(dot(in.world_normal, to_light / max(d, 1e-4)), 0.0);
    let light = frame.light_color.rgb * frame.light_color.w * diffuse * falloff;
    let ambient = vec3<f32>(0.25);
    return vec4<f32>(draw_info.base_color.rgb * (ambient + light), draw_info.base_color.a);
}
"#;

const RAIN_BODY: &str = r#"
struct RainOutput {
    @builtin(position) clip_position: vec4<f32>,
};

@vertex
fn vs_rain(@location(0) corner: vec2<f32>, @location(1) center: vec3<f32>) -> RainOutput {
    let size = frame.rain_params.x;
    let offset = (frame.camera_right.xyz * corner.x + frame.camera_up.xyz * corner.y) * size;
    var out: RainOutput;
    out.clip_position = frame.view_proj * vec4<f32>(center + offset, 1.0);
    return out;
}

@fragment
fn fs_rain(in: RainOutput) -> @location(0) vec4<f32> {
    return frame.rain_color;
}
"#;

pub fn sky_shader() -> String {
    format!("{FRAME_UNIFORMS}{SKY_BODY}")
}

pub fn lava_shader() -> String {
    format!("{FRAME_UNIFORMS}{LAVA_BODY}")
}

pub fn creature_shader() -> String {
    format!("{FRAME_UNIFORMS}{CREATURE_BODY}")
}

pub fn rain_shader() -> String {
    format!("{FRAME_UNIFORMS}{RAIN_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_declares_its_entry_points() {
        for (src, entries) in [
            (sky_shader(), ["vs_sky", "fs_sky"]),
            (lava_shader(), ["vs_lava", "fs_lava"]),
            (creature_shader(), ["vs_creature", "fs_creature"]),
            (rain_shader(), ["vs_rain", "fs_rain"]),
        ] {
            assert!(src.contains("var<uniform> frame: Frame"));
            for entry in entries {
                assert!(src.contains(&format!("fn {entry}(")), "missing {entry}");
            }
        }
    }

    #[test]
    fn lava_shader_uses_wave_constants() {
        let src = lava_shader();
        assert!(src.contains("height * 0.8"));
        assert!(src.contains("t * 1.5"));
        assert!(src.contains("height * 0.6"));
    }
}
