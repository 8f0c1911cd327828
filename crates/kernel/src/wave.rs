use lavaworld_common::Rgb;

use crate::config::WaveConfig;

/// Gain of the x-axis sine term.
pub const X_GAIN: f32 = 0.8;
/// How much faster the z-axis term advances with time.
pub const Z_TIME_RATE: f32 = 1.5;
/// Gain of the z-axis cosine term.
pub const Z_GAIN: f32 = 0.6;

/// Values the terrain shader reads each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveUniforms {
    pub time: f32,
    pub wave_height: f32,
    pub wave_frequency: f32,
    pub deep_color: Rgb,
    pub glow_color: Rgb,
}

/// Vertical displacement of the lava surface.
///
/// The GPU evaluates the same formula per vertex; this copy exists so the
/// surface can be sampled and tested on the CPU.
#[derive(Debug, Clone)]
pub struct WaveField {
    uniforms: WaveUniforms,
}

impl WaveField {
    pub fn new(config: &WaveConfig) -> Self {
        Self {
            uniforms: WaveUniforms {
                time: 0.0,
                wave_height: config.height,
                wave_frequency: config.frequency,
                deep_color: config.deep_color,
                glow_color: config.glow_color,
            },
        }
    }

    pub fn set_time(&mut self, elapsed: f64) {
        self.uniforms.time = elapsed as f32;
    }

    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    pub fn uniforms(&self) -> &WaveUniforms {
        &self.uniforms
    }

    /// Height of the surface at local `(x, z)` for the current time.
    pub fn displacement(&self, x: f32, z: f32) -> f32 {
        wave_height(
            x,
            z,
            self.uniforms.time,
            self.uniforms.wave_height,
            self.uniforms.wave_frequency,
        )
    }

    /// Surface colour at texture coordinate `(u, v)`.
    pub fn surface_color(&self, u: f32, v: f32) -> Rgb {
        let flow = (v * 10.0 + u * 5.0).sin() * 0.5 + 0.5;
        let (a, b) = (self.uniforms.deep_color, self.uniforms.glow_color);
        Rgb::new(
            a.r + (b.r - a.r) * flow,
            a.g + (b.g - a.g) * flow,
            a.b + (b.b - a.b) * flow,
        )
    }
}

pub fn wave_height(x: f32, z: f32, time: f32, height: f32, frequency: f32) -> f32 {
    (x * frequency + time).sin() * height * X_GAIN
        + (z * frequency + time * Z_TIME_RATE).cos() * height * Z_GAIN
}
