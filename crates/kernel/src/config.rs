use std::path::{Path, PathBuf};

use glam::Vec3;
use lavaworld_common::Rgb;
use serde::{Deserialize, Serialize};

/// Largest subdivision count accepted for the terrain and the sky dome.
///
/// Keeps `(segments + 1)^2` vertices addressable by `u32` indices.
pub const MAX_SEGMENTS: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable of the scene. Missing sections and fields take defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub wave: WaveConfig,
    pub terrain: TerrainConfig,
    pub rain: RainConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub sky: SkyConfig,
    pub creature: CreatureConfig,
    /// Rain RNG seed. Random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub height: f32,
    pub frequency: f32,
    pub deep_color: Rgb,
    pub glow_color: Rgb,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            height: 0.3,
            frequency: 0.8,
            deep_color: Rgb::from_hex(0x8b0000),
            glow_color: Rgb::from_hex(0xff4500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Edge length of the square lava plane.
    pub size: f32,
    /// Subdivisions along each edge.
    pub segments: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 75.0,
            segments: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub count: usize,
    /// Particles spawn with x and z in `[-half_extent, half_extent]`.
    pub half_extent: f32,
    /// Particles spawn with y in `[0, ceiling]`.
    pub ceiling: f32,
    /// Fall speed magnitudes, in units per frame.
    pub min_speed: f32,
    pub max_speed: f32,
    /// Height a particle jumps back to after falling below zero.
    pub recycle_height: f32,
    pub color: Rgb,
    pub size: f32,
    pub opacity: f32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            half_extent: 50.0,
            ceiling: 50.0,
            min_speed: 0.2,
            max_speed: 0.7,
            recycle_height: 50.0,
            color: Rgb::from_hex(0xff4500),
            size: 0.5,
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub radius: f32,
    /// Radians per second.
    pub angular_speed: f32,
    pub height: f32,
    pub color: Rgb,
    pub intensity: f32,
    /// Distance at which the point light fades out completely.
    pub range: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            angular_speed: 0.5,
            height: 10.0,
            color: Rgb::from_hex(0xff4500),
            intensity: 8.0,
            range: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 5.0, 15.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub radius: f32,
    pub segments: u32,
    pub top_color: Rgb,
    pub bottom_color: Rgb,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            radius: 100.0,
            segments: 32,
            top_color: Rgb::from_hex(0x4b0082),
            bottom_color: Rgb::from_hex(0xff4500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    /// Local `.glb`/`.gltf` file. `None` disables the creature.
    pub path: Option<PathBuf>,
    pub position: Vec3,
    pub scale: f32,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("assets/creature.glb")),
            position: Vec3::new(0.0, 1.0, 0.0),
            scale: 7.0,
        }
    }
}

impl SceneConfig {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, v: f32) -> Result<(), ConfigError> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {v}")))
            }
        }
        fn non_negative(name: &str, v: f32) -> Result<(), ConfigError> {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must not be negative, got {v}")))
            }
        }

        positive("wave.height", self.wave.height)?;
        positive("wave.frequency", self.wave.frequency)?;

        positive("terrain.size", self.terrain.size)?;
        if !(1..=MAX_SEGMENTS).contains(&self.terrain.segments) {
            return Err(ConfigError::Invalid(format!(
                "terrain.segments must be in [1, {MAX_SEGMENTS}], got {}",
                self.terrain.segments
            )));
        }

        let rain = &self.rain;
        non_negative("rain.half_extent", rain.half_extent)?;
        non_negative("rain.ceiling", rain.ceiling)?;
        non_negative("rain.recycle_height", rain.recycle_height)?;
        positive("rain.min_speed", rain.min_speed)?;
        positive("rain.max_speed", rain.max_speed)?;
        if rain.min_speed > rain.max_speed {
            return Err(ConfigError::Invalid(format!(
                "rain speed range is inverted: {} > {}",
                rain.min_speed, rain.max_speed
            )));
        }
        positive("rain.size", rain.size)?;
        if !(0.0..=1.0).contains(&rain.opacity) {
            return Err(ConfigError::Invalid(format!(
                "rain.opacity must be in [0, 1], got {}",
                rain.opacity
            )));
        }

        non_negative("light.radius", self.light.radius)?;
        non_negative("light.intensity", self.light.intensity)?;
        positive("light.range", self.light.range)?;

        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        positive("camera.near", cam.near)?;
        if !(cam.far > cam.near) || !cam.far.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "camera.far ({}) must be beyond camera.near ({})",
                cam.far, cam.near
            )));
        }
        if cam.position == cam.target {
            return Err(ConfigError::Invalid(
                "camera.position and camera.target must differ".into(),
            ));
        }

        positive("sky.radius", self.sky.radius)?;
        if !(3..=MAX_SEGMENTS).contains(&self.sky.segments) {
            return Err(ConfigError::Invalid(format!(
                "sky.segments must be in [3, {MAX_SEGMENTS}], got {}",
                self.sky.segments
            )));
        }

        positive("creature.scale", self.creature.scale)?;
        Ok(())
    }
}
