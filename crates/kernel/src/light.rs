use glam::Vec3;
use lavaworld_common::Rgb;

use crate::config::LightConfig;

/// Point light written fresh every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub color: Rgb,
    pub intensity: f32,
    pub range: f32,
}

/// A point light circling the origin at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitingLight {
    pub radius: f32,
    pub angular_speed: f32,
    pub height: f32,
    pub color: Rgb,
    pub intensity: f32,
    pub range: f32,
}

impl OrbitingLight {
    pub fn new(config: &LightConfig) -> Self {
        Self {
            radius: config.radius,
            angular_speed: config.angular_speed,
            height: config.height,
            color: config.color,
            intensity: config.intensity,
            range: config.range,
        }
    }

    /// Position on the orbit at `elapsed` seconds. Pure.
    pub fn position_at(&self, elapsed: f64) -> Vec3 {
        let angle = elapsed * f64::from(self.angular_speed);
        let r = f64::from(self.radius);
        Vec3::new((r * angle.sin()) as f32, self.height, (r * angle.cos()) as f32)
    }

    pub fn state_at(&self, elapsed: f64) -> LightState {
        LightState {
            position: self.position_at(elapsed),
            color: self.color,
            intensity: self.intensity,
            range: self.range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> OrbitingLight {
        OrbitingLight::new(&LightConfig::default())
    }

    #[test]
    fn starts_on_positive_z() {
        assert_eq!(light().position_at(0.0), Vec3::new(0.0, 10.0, 10.0));
    }

    #[test]
    fn quarter_orbit() {
        // angle = pi/2 after pi seconds at 0.5 rad/s
        let p = light().position_at(std::f64::consts::PI);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
        assert_eq!(p.y, 10.0);
    }

    #[test]
    fn stays_on_circle() {
        let l = light();
        for i in 0..50 {
            let p = l.position_at(i as f64 * 0.37);
            assert!((Vec3::new(p.x, 0.0, p.z).length() - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn position_is_pure() {
        let l = light();
        assert_eq!(l.position_at(12.5), l.position_at(12.5));
        assert_eq!(l.state_at(3.0).position, l.position_at(3.0));
    }
}
