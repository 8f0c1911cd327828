use glam::Vec3;
use rand::Rng;

use crate::config::RainConfig;

/// Falling particles with fixed per-particle speeds.
///
/// Speeds are in units per frame, so the fall rate follows the frame rate.
/// Only y ever changes after initialisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RainParticleSet {
    positions: Vec<Vec3>,
    fall_speeds: Vec<f32>,
    recycle_height: f32,
}

impl RainParticleSet {
    pub fn initialize(config: &RainConfig, rng: &mut impl Rng) -> Self {
        let h = config.half_extent.abs();
        let mut positions = Vec::with_capacity(config.count);
        let mut fall_speeds = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            positions.push(Vec3::new(
                uniform(rng, -h, h),
                uniform(rng, 0.0, config.ceiling),
                uniform(rng, -h, h),
            ));
            let lo = config.min_speed.min(config.max_speed);
            let hi = config.min_speed.max(config.max_speed);
            fall_speeds.push(-uniform(rng, lo, hi));
        }
        tracing::debug!(count = config.count, "initialized rain particles");
        Self {
            positions,
            fall_speeds,
            recycle_height: config.recycle_height,
        }
    }

    /// Move every particle down by its speed, recycling those below zero.
    pub fn advance(&mut self) {
        for (p, v) in self.positions.iter_mut().zip(&self.fall_speeds) {
            p.y += v;
            if p.y < 0.0 {
                p.y = self.recycle_height;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-particle y change per frame; always negative.
    pub fn fall_speeds(&self) -> &[f32] {
        &self.fall_speeds
    }

    pub fn recycle_height(&self) -> f32 {
        self.recycle_height
    }
}

/// Uniform sample in `[lo, hi]`, collapsing to `lo` for empty or invalid ranges.
fn uniform(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rain(count: usize, seed: u64) -> RainParticleSet {
        let config = RainConfig {
            count,
            ..RainConfig::default()
        };
        RainParticleSet::initialize(&config, &mut Pcg32::seed_from_u64(seed))
    }

    #[test]
    fn initial_positions_respect_bounds() {
        let r = rain(2_000, 1);
        assert_eq!(r.len(), 2_000);
        for (p, v) in r.positions().iter().zip(r.fall_speeds()) {
            assert!((-50.0..=50.0).contains(&p.x));
            assert!((-50.0..=50.0).contains(&p.z));
            assert!((0.0..=50.0).contains(&p.y));
            assert!((-0.7..=-0.2).contains(v));
        }
    }

    #[test]
    fn same_seed_same_rain() {
        assert_eq!(rain(100, 9), rain(100, 9));
        assert_ne!(rain(100, 9), rain(100, 10));
    }

    #[test]
    fn empty_set_advances_without_effect() {
        let mut r = rain(0, 3);
        r.advance();
        assert!(r.is_empty());
    }

    #[test]
    fn particle_below_zero_recycles() {
        let mut r = RainParticleSet {
            positions: vec![Vec3::new(1.0, 0.3, 2.0), Vec3::new(0.0, 10.0, 0.0)],
            fall_speeds: vec![-0.5, -0.5],
            recycle_height: 50.0,
        };
        r.advance();
        assert_eq!(r.positions()[0], Vec3::new(1.0, 50.0, 2.0));
        assert_eq!(r.positions()[1].y, 9.5);
    }

    #[test]
    fn landing_exactly_on_zero_stays() {
        let mut r = RainParticleSet {
            positions: vec![Vec3::new(0.0, 0.5, 0.0)],
            fall_speeds: vec![-0.5],
            recycle_height: 50.0,
        };
        r.advance();
        assert_eq!(r.positions()[0].y, 0.0);
    }

    #[test]
    fn recycle_height_is_independent_of_ceiling() {
        let config = RainConfig {
            count: 50,
            ceiling: 5.0,
            recycle_height: 20.0,
            ..RainConfig::default()
        };
        let mut r = RainParticleSet::initialize(&config, &mut Pcg32::seed_from_u64(4));
        for _ in 0..100 {
            r.advance();
        }
        assert!(r.positions().iter().all(|p| (0.0..=20.0).contains(&p.y)));
    }

    proptest! {
        #[test]
        fn advance_keeps_invariants(seed in any::<u64>(), count in 0usize..200, frames in 1usize..300) {
            let mut r = rain(count, seed);
            let xz: Vec<(f32, f32)> = r.positions().iter().map(|p| (p.x, p.z)).collect();
            for _ in 0..frames {
                let before: Vec<f32> = r.positions().iter().map(|p| p.y).collect();
                r.advance();
                prop_assert_eq!(r.len(), count);
                prop_assert_eq!(r.fall_speeds().len(), count);
                for ((p, v), y0) in r.positions().iter().zip(r.fall_speeds()).zip(&before) {
                    prop_assert!((0.0..=50.0).contains(&p.y));
                    if y0 + v < 0.0 {
                        prop_assert_eq!(p.y, 50.0);
                    } else {
                        prop_assert_eq!(p.y, y0 + v);
                    }
                }
            }
            let after: Vec<(f32, f32)> = r.positions().iter().map(|p| (p.x, p.z)).collect();
            prop_assert_eq!(xz, after);
        }
    }
}
