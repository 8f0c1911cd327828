use lavaworld_assets::AssetLoader;
use lavaworld_common::Transform;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::SceneConfig;
use crate::creature::CreatureAnimation;
use crate::light::{LightState, OrbitingLight};
use crate::rain::RainParticleSet;
use crate::wave::WaveField;

/// All time-varying scene state, one owner per component.
#[derive(Debug)]
pub struct LavaScene {
    config: SceneConfig,
    seed: u64,
    wave: WaveField,
    rain: RainParticleSet,
    light: OrbitingLight,
    light_state: LightState,
    creature: CreatureAnimation,
}

impl LavaScene {
    /// Build the scene. Does not start the creature load.
    pub fn new(config: SceneConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let rain = RainParticleSet::initialize(&config.rain, &mut rng);
        let light = OrbitingLight::new(&config.light);
        let placement =
            Transform::from_position_scale(config.creature.position, config.creature.scale);
        tracing::info!(seed, particles = rain.len(), "lava scene created");
        Self {
            wave: WaveField::new(&config.wave),
            light_state: light.state_at(0.0),
            light,
            rain,
            creature: CreatureAnimation::new(placement),
            seed,
            config,
        }
    }

    /// Kick off the background creature load if a model path is configured.
    pub fn start_creature_load(&mut self) {
        match &self.config.creature.path {
            Some(path) => self.creature.begin_load(AssetLoader::spawn(path)),
            None => tracing::info!("no creature model configured"),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Seed the rain was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn wave(&self) -> &WaveField {
        &self.wave
    }

    pub fn wave_mut(&mut self) -> &mut WaveField {
        &mut self.wave
    }

    pub fn rain(&self) -> &RainParticleSet {
        &self.rain
    }

    pub fn rain_mut(&mut self) -> &mut RainParticleSet {
        &mut self.rain
    }

    pub fn light(&self) -> &OrbitingLight {
        &self.light
    }

    pub fn light_state(&self) -> &LightState {
        &self.light_state
    }

    pub fn set_light_state(&mut self, state: LightState) {
        self.light_state = state;
    }

    pub fn creature(&self) -> &CreatureAnimation {
        &self.creature
    }

    pub fn creature_mut(&mut self) -> &mut CreatureAnimation {
        &mut self.creature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureStatus;

    fn config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.rain.count = 64;
        config.seed = Some(11);
        config.creature.path = None;
        config
    }

    #[test]
    fn seeded_scenes_match() {
        let a = LavaScene::new(config());
        let b = LavaScene::new(config());
        assert_eq!(a.seed(), 11);
        assert_eq!(a.rain(), b.rain());
    }

    #[test]
    fn unseeded_scene_records_its_seed() {
        let mut c = config();
        c.seed = None;
        let scene = LavaScene::new(c);
        let mut replay = config();
        replay.seed = Some(scene.seed());
        assert_eq!(LavaScene::new(replay).rain(), scene.rain());
    }

    #[test]
    fn light_starts_at_time_zero() {
        let scene = LavaScene::new(config());
        assert_eq!(scene.light_state().position, scene.light().position_at(0.0));
    }

    #[test]
    fn no_model_path_leaves_creature_disabled() {
        let mut scene = LavaScene::new(config());
        scene.start_creature_load();
        assert_eq!(scene.creature().status(), &CreatureStatus::Disabled);
    }

    #[test]
    fn creature_placement_follows_config() {
        let scene = LavaScene::new(config());
        let p = scene.creature().placement();
        assert_eq!(p.position, glam::Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(p.scale, glam::Vec3::splat(7.0));
    }
}
