use std::fmt::Display;

use crate::camera::Camera;
use crate::clock::{ClockTick, InstantSource, SimulationClock, TimeSource};
use crate::creature::CreatureStatus;
use crate::scene::LavaScene;

/// Issues the single composite draw of a frame.
pub trait DrawTarget {
    type Error: Display;

    fn draw(
        &mut self,
        scene: &LavaScene,
        camera: &Camera,
        tick: &ClockTick,
    ) -> Result<(), Self::Error>;
}

/// Host hook that arranges for the next frame to run.
pub trait FrameScheduler {
    fn request_next_frame(&self);
}

impl<F: Fn()> FrameScheduler for F {
    fn request_next_frame(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Unstarted,
    Running,
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 1-based index of the frame.
    pub frame: u64,
    pub tick: ClockTick,
    pub drawn: bool,
    pub creature: CreatureStatus,
}

/// Drives the scene one frame at a time in a fixed step order.
#[derive(Debug)]
pub struct FrameOrchestrator<S = InstantSource> {
    clock: SimulationClock<S>,
    scene: LavaScene,
    phase: FramePhase,
    frames: u64,
    failed_draws: u64,
}

impl FrameOrchestrator<InstantSource> {
    pub fn with_wall_clock(scene: LavaScene) -> Self {
        Self::new(scene, SimulationClock::wall())
    }
}

impl<S: TimeSource> FrameOrchestrator<S> {
    pub fn new(scene: LavaScene, clock: SimulationClock<S>) -> Self {
        Self {
            clock,
            scene,
            phase: FramePhase::Unstarted,
            frames: 0,
            failed_draws: 0,
        }
    }

    /// Run one iteration of the loop.
    ///
    /// Draw failures are logged and counted; they never abort the frame or
    /// prevent the next one from being requested.
    pub fn run_frame<D: DrawTarget>(
        &mut self,
        camera: &Camera,
        target: &mut D,
        scheduler: &impl FrameScheduler,
    ) -> FrameReport {
        if self.phase == FramePhase::Unstarted {
            tracing::info!("frame loop started");
            self.phase = FramePhase::Running;
        }
        self.frames += 1;
        let _span = tracing::info_span!("frame", n = self.frames).entered();

        let tick = self.clock.tick();
        self.scene.wave_mut().set_time(tick.elapsed);
        self.scene.rain_mut().advance();
        let light = self.scene.light().state_at(tick.elapsed);
        self.scene.set_light_state(light);
        let creature = self.scene.creature_mut();
        creature.poll_pending();
        creature.advance(tick.delta);

        let drawn = match target.draw(&self.scene, camera, &tick) {
            Ok(()) => true,
            Err(e) => {
                self.failed_draws += 1;
                tracing::warn!(frame = self.frames, error = %e, "draw failed");
                false
            }
        };

        scheduler.request_next_frame();
        tracing::trace!(elapsed = tick.elapsed, delta = tick.delta, drawn, "frame complete");

        FrameReport {
            frame: self.frames,
            tick,
            drawn,
            creature: self.scene.creature().status().clone(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failed_draws(&self) -> u64 {
        self.failed_draws
    }

    pub fn scene(&self) -> &LavaScene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut LavaScene {
        &mut self.scene
    }

    pub fn clock(&self) -> &SimulationClock<S> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimulationClock<S> {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualSource;
    use crate::config::SceneConfig;
    use lavaworld_assets::{AssetError, PendingAsset};
    use std::cell::Cell;

    /// Records what the scene looked like at draw time.
    #[derive(Default)]
    struct Recorder {
        draws: Vec<(f32, f32, glam::Vec3)>,
        fail_next: bool,
    }

    impl DrawTarget for Recorder {
        type Error = String;

        fn draw(
            &mut self,
            scene: &LavaScene,
            _camera: &Camera,
            _tick: &ClockTick,
        ) -> Result<(), String> {
            if std::mem::take(&mut self.fail_next) {
                return Err("surface lost".into());
            }
            self.draws.push((
                scene.wave().time(),
                scene.rain().positions()[0].y,
                scene.light_state().position,
            ));
            Ok(())
        }
    }

    fn orchestrator() -> FrameOrchestrator<ManualSource> {
        let mut config = SceneConfig::default();
        config.rain.count = 8;
        config.seed = Some(5);
        config.creature.path = None;
        FrameOrchestrator::new(
            LavaScene::new(config),
            SimulationClock::new(ManualSource::new(100.0)),
        )
    }

    #[test]
    fn frame_applies_steps_before_drawing() {
        let mut orch = orchestrator();
        let requests = Cell::new(0);
        let scheduler = || requests.set(requests.get() + 1);
        let camera = Camera::default();
        let mut target = Recorder::default();
        let y0 = orch.scene().rain().positions()[0].y;
        let v0 = orch.scene().rain().fall_speeds()[0];

        assert_eq!(orch.phase(), FramePhase::Unstarted);
        let first = orch.run_frame(&camera, &mut target, &scheduler);
        assert_eq!(orch.phase(), FramePhase::Running);
        assert_eq!(first.frame, 1);
        assert_eq!(first.tick.delta, 0.0);

        orch.clock_mut().source_mut().advance(2.0);
        let second = orch.run_frame(&camera, &mut target, &scheduler);
        assert_eq!(second.tick.elapsed, 2.0);
        assert_eq!(requests.get(), 2);

        let (time, _, light) = target.draws[1];
        assert_eq!(time, 2.0);
        assert_eq!(light, orch.scene().light().position_at(2.0));
        let expected_y = {
            let mut y = y0;
            for _ in 0..2 {
                y += v0;
                if y < 0.0 {
                    y = 50.0;
                }
            }
            y
        };
        assert_eq!(target.draws[1].1, expected_y);
    }

    #[test]
    fn failed_draw_does_not_stop_the_loop() {
        let mut orch = orchestrator();
        let requests = Cell::new(0);
        let scheduler = || requests.set(requests.get() + 1);
        let mut target = Recorder {
            fail_next: true,
            ..Recorder::default()
        };
        let report = orch.run_frame(&Camera::default(), &mut target, &scheduler);
        assert!(!report.drawn);
        assert_eq!(requests.get(), 1);

        let report = orch.run_frame(&Camera::default(), &mut target, &scheduler);
        assert!(report.drawn);
        assert_eq!(orch.failed_draws(), 1);
        assert_eq!(orch.frames(), 2);
    }

    #[test]
    fn creature_failure_leaves_other_state_running() {
        let mut orch = orchestrator();
        orch.scene_mut()
            .creature_mut()
            .begin_load(PendingAsset::ready("bad.glb", Err(AssetError::NoGeometry)));
        let mut target = Recorder::default();
        let report = orch.run_frame(&Camera::default(), &mut target, &|| {});
        assert!(matches!(report.creature, CreatureStatus::Failed(_)));

        orch.clock_mut().source_mut().advance(1.0);
        let report = orch.run_frame(&Camera::default(), &mut target, &|| {});
        assert!(report.drawn);
        assert_eq!(target.draws.len(), 2);
        assert_eq!(orch.scene().wave().time(), 1.0);
        assert!(orch.scene().creature().asset().is_none());

        let rain = orch.scene().rain().positions().to_vec();
        let light = *orch.scene().light_state();
        orch.scene_mut().creature_mut().advance(0.5);
        assert_eq!(orch.scene().rain().positions(), rain.as_slice());
        assert_eq!(orch.scene().light_state(), &light);
        assert_eq!(orch.scene().wave().time(), 1.0);
        assert!(matches!(orch.scene().creature().status(), CreatureStatus::Failed(_)));
    }

    #[test]
    fn backward_clock_never_rewinds_the_scene() {
        let mut orch = orchestrator();
        let mut target = Recorder::default();
        orch.clock_mut().source_mut().set(5.0);
        orch.run_frame(&Camera::default(), &mut target, &|| {});
        orch.clock_mut().source_mut().set(7.0);
        orch.run_frame(&Camera::default(), &mut target, &|| {});
        orch.clock_mut().source_mut().set(1.0);
        let report = orch.run_frame(&Camera::default(), &mut target, &|| {});
        assert_eq!(report.tick.delta, 0.0);
        assert_eq!(orch.scene().wave().time(), 2.0);
    }
}
