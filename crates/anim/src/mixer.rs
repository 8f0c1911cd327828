use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use lavaworld_common::Transform;

use crate::clip::{AnimationClip, ChannelTarget};
use crate::hierarchy::{NodeHierarchy, Skin};
use crate::AnimError;

/// What an action does when it reaches the end of its clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Wrap back to the start forever.
    #[default]
    Repeat,
    /// Play through once, then stop contributing.
    Once,
}

/// Index of an action inside its mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

/// Playback state of one clip on one mixer.
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: Arc<AnimationClip>,
    time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    playing: bool,
}

impl ClipAction {
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Local time within the clip, in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let duration = self.clip.duration();
        self.time += dt * self.time_scale;
        match self.loop_mode {
            LoopMode::Repeat => {
                self.time = if duration > 0.0 {
                    self.time.rem_euclid(duration)
                } else {
                    0.0
                };
            }
            LoopMode::Once => {
                if self.time >= duration || self.time < 0.0 {
                    self.time = self.time.clamp(0.0, duration);
                    self.playing = false;
                }
            }
        }
    }
}

/// Local transforms for every node of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub locals: Vec<Transform>,
}

#[derive(Debug, Clone, Copy)]
struct Accum {
    translation: Vec3,
    translation_weight: f32,
    rotation: Quat,
    rotation_weight: f32,
    scale: Vec3,
    scale_weight: f32,
}

impl Default for Accum {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            translation_weight: 0.0,
            rotation: Quat::IDENTITY,
            rotation_weight: 0.0,
            scale: Vec3::ONE,
            scale_weight: 0.0,
        }
    }
}

/// Drives any number of clip actions over one node hierarchy.
///
/// Actions touching the same property are blended as a running weighted
/// average; when the summed weight is below one the rest pose fills the gap.
#[derive(Debug)]
pub struct AnimationMixer {
    hierarchy: Arc<NodeHierarchy>,
    actions: Vec<ClipAction>,
    time: f64,
    pose: Pose,
    globals: Vec<Mat4>,
    scratch: Vec<Accum>,
}

impl AnimationMixer {
    pub fn new(hierarchy: Arc<NodeHierarchy>) -> Self {
        let pose = Pose {
            locals: hierarchy.rest_pose(),
        };
        let mut globals = Vec::new();
        hierarchy.global_matrices(&pose.locals, &mut globals);
        let scratch = vec![Accum::default(); hierarchy.len()];
        Self {
            hierarchy,
            actions: Vec::new(),
            time: 0.0,
            pose,
            globals,
            scratch,
        }
    }

    /// Register a clip and return its (stopped) action.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>) -> Result<ActionId, AnimError> {
        if let Some(max) = clip.max_node() {
            if max >= self.hierarchy.len() {
                return Err(AnimError::NodeOutOfRange {
                    index: max,
                    len: self.hierarchy.len(),
                });
            }
        }
        self.actions.push(ClipAction {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            playing: false,
        });
        Ok(ActionId(self.actions.len() - 1))
    }

    pub fn action(&self, id: ActionId) -> Option<&ClipAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut ClipAction> {
        self.actions.get_mut(id.0)
    }

    pub fn set_loop(&mut self, id: ActionId, mode: LoopMode) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.loop_mode = mode;
        }
    }

    /// Start (or restart) an action from the beginning of its clip.
    pub fn play(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.time = 0.0;
            action.playing = true;
        }
    }

    pub fn stop(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.playing = false;
        }
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    pub fn playing_count(&self) -> usize {
        self.actions.iter().filter(|a| a.playing).count()
    }

    /// Total time fed through `update`.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn hierarchy(&self) -> &NodeHierarchy {
        &self.hierarchy
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Model-space matrix per node for the current pose.
    pub fn global_matrices(&self) -> &[Mat4] {
        &self.globals
    }

    /// Append the skinning palette for `skin` under the current pose.
    pub fn write_joint_matrices(&self, skin: &Skin, out: &mut Vec<Mat4>) {
        skin.write_joint_matrices(&self.globals, out);
    }

    /// Advance every playing action by `dt` seconds and re-evaluate the pose.
    ///
    /// Non-finite or negative deltas are ignored.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::trace!(dt, "ignoring invalid mixer delta");
            return;
        }
        self.time += f64::from(dt);

        for action in &mut self.actions {
            action.advance(dt);
        }
        self.evaluate();
    }

    fn evaluate(&mut self) {
        self.scratch.fill(Accum::default());

        for action in self.actions.iter().filter(|a| a.playing && a.weight > 0.0) {
            let w = action.weight;
            for channel in action.clip.channels() {
                let acc = &mut self.scratch[channel.node];
                match &channel.target {
                    ChannelTarget::Translation(track) => {
                        let v = track.sample(action.time);
                        let total = acc.translation_weight + w;
                        acc.translation = acc.translation.lerp(v, w / total);
                        acc.translation_weight = total;
                    }
                    ChannelTarget::Rotation(track) => {
                        let q = track.sample(action.time);
                        let total = acc.rotation_weight + w;
                        acc.rotation = if acc.rotation_weight == 0.0 {
                            q
                        } else {
                            acc.rotation.slerp(q, w / total)
                        };
                        acc.rotation_weight = total;
                    }
                    ChannelTarget::Scale(track) => {
                        let v = track.sample(action.time);
                        let total = acc.scale_weight + w;
                        acc.scale = acc.scale.lerp(v, w / total);
                        acc.scale_weight = total;
                    }
                }
            }
        }

        for (i, node) in self.hierarchy.nodes().iter().enumerate() {
            let acc = &self.scratch[i];
            let rest = node.rest;
            self.pose.locals[i] = Transform {
                position: blend(rest.position, acc.translation, acc.translation_weight),
                rotation: blend_rotation(rest.rotation, acc.rotation, acc.rotation_weight),
                scale: blend(rest.scale, acc.scale, acc.scale_weight),
            };
        }
        self.hierarchy
            .global_matrices(&self.pose.locals, &mut self.globals);
    }
}

fn blend(rest: Vec3, animated: Vec3, weight: f32) -> Vec3 {
    if weight <= 0.0 {
        rest
    } else if weight >= 1.0 {
        animated
    } else {
        rest.lerp(animated, weight)
    }
}

fn blend_rotation(rest: Quat, animated: Quat, weight: f32) -> Quat {
    if weight <= 0.0 {
        rest
    } else if weight >= 1.0 {
        animated
    } else {
        rest.slerp(animated, weight)
    }
}
