use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use lavaworld_anim::AnimationMixer;
use lavaworld_assets::{AssetError, CreatureAsset, PendingAsset};
use lavaworld_common::Transform;

/// Lifecycle of the creature as seen by the frame loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatureStatus {
    /// No load was requested.
    Disabled,
    /// The asset is still decoding in the background.
    Loading,
    /// Loaded and animating `clips` clips.
    Animating { clips: usize },
    /// Loaded, but the asset has no animations.
    Static,
    /// Loading failed; the creature will never appear.
    Failed(String),
}

impl CreatureStatus {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Animating { .. } | Self::Static)
    }
}

impl fmt::Display for CreatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Loading => f.write_str("loading"),
            Self::Animating { clips } => write!(f, "animating ({clips} clips)"),
            Self::Static => f.write_str("static"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Bridges the asynchronously loaded creature to the frame clock.
///
/// The asset arrives at most once. Until then, and forever after a failure,
/// [`advance`](Self::advance) does nothing.
#[derive(Debug)]
pub struct CreatureAnimation {
    placement: Transform,
    pending: Option<PendingAsset>,
    asset: Option<Arc<CreatureAsset>>,
    mixer: Option<AnimationMixer>,
    rest_globals: Vec<Mat4>,
    status: CreatureStatus,
}

impl CreatureAnimation {
    pub fn new(placement: Transform) -> Self {
        Self {
            placement,
            pending: None,
            asset: None,
            mixer: None,
            rest_globals: Vec::new(),
            status: CreatureStatus::Disabled,
        }
    }

    /// Attach an in-flight load. Ignored once an outcome is known.
    pub fn begin_load(&mut self, pending: PendingAsset) {
        if self.status != CreatureStatus::Disabled {
            tracing::warn!(source = pending.source(), "creature load already requested");
            return;
        }
        tracing::info!(source = pending.source(), "loading creature model");
        self.pending = Some(pending);
        self.status = CreatureStatus::Loading;
    }

    /// Drain the pending load without blocking.
    pub fn poll_pending(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        match pending.poll() {
            Some(Ok(asset)) => {
                self.pending = None;
                self.on_asset_ready(asset);
            }
            Some(Err(e)) => {
                self.pending = None;
                self.on_asset_failed(&e);
            }
            None => {}
        }
    }

    pub fn on_asset_ready(&mut self, asset: CreatureAsset) {
        if self.asset.is_some() || matches!(self.status, CreatureStatus::Failed(_)) {
            tracing::warn!(source = %asset.source, "ignoring second creature asset");
            return;
        }
        tracing::info!(
            source = %asset.source,
            nodes = asset.hierarchy.len(),
            clips = asset.clips.len(),
            vertices = asset.vertex_count(),
            "creature model loaded"
        );

        asset
            .hierarchy
            .global_matrices(&asset.hierarchy.rest_pose(), &mut self.rest_globals);

        if asset.clips.is_empty() {
            tracing::warn!(source = %asset.source, "no animations found in creature model");
            self.status = CreatureStatus::Static;
        } else {
            let mut mixer = AnimationMixer::new(Arc::clone(&asset.hierarchy));
            for clip in &asset.clips {
                match mixer.clip_action(Arc::clone(clip)) {
                    Ok(id) => {
                        mixer.play(id);
                        tracing::info!(clip = clip.name(), duration = clip.duration(), "playing animation clip");
                    }
                    Err(e) => tracing::warn!(clip = clip.name(), error = %e, "skipping animation clip"),
                }
            }
            let playing = mixer.playing_count();
            if playing == 0 {
                tracing::warn!(source = %asset.source, "no playable animations in creature model");
                self.status = CreatureStatus::Static;
            } else {
                self.status = CreatureStatus::Animating { clips: playing };
                self.mixer = Some(mixer);
            }
        }
        self.asset = Some(Arc::new(asset));
    }

    pub fn on_asset_failed(&mut self, error: &AssetError) {
        tracing::error!(error = %error, "failed to load creature model");
        self.pending = None;
        if self.asset.is_none() {
            self.status = CreatureStatus::Failed(error.to_string());
        }
    }

    /// Step the mixer by `delta` seconds. No-op without a mixer.
    pub fn advance(&mut self, delta: f64) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.update(delta as f32);
        }
    }

    pub fn status(&self) -> &CreatureStatus {
        &self.status
    }

    pub fn asset(&self) -> Option<&Arc<CreatureAsset>> {
        self.asset.as_ref()
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn placement(&self) -> &Transform {
        &self.placement
    }

    /// Append world-space skinning matrices for every mesh instance.
    ///
    /// Instances are laid out in asset order; a skinned instance takes one
    /// matrix per joint, a rigid one takes a single node matrix. Appends
    /// nothing while the creature is absent.
    pub fn write_palette(&self, out: &mut Vec<Mat4>) {
        let Some(asset) = self.asset.as_ref() else {
            return;
        };
        let globals = self
            .mixer
            .as_ref()
            .map_or(self.rest_globals.as_slice(), |m| m.global_matrices());
        let model = self.placement.to_matrix();
        let start = out.len();
        for instance in &asset.instances {
            match instance.skin.and_then(|s| asset.skins.get(s)) {
                Some(skin) => skin.write_joint_matrices(globals, out),
                None => out.push(globals.get(instance.node).copied().unwrap_or(Mat4::IDENTITY)),
            }
        }
        for m in &mut out[start..] {
            *m = model * *m;
        }
    }
}
