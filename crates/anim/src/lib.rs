//! Skeletal/clip animation: node hierarchies, keyframe tracks, and a mixer.
//!
//! # Invariants
//! - Clips are validated when built; sampling never fails.
//! - A mixer only accepts clips whose channels target nodes it owns.
//! - The mixer's clock only moves forward through `update`.

mod clip;
mod hierarchy;
mod mixer;

pub use clip::{
    AnimationClip, Channel, ChannelTarget, Interpolation, Keyframe, Track, TrackQuat, TrackVec3,
};
pub use hierarchy::{Node, NodeHierarchy, Skin};
pub use mixer::{ActionId, AnimationMixer, ClipAction, LoopMode, Pose};

/// Errors raised while building hierarchies, clips, or actions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimError {
    #[error("track has no keyframes")]
    EmptyTrack,
    #[error("track has {times} key times but {values} values (expected {expected})")]
    TrackLength {
        times: usize,
        values: usize,
        expected: usize,
    },
    #[error("key times must be finite and non-decreasing")]
    UnorderedKeyTimes,
    #[error("node index {index} out of range (hierarchy has {len} nodes)")]
    NodeOutOfRange { index: usize, len: usize },
    #[error("node {0} is part of a parent cycle")]
    ParentCycle(usize),
    #[error("skin has {joints} joints but {matrices} inverse bind matrices")]
    SkinMismatch { joints: usize, matrices: usize },
}
