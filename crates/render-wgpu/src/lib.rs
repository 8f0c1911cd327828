//! wgpu render backend for the lava world.
//!
//! Draws, in order: the gradient sky dome, the displaced lava terrain, the
//! skinned creature lit by the orbiting light, and the rain as instanced
//! camera-facing billboards. Camera input goes through [`OrbitControls`].
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - Camera motion lives outside the kernel's frame steps.
//! - GPU buffers for the creature are built once, after its asset arrives.

mod camera;
mod gpu;
pub mod mesh;
mod shaders;

pub use camera::OrbitControls;
pub use gpu::WgpuRenderer;
