//! Rendering adapter: a renderer-agnostic view of one lava scene frame.
//!
//! # Invariants
//! - Renderers read scene state; they never mutate it.
//! - Everything a renderer needs comes from the scene and the camera.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};
