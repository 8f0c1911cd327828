//! Developer tooling: frame inspector, asset summaries, frame timing.
//!
//! # Invariants
//! - Tools only read scene state; they never advance or mutate it.

mod inspector;
mod timer;

pub use inspector::{AssetInfo, FrameInspector, FrameSummary};
pub use timer::FrameTimer;
