//! Input mapping: raw pointer and key input turned into camera actions.
//!
//! # Invariants
//! - Hosts translate their window events into [`PointerInput`] calls only.
//! - Camera controllers consume [`CameraAction`]s, never raw events.

pub mod action;

pub use action::{CameraAction, PointerButton, PointerInput};
