//! Shared types and utilities for the lava world crates.

mod color;
mod types;

pub use color::{ColorParseError, Rgb};
pub use types::Transform;
