//! Input: device events reduced to camera actions and per-frame snapshots.
//!
//! # Invariants
//! - The camera reads input once per frame, through one snapshot.
//! - Mouse motion is accumulated between frames and consumed by the snapshot.
//! - No windowing types leak into this crate; apps map key codes to actions.

pub mod action;
pub mod sampler;

pub use action::{Action, ActionSet};
pub use sampler::{InputSampler, InputSnapshot};

pub fn crate_info() -> &'static str {
    "voxelspace-input v0.1.0"
}
