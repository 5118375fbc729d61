//! CPU reference of the fragment pipeline
//!
//! Every function here has a WGSL twin under `renderer/shaders/`. The GPU
//! draws the frame; this side exists so the per-pixel rules can be tested
//! without a device and so the native build can run headless.

pub mod compose;
pub mod entities;
pub mod hash;
pub mod night;
pub mod sdf;
pub mod sprite;

pub use compose::{FrameParams, ViewRect, compose, render_region};
pub use hash::{hash_cell, pcg_hash};
pub use night::{NightModeSample, calculate_night_mode};
pub use sprite::{SpriteRect, SpriteSheet, sample_sprite};
