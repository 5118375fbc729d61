//! T-Rex Runner - the offline dinosaur game drawn in one fragment shader
//!
//! Core modules:
//! - `shade`: CPU reference of the per-pixel pipeline (SDFs, sprites, entities, composition)
//! - `sim`: Game loop state, jump integrator, collision gate and pixel scan
//! - `renderer`: WebGPU pipeline, uniforms, sprite texture, collision readback
//! - `platform`: Browser glue (query flags, pointer detection)
//! - `config` / `highscores`: Persisted settings and best score

pub mod config;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod shade;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use config::{Config, ConfigError};
pub use highscores::HighScore;

/// Game configuration constants
///
/// World space is measured in units of `PIXELS_PER_UNIT` sprite-sheet pixels,
/// with the origin at the bottom-left of the fixed 600x150 game frame and Y up.
pub mod consts {
    /// Sprite-sheet pixels per world unit
    pub const PIXELS_PER_UNIT: f32 = 100.0;

    /// Fixed game frame (600 x 150 sheet pixels)
    pub const GAME_WIDTH: f32 = 6.0;
    pub const GAME_HEIGHT: f32 = 1.5;

    /// Height of the ground line the character and cacti stand on
    pub const GROUND_Y: f32 = 0.10;
    /// Left edge of the character, fixed in screen space
    pub const TREX_LEFT: f32 = 0.50;

    /// Fixed simulation step
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Cap on catch-up steps per frame after a stall
    pub const MAX_SUBSTEPS: u32 = 6;

    /// Run speed (world units per second)
    pub const START_SPEED: f32 = 3.6;
    pub const MAX_SPEED: f32 = 7.8;
    pub const ACCELERATION: f32 = 0.036;

    /// score = floor(distance_ran * DISTANCE_COEFFICIENT)
    pub const DISTANCE_COEFFICIENT: f32 = 2.5;
    /// Largest score the five-digit readout can show
    pub const MAX_SCORE: u32 = 99_999;
    /// A milestone sound and flash every this many points
    pub const ACHIEVEMENT_SCORE: u32 = 100;

    /// Offscreen collision target (RGBA8)
    pub const COLLISION_TARGET_WIDTH: u32 = 256;
    pub const COLLISION_TARGET_HEIGHT: u32 = 128;
    /// World-space window rendered into the collision target
    pub const COLLISION_VIEW_LEFT: f32 = 0.30;
    pub const COLLISION_VIEW_WIDTH: f32 = 1.0;

    /// Per-channel difference that marks a pixel as overlapping
    pub const COLLISION_THRESHOLD: f32 = 0.01;
}

/// Floor-based modulo, always in [0, m) for positive m
#[inline]
pub fn wrap(x: f32, m: f32) -> f32 {
    x - m * (x / m).floor()
}

/// Hermite smoothstep, matching WGSL `smoothstep`
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
