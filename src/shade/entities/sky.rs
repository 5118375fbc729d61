//! Clouds, stars and the moon
//!
//! Clouds and stars live on a hashed grid scrolled at a fraction of the run
//! speed. Each cell holds at most one sprite, jittered so it never crosses
//! the cell edge, which keeps the lookup to a single cell per pixel.

use glam::{Vec2, Vec4};

use crate::consts::GAME_WIDTH;
use crate::shade::hash::{cell_index, channel, hash_cell};
use crate::shade::night::{MOON_PHASES, NightModeSample};
use crate::shade::sdf;
use crate::shade::sprite::{SpriteRect, SpriteSheet, rects, sample_sprite};
use crate::wrap;

pub const CLOUD_CELL_WIDTH: f32 = 2.0;
/// Chance a cell holds a cloud
pub const CLOUD_FREQUENCY: f32 = 0.5;
pub const CLOUD_PARALLAX: f32 = 0.2;
pub const CLOUD_MIN_Y: f32 = 0.72;
pub const CLOUD_MAX_Y: f32 = 1.13;

pub const STAR_CELL_WIDTH: f32 = 1.5;
pub const STAR_FREQUENCY: f32 = 0.4;
pub const STAR_PARALLAX: f32 = 0.1;
pub const STAR_MIN_Y: f32 = 0.75;
pub const STAR_MAX_Y: f32 = 1.35;

/// Moon phase x offsets from `rects::MOON`, newest to oldest
pub const MOON_PHASE_OFFSETS: [f32; 7] = [140.0, 120.0, 100.0, 60.0, 40.0, 20.0, 0.0];
/// The full moon is the only double-width phase
pub const FULL_MOON_PHASE: u32 = 3;
pub const MOON_Y: f32 = 1.0;
pub const MOON_PARALLAX: f32 = 0.025;
pub const MOON_HALO_RADIUS: f32 = 0.12;
pub const MOON_HALO_FALLOFF: f32 = 9.0;
pub const MOON_HALO_STRENGTH: f32 = 0.18;

/// Center of a grid-placed sprite of width `w` inside cell `cell`
fn cell_sprite_x(cell: i32, cell_width: f32, w: f32, seed: u32) -> f32 {
    let slack = cell_width - w;
    cell as f32 * cell_width + w * 0.5 + hash_cell(cell, channel::JITTER, seed) * slack
}

pub fn clouds(sheet: &SpriteSheet, p: Vec2, scroll: f32, seed: u32) -> Vec4 {
    let x = p.x + scroll * CLOUD_PARALLAX;
    let cell = cell_index(x, CLOUD_CELL_WIDTH);
    if hash_cell(cell, channel::EXISTS, seed) >= CLOUD_FREQUENCY {
        return Vec4::ZERO;
    }

    let rect = rects::CLOUD;
    let cx = cell_sprite_x(cell, CLOUD_CELL_WIDTH, rect.world_size().x, seed);
    let cy = CLOUD_MIN_Y + hash_cell(cell, channel::HEIGHT, seed) * (CLOUD_MAX_Y - CLOUD_MIN_Y);
    sample_sprite(sheet, Vec2::new(x - cx, p.y - cy), 1.0, rect)
}

/// Stars fade in with the night
pub fn stars(sheet: &SpriteSheet, p: Vec2, scroll: f32, seed: u32, night: f32) -> Vec4 {
    let x = p.x + scroll * STAR_PARALLAX;
    let cell = cell_index(x, STAR_CELL_WIDTH);
    if night <= 0.0 || hash_cell(cell, channel::EXISTS, seed) >= STAR_FREQUENCY {
        return Vec4::ZERO;
    }

    // Two star shapes stacked vertically on the sheet
    let variant = (hash_cell(cell, channel::VARIANT, seed) * 2.0).floor();
    let rect = rects::STAR.offset(0.0, variant * rects::STAR.height);
    let cx = cell_sprite_x(cell, STAR_CELL_WIDTH, rect.world_size().x, seed);
    let cy = STAR_MIN_Y + hash_cell(cell, channel::HEIGHT, seed) * (STAR_MAX_Y - STAR_MIN_Y);

    let mut c = sample_sprite(sheet, Vec2::new(x - cx, p.y - cy), 1.0, rect);
    c.w *= night;
    c
}

pub fn moon_rect(phase: u32) -> SpriteRect {
    let phase = phase % MOON_PHASES;
    let width = if phase == FULL_MOON_PHASE {
        rects::MOON.width * 2.0
    } else {
        rects::MOON.width
    };
    rects::MOON
        .offset(MOON_PHASE_OFFSETS[phase as usize], 0.0)
        .with_width(width)
}

/// Moon drifts right to left and wraps around the frame
pub fn moon_center(scroll: f32) -> Vec2 {
    let travel = GAME_WIDTH + 1.0;
    Vec2::new(GAME_WIDTH + 0.5 - wrap(scroll * MOON_PARALLAX, travel), MOON_Y)
}

pub fn moon(sheet: &SpriteSheet, p: Vec2, scroll: f32, night: NightModeSample) -> Vec4 {
    if night.progress <= 0.0 {
        return Vec4::ZERO;
    }
    let local = p - moon_center(scroll);
    let disc = sample_sprite(sheet, local, 1.0, moon_rect(night.moon_phase()));

    let halo_d = sdf::sd_circle(local, MOON_HALO_RADIUS);
    let halo = Vec4::new(1.0, 1.0, 1.0, sdf::glow(halo_d, MOON_HALO_FALLOFF) * MOON_HALO_STRENGTH);

    let mut c = crate::shade::compose::over(halo, disc);
    c.w *= night.progress;
    c
}
