//! "GAME OVER" banner and restart button

use glam::{Vec2, Vec4};

use super::INK;
use crate::shade::compose::over;
use crate::shade::sdf;
use crate::shade::sprite::{SpriteSheet, rects, sample_sprite};

pub const GAME_OVER_CENTER: Vec2 = Vec2::new(3.0, 0.985);
pub const RESTART_CENTER: Vec2 = Vec2::new(3.0, 0.59);
pub const RING_RADIUS: f32 = 0.26;
pub const RING_WIDTH: f32 = 0.012;
pub const RING_ALPHA: f32 = 0.35;
/// Radians per second
pub const RING_PULSE_SPEED: f32 = 4.0;

pub fn ring_pulse(time: f32) -> f32 {
    0.5 + 0.5 * (time * RING_PULSE_SPEED).sin()
}

pub fn game_over(sheet: &SpriteSheet, p: Vec2, time: f32) -> Vec4 {
    let text = sample_sprite(sheet, p - GAME_OVER_CENTER, 1.0, rects::GAME_OVER);
    let icon = sample_sprite(sheet, p - RESTART_CENTER, 1.0, rects::RESTART);

    let d = sdf::sd_ring(p - RESTART_CENTER, RING_RADIUS, RING_WIDTH);
    let ring = Vec4::new(INK, INK, INK, sdf::fill(d, 0.004) * RING_ALPHA * ring_pulse(time));

    over(over(ring, icon), text)
}
