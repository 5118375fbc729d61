//! Per-entity renderers
//!
//! Each takes a point in game-frame world coordinates and returns straight
//! (non-premultiplied) RGBA, transparent where the entity is absent.

pub mod game_over;
pub mod horizon;
pub mod obstacles;
pub mod score;
pub mod sky;
pub mod trex;

use glam::Vec2;

use crate::consts::{GAME_HEIGHT, PIXELS_PER_UNIT};

/// World-space center of a box given in top-left canvas pixels (600x150 frame)
pub fn canvas_center(x: f32, y: f32, w: f32, h: f32) -> Vec2 {
    Vec2::new(
        (x + w * 0.5) / PIXELS_PER_UNIT,
        GAME_HEIGHT - (y + h * 0.5) / PIXELS_PER_UNIT,
    )
}

/// Linear value of the #535353 sprite ink
pub const INK: f32 = 0.0865;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_center_flips_y() {
        let c = canvas_center(0.0, 0.0, 100.0, 50.0);
        assert!((c.x - 0.5).abs() < 1e-6);
        assert!((c.y - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_ink_matches_srgb_decode() {
        let decoded = crate::shade::sprite::srgb_to_linear(83.0 / 255.0);
        assert!((decoded - INK).abs() < 1e-3);
    }
}
