//! Ground line, tiled forever from two alternating strips

use glam::{Vec2, Vec4};

use super::canvas_center;
use crate::shade::hash::cell_index;
use crate::shade::sprite::{SpriteRect, SpriteSheet, rects, sample_sprite};
use crate::wrap;

/// One strip is 600 px wide
pub const HORIZON_SEGMENT_WIDTH: f32 = 6.0;

/// Vertical center of the strip (canvas y = 127)
pub fn horizon_y() -> f32 {
    canvas_center(0.0, 127.0, 600.0, 12.0).y
}

/// Flat on even segments, bumpy on odd ones
pub fn horizon_rect(segment: i32) -> SpriteRect {
    if segment.rem_euclid(2) == 0 {
        rects::HORIZON_FLAT
    } else {
        rects::HORIZON_BUMPY
    }
}

pub fn horizon(sheet: &SpriteSheet, p: Vec2, scroll: f32) -> Vec4 {
    let world_x = p.x + scroll;
    let segment = cell_index(world_x, HORIZON_SEGMENT_WIDTH);
    let local = Vec2::new(
        wrap(world_x, HORIZON_SEGMENT_WIDTH) - HORIZON_SEGMENT_WIDTH * 0.5,
        p.y - horizon_y(),
    );
    sample_sprite(sheet, local, 1.0, horizon_rect(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_alternate() {
        assert_eq!(horizon_rect(0), rects::HORIZON_FLAT);
        assert_eq!(horizon_rect(1), rects::HORIZON_BUMPY);
        assert_eq!(horizon_rect(-1), rects::HORIZON_BUMPY);
        assert_eq!(horizon_rect(42), rects::HORIZON_FLAT);
    }

    #[test]
    fn test_tiles_without_gaps() {
        let sheet = SpriteSheet::solid(1233, 68, [83, 83, 83, 255]);
        let y = horizon_y();
        for i in 0..200 {
            let x = i as f32 * 0.0731;
            assert_eq!(horizon(&sheet, Vec2::new(x, y), 123.4).w, 1.0);
        }
        assert_eq!(horizon(&sheet, Vec2::new(1.0, y + 0.2), 0.0).w, 0.0);
    }
}
