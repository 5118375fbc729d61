//! Score and high-score readouts

use glam::{Vec2, Vec4};

use crate::consts::{ACHIEVEMENT_SCORE, MAX_SCORE};
use crate::shade::sprite::{SpriteRect, SpriteSheet, rects, sample_sprite};

pub const SCORE_DIGITS: u32 = 5;
/// Glyph advance (10 px glyph plus 1 px gap)
pub const DIGIT_CELL_WIDTH: f32 = 0.11;
pub const SCORE_LEFT: f32 = 5.34;
pub const HIGH_SCORE_LEFT: f32 = 4.24;
pub const SCORE_Y: f32 = 1.385;
pub const HIGH_SCORE_ALPHA: f32 = 0.8;

pub const GLYPH_H: u32 = 10;
pub const GLYPH_I: u32 = 11;
/// Marks an empty cell
pub const GLYPH_BLANK: u32 = u32::MAX;

/// Points after each milestone during which the readout flashes
pub const FLASH_SCORE_SPAN: u32 = 12;
pub const FLASH_RATE: f32 = 4.0;

/// Glyph strip rect, index clamped to the `I` glyph
pub fn glyph_rect(glyph: u32) -> SpriteRect {
    rects::TEXT.offset(glyph.min(GLYPH_I) as f32 * rects::TEXT.width, 0.0)
}

/// `index`th of `SCORE_DIGITS` zero-padded digits, most significant first
pub fn digit(value: u32, index: u32) -> u32 {
    let value = value.min(MAX_SCORE);
    let shift = SCORE_DIGITS - 1 - index.min(SCORE_DIGITS - 1);
    (value / 10u32.pow(shift)) % 10
}

/// Value to display and its alpha, accounting for the milestone flash
pub fn score_readout(score: u32, time: f32, flashing: bool) -> (u32, f32) {
    let since = score % ACHIEVEMENT_SCORE;
    if flashing && score >= ACHIEVEMENT_SCORE && since < FLASH_SCORE_SPAN {
        let visible = ((time * FLASH_RATE).floor() as i64).rem_euclid(2) == 0;
        (score - since, if visible { 1.0 } else { 0.0 })
    } else {
        (score, 1.0)
    }
}

/// Draw a row of glyph cells starting at `left`
fn glyph_row(sheet: &SpriteSheet, p: Vec2, left: f32, glyphs: &[u32]) -> Vec4 {
    let cell = ((p.x - left) / DIGIT_CELL_WIDTH).floor();
    if cell < 0.0 || cell >= glyphs.len() as f32 {
        return Vec4::ZERO;
    }
    let glyph = glyphs[cell as usize];
    if glyph == GLYPH_BLANK {
        return Vec4::ZERO;
    }
    let center = Vec2::new(left + (cell + 0.5) * DIGIT_CELL_WIDTH, SCORE_Y);
    sample_sprite(sheet, p - center, 1.0, glyph_rect(glyph))
}

fn digits(value: u32) -> [u32; SCORE_DIGITS as usize] {
    std::array::from_fn(|i| digit(value, i as u32))
}

/// Current score on the right, `HI` and the best score dimmed to its left
pub fn score(sheet: &SpriteSheet, p: Vec2, score: u32, high_score: u32, time: f32, flashing: bool) -> Vec4 {
    let (value, alpha) = score_readout(score, time, flashing);
    let mut current = glyph_row(sheet, p, SCORE_LEFT, &digits(value));
    current.w *= alpha;

    if high_score == 0 {
        return current;
    }
    let [a, b, c, d, e] = digits(high_score);
    let hi = [GLYPH_H, GLYPH_I, GLYPH_BLANK, a, b, c, d, e];
    let mut best = glyph_row(sheet, p, HIGH_SCORE_LEFT, &hi);
    best.w *= HIGH_SCORE_ALPHA;

    crate::shade::compose::over(best, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> SpriteSheet {
        SpriteSheet::solid(1233, 68, [83, 83, 83, 255])
    }

    #[test]
    fn test_digits_are_zero_padded() {
        assert_eq!(digits(42), [0, 0, 0, 4, 2]);
        assert_eq!(digits(12345), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_score_clamps_to_five_digits() {
        assert_eq!(digits(1_000_000), [9, 9, 9, 9, 9]);
        assert_eq!(digit(7, 99), 7);
    }

    #[test]
    fn test_glyph_clamps() {
        assert_eq!(glyph_rect(3).x, 655.0 + 30.0);
        assert_eq!(glyph_rect(500), glyph_rect(GLYPH_I));
    }

    #[test]
    fn test_milestone_flash() {
        assert_eq!(score_readout(205, 0.0, true), (200, 1.0));
        assert_eq!(score_readout(205, 0.3, true), (200, 0.0));
        assert_eq!(score_readout(215, 0.3, true), (215, 1.0));
        assert_eq!(score_readout(5, 0.3, true), (5, 1.0));
        assert_eq!(score_readout(205, 0.3, false), (205, 1.0));
    }

    #[test]
    fn test_high_score_dimmed() {
        let sheet = sheet();
        let p = Vec2::new(HIGH_SCORE_LEFT + 3.5 * DIGIT_CELL_WIDTH, SCORE_Y);
        let c = score(&sheet, p, 10, 500, 0.0, true);
        assert!((c.w - HIGH_SCORE_ALPHA).abs() < 1e-6);
        assert_eq!(score(&sheet, p, 10, 0, 0.0, true).w, 0.0);
    }

    #[test]
    fn test_gap_between_glyphs() {
        let sheet = sheet();
        // Last 1 px of every cell is empty
        let p = Vec2::new(SCORE_LEFT + DIGIT_CELL_WIDTH - 0.004, SCORE_Y);
        assert_eq!(score(&sheet, p, 0, 0, 0.0, true).w, 0.0);
        let p = Vec2::new(SCORE_LEFT + DIGIT_CELL_WIDTH * 0.5, SCORE_Y);
        assert_eq!(score(&sheet, p, 0, 0, 0.0, true).w, 1.0);
    }
}
