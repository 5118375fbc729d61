//! The runner itself
//!
//! Frame selection is a table lookup keyed by the character state
//! discriminant rather than a chain of state comparisons, so the WGSL twin
//! stays uniform-cost per pixel.

use glam::{Vec2, Vec4};

use crate::consts::{GROUND_Y, TREX_LEFT};
use crate::shade::hash::{channel, hash_cell};
use crate::shade::sprite::{SpriteRect, SpriteSheet, rects, sample_sprite};
use crate::sim::CharacterState;

/// Two-frame animation for one character state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrexAnimation {
    /// Sheet x offsets from the base rect
    pub frames: [f32; 2],
    pub fps: f32,
    pub ducking: bool,
}

/// Indexed by `CharacterState::discriminant`
pub const TREX_ANIMATIONS: [TrexAnimation; CharacterState::COUNT] = [
    // Waiting
    TrexAnimation {
        frames: [44.0, 44.0],
        fps: 3.0,
        ducking: false,
    },
    // Running
    TrexAnimation {
        frames: [88.0, 132.0],
        fps: 12.0,
        ducking: false,
    },
    // Jumping
    TrexAnimation {
        frames: [0.0, 0.0],
        fps: 60.0,
        ducking: false,
    },
    // Ducking
    TrexAnimation {
        frames: [264.0, 323.0],
        fps: 8.0,
        ducking: true,
    },
    // Crashed
    TrexAnimation {
        frames: [220.0, 220.0],
        fps: 60.0,
        ducking: false,
    },
];

/// Eyes-closed frame shown while blinking
pub const BLINK_FRAME: f32 = 0.0;
/// One blink per bucket of this many seconds
pub const BLINK_PERIOD: f32 = 3.0;
pub const BLINK_DURATION: f32 = 0.15;

/// Whether the waiting character has its eyes shut at `time`
pub fn is_blinking(time: f32, seed: u32) -> bool {
    let bucket = (time / BLINK_PERIOD).floor();
    let start = hash_cell(bucket as i32, channel::BLINK, seed) * (BLINK_PERIOD - BLINK_DURATION);
    let local = time - bucket * BLINK_PERIOD;
    local >= start && local < start + BLINK_DURATION
}

pub fn trex_rect(state: CharacterState, time: f32, seed: u32) -> SpriteRect {
    let anim = TREX_ANIMATIONS[state.discriminant() as usize];
    let frame = ((time * anim.fps).floor() as i64).rem_euclid(2) as usize;

    let blink = state == CharacterState::Waiting && is_blinking(time, seed);
    let dx = if blink { BLINK_FRAME } else { anim.frames[frame] };

    let base = if anim.ducking {
        rects::TREX_DUCK
    } else {
        rects::TREX
    };
    base.offset(dx, 0.0)
}

/// Sprite center: left edge pinned at `TREX_LEFT`, feet at ground plus jump
pub fn trex_center(rect: SpriteRect, jump_offset: f32) -> Vec2 {
    let size = rect.world_size();
    Vec2::new(TREX_LEFT + size.x * 0.5, GROUND_Y + jump_offset + size.y * 0.5)
}

pub fn trex(
    sheet: &SpriteSheet,
    p: Vec2,
    state: CharacterState,
    time: f32,
    jump_offset: f32,
    seed: u32,
) -> Vec4 {
    let rect = trex_rect(state, time, seed);
    sample_sprite(sheet, p - trex_center(rect, jump_offset), 1.0, rect)
}
