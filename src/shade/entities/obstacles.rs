//! Obstacle dispatcher
//!
//! World x is split into segments. Each segment holds at most one obstacle,
//! centered, chosen from hashes of the segment index. Kind unlocks are gated
//! by the score at which the segment scrolls past, not the live score, so
//! nothing pops into view when a threshold is crossed.

use glam::{Vec2, Vec4};

use crate::consts::{DISTANCE_COEFFICIENT, GROUND_Y};
use crate::shade::hash::{cell_index, channel, hash_cell};
use crate::shade::sprite::{SpriteRect, SpriteSheet, rects, sample_sprite};

pub const OBSTACLE_SEGMENT_WIDTH: f32 = 4.0;
/// Chance a segment holds an obstacle
pub const OBSTACLE_FREQUENCY: f32 = 0.7;
/// Segments before this index stay empty so a run never starts on a cactus
pub const CLEAR_SEGMENTS: i32 = 3;

/// Large cacti appear below this kind roll once unlocked
const LARGE_CACTUS_ROLL: f32 = 0.6;
/// Pterodactyls appear below this kind roll once unlocked
const PTERODACTYL_ROLL: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ObstacleKind {
    CactusSmall = 0,
    CactusLarge = 1,
    Pterodactyl = 2,
}

impl ObstacleKind {
    pub const COUNT: usize = 3;

    /// Out-of-range values clamp to the last entry
    pub fn from_discriminant(d: u32) -> Self {
        match d {
            0 => Self::CactusSmall,
            1 => Self::CactusLarge,
            _ => Self::Pterodactyl,
        }
    }

    pub fn info(self) -> &'static ObstacleInfo {
        &OBSTACLE_TABLE[self as usize]
    }
}

/// Static description of one obstacle kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleInfo {
    /// Single-unit rect (group of one, first animation frame)
    pub rect: SpriteRect,
    /// Number of hashed variants (group sizes or height slots)
    pub variants: u32,
    /// Variant widens the rect into a group instead of picking a height
    pub grouped: bool,
    /// Bottom edge per variant, world units
    pub bottoms: [f32; 3],
    /// First score at which the kind may appear
    pub unlock_score: f32,
    /// Sheet x distance between animation frames
    pub frame_stride: f32,
    pub fps: f32,
}

pub const OBSTACLE_TABLE: [ObstacleInfo; ObstacleKind::COUNT] = [
    ObstacleInfo {
        rect: rects::CACTUS_SMALL,
        variants: 3,
        grouped: true,
        bottoms: [GROUND_Y; 3],
        unlock_score: 0.0,
        frame_stride: 0.0,
        fps: 0.0,
    },
    ObstacleInfo {
        rect: rects::CACTUS_LARGE,
        variants: 3,
        grouped: true,
        bottoms: [GROUND_Y; 3],
        unlock_score: 50.0,
        frame_stride: 0.0,
        fps: 0.0,
    },
    ObstacleInfo {
        rect: rects::PTERODACTYL,
        variants: 3,
        grouped: false,
        bottoms: [0.10, 0.35, 0.60],
        unlock_score: 300.0,
        frame_stride: 46.0,
        fps: 6.0,
    },
];

/// A placed obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub segment: i32,
    pub kind: ObstacleKind,
    pub variant: u32,
    /// World-space center x (unscrolled)
    pub center_x: f32,
    pub bottom: f32,
}

impl Obstacle {
    /// Sheet rect for this obstacle at `time`, including group width and flap frame
    pub fn rect(&self, time: f32) -> SpriteRect {
        let info = self.kind.info();
        if info.grouped {
            let size = (self.variant + 1) as f32;
            let unit = info.rect.width;
            info.rect
                .offset(unit * size * (size - 1.0) * 0.5, 0.0)
                .with_width(unit * size)
        } else {
            let frame = ((time * info.fps).floor() as i64).rem_euclid(2) as f32;
            info.rect.offset(frame * info.frame_stride, 0.0)
        }
    }

    /// Center of the sprite in world space
    pub fn center(&self, time: f32) -> Vec2 {
        let size = self.rect(time).world_size();
        Vec2::new(self.center_x, self.bottom + size.y * 0.5)
    }

    /// World-space half extents of the footprint
    pub fn half_size(&self, time: f32) -> Vec2 {
        self.rect(time).world_size() * 0.5
    }
}

/// Score at which the center of `segment` scrolls past the left edge
pub fn segment_score(segment: i32) -> f32 {
    ((segment as f32 + 0.5) * OBSTACLE_SEGMENT_WIDTH * DISTANCE_COEFFICIENT).floor()
}

/// Kind selected by a roll, as a count of thresholds passed
pub fn select_kind(roll: f32, segment_score: f32) -> ObstacleKind {
    let large_ok = segment_score >= OBSTACLE_TABLE[1].unlock_score;
    let ptero_ok = segment_score >= OBSTACLE_TABLE[2].unlock_score;
    let kind = (large_ok && roll < LARGE_CACTUS_ROLL) as u32 + (ptero_ok && roll < PTERODACTYL_ROLL) as u32;
    ObstacleKind::from_discriminant(kind)
}

/// The obstacle in `segment`, if any
pub fn segment_obstacle(segment: i32, seed: u32) -> Option<Obstacle> {
    if segment < CLEAR_SEGMENTS || hash_cell(segment, channel::EXISTS, seed) >= OBSTACLE_FREQUENCY {
        return None;
    }

    let kind = select_kind(hash_cell(segment, channel::KIND, seed), segment_score(segment));
    let info = kind.info();
    let variant = ((hash_cell(segment, channel::VARIANT, seed) * info.variants as f32) as u32)
        .min(info.variants - 1);

    Some(Obstacle {
        segment,
        kind,
        variant,
        center_x: (segment as f32 + 0.5) * OBSTACLE_SEGMENT_WIDTH,
        bottom: info.bottoms[variant as usize],
    })
}

pub fn obstacles(sheet: &SpriteSheet, p: Vec2, scroll: f32, time: f32, seed: u32) -> Vec4 {
    let world = Vec2::new(p.x + scroll, p.y);
    let segment = cell_index(world.x, OBSTACLE_SEGMENT_WIDTH);
    match segment_obstacle(segment, seed) {
        Some(obstacle) => {
            let rect = obstacle.rect(time);
            sample_sprite(sheet, world - obstacle.center(time), 1.0, rect)
        }
        None => Vec4::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_segments_clear() {
        for seed in 0..50 {
            for segment in -5..CLEAR_SEGMENTS {
                assert!(segment_obstacle(segment, seed).is_none());
            }
        }
    }

    #[test]
    fn test_kind_thresholds() {
        assert_eq!(select_kind(0.1, 0.0), ObstacleKind::CactusSmall);
        assert_eq!(select_kind(0.1, 60.0), ObstacleKind::CactusLarge);
        assert_eq!(select_kind(0.1, 400.0), ObstacleKind::Pterodactyl);
        assert_eq!(select_kind(0.4, 400.0), ObstacleKind::CactusLarge);
        assert_eq!(select_kind(0.9, 400.0), ObstacleKind::CactusSmall);
    }

    #[test]
    fn test_kind_clamps() {
        assert_eq!(ObstacleKind::from_discriminant(99), ObstacleKind::Pterodactyl);
    }

    #[test]
    fn test_cactus_groups_follow_sheet_layout() {
        let mut o = Obstacle {
            segment: 5,
            kind: ObstacleKind::CactusSmall,
            variant: 0,
            center_x: 22.0,
            bottom: GROUND_Y,
        };
        assert_eq!(o.rect(0.0), rects::CACTUS_SMALL);
        o.variant = 1;
        assert_eq!(o.rect(0.0), SpriteRect::new(245.0, 2.0, 34.0, 35.0));
        o.variant = 2;
        assert_eq!(o.rect(0.0), SpriteRect::new(279.0, 2.0, 51.0, 35.0));
    }

    #[test]
    fn test_pterodactyl_flaps() {
        let o = Obstacle {
            segment: 40,
            kind: ObstacleKind::Pterodactyl,
            variant: 1,
            center_x: 162.0,
            bottom: 0.35,
        };
        assert_eq!(o.rect(0.0).x, 134.0);
        assert_eq!(o.rect(1.0 / 6.0 + 1e-4).x, 180.0);
    }

    #[test]
    fn test_early_segments_never_fly() {
        // Segment 29 passes at score 295, below the pterodactyl unlock
        for seed in 0..200 {
            for segment in CLEAR_SEGMENTS..30 {
                if let Some(o) = segment_obstacle(segment, seed) {
                    assert_ne!(o.kind, ObstacleKind::Pterodactyl);
                }
            }
        }
    }

    #[test]
    fn test_cactus_stands_on_ground() {
        let sheet = SpriteSheet::solid(1233, 68, [83, 83, 83, 255]);
        let (segment, o) = (CLEAR_SEGMENTS..200)
            .find_map(|s| {
                segment_obstacle(s, 1)
                    .filter(|o| o.kind != ObstacleKind::Pterodactyl)
                    .map(|o| (s, o))
            })
            .unwrap();
        let scroll = (segment as f32 + 0.5) * OBSTACLE_SEGMENT_WIDTH - 3.0;
        let foot = Vec2::new(3.0, o.bottom + 0.005);
        assert_eq!(obstacles(&sheet, foot, scroll, 0.0, 1).w, 1.0);
        let edge = OBSTACLE_SEGMENT_WIDTH * 0.5 - 0.01;
        assert_eq!(obstacles(&sheet, Vec2::new(3.0 + edge, foot.y), scroll, 0.0, 1).w, 0.0);
    }

    proptest! {
        #[test]
        fn dispatch_is_deterministic(segment in -1000i32..100_000, seed in any::<u32>()) {
            prop_assert_eq!(segment_obstacle(segment, seed), segment_obstacle(segment, seed));
            let roll = hash_cell(segment, channel::KIND, seed);
            prop_assert_eq!(roll, hash_cell(segment, channel::KIND, seed));
        }

        #[test]
        fn footprint_fits_segment(segment in CLEAR_SEGMENTS..100_000, seed in any::<u32>(), t in 0.0f32..100.0) {
            if let Some(o) = segment_obstacle(segment, seed) {
                let half = o.half_size(t).x;
                let left = segment as f32 * OBSTACLE_SEGMENT_WIDTH;
                prop_assert!(o.center_x - half > left);
                prop_assert!(o.center_x + half < left + OBSTACLE_SEGMENT_WIDTH);
                prop_assert!(o.variant < o.kind.info().variants);
            }
        }
    }
}
