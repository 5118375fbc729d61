//! Sprite sheet layout and the bounds-check-then-sample primitive
//!
//! All rects index the low-DPI offline sprite sheet (1233 x 68 px).

use glam::{Vec2, Vec4};

use crate::consts::PIXELS_PER_UNIT;

pub const SHEET_WIDTH: f32 = 1233.0;
pub const SHEET_HEIGHT: f32 = 68.0;

/// Pixel-space rect locating one sprite on the sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SpriteRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Size of the sprite in world units at scale 1
    #[inline]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / PIXELS_PER_UNIT
    }

    /// Same sprite shifted along the sheet
    #[inline]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    #[inline]
    pub fn with_width(self, width: f32) -> Self {
        Self { width, ..self }
    }
}

/// Sheet regions, mirroring `shaders/sprite.wgsl`
pub mod rects {
    use super::SpriteRect;

    pub const RESTART: SpriteRect = SpriteRect::new(2.0, 2.0, 36.0, 32.0);
    pub const CLOUD: SpriteRect = SpriteRect::new(86.0, 2.0, 46.0, 14.0);
    pub const PTERODACTYL: SpriteRect = SpriteRect::new(134.0, 2.0, 46.0, 40.0);
    pub const CACTUS_SMALL: SpriteRect = SpriteRect::new(228.0, 2.0, 17.0, 35.0);
    pub const CACTUS_LARGE: SpriteRect = SpriteRect::new(332.0, 2.0, 25.0, 50.0);
    /// Newest phase; other phases are x offsets from here
    pub const MOON: SpriteRect = SpriteRect::new(484.0, 2.0, 20.0, 40.0);
    pub const STAR: SpriteRect = SpriteRect::new(645.0, 2.0, 9.0, 9.0);
    /// Digits 0-9 then the H and I glyphs, 10 px apart
    pub const TEXT: SpriteRect = SpriteRect::new(655.0, 2.0, 10.0, 13.0);
    pub const GAME_OVER: SpriteRect = SpriteRect::new(655.0, 15.0, 191.0, 11.0);
    pub const TREX: SpriteRect = SpriteRect::new(848.0, 2.0, 44.0, 47.0);
    pub const TREX_DUCK: SpriteRect = SpriteRect::new(848.0, 2.0, 59.0, 25.0);
    pub const HORIZON_FLAT: SpriteRect = SpriteRect::new(2.0, 54.0, 600.0, 12.0);
    pub const HORIZON_BUMPY: SpriteRect = SpriteRect::new(602.0, 54.0, 600.0, 12.0);
}

/// CPU copy of the sprite sheet texture
///
/// Behaves like an `Rgba8UnormSrgb` view with nearest filtering and
/// clamp-to-edge addressing.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    width: u32,
    height: u32,
    texels: Vec<[u8; 4]>,
}

impl SpriteSheet {
    /// Wrap decoded RGBA8 pixels; `None` if the buffer does not match the size
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if width == 0 || height == 0 || bytes.len() != (width * height * 4) as usize {
            return None;
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Some(Self {
            width,
            height,
            texels,
        })
    }

    /// Fully transparent stand-in used when the image cannot be loaded
    pub fn blank() -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![[0; 4]],
        }
    }

    /// Sheet where every texel is `texel`
    pub fn solid(width: u32, height: u32, texel: [u8; 4]) -> Self {
        Self {
            width,
            height,
            texels: vec![texel; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn is_blank(&self) -> bool {
        self.texels.iter().all(|t| t[3] == 0)
    }

    /// Nearest-neighbour lookup at normalized `uv`, returned in linear color
    pub fn texel(&self, uv: Vec2) -> Vec4 {
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1);
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1);
        let [r, g, b, a] = self.texels[(y as u32 * self.width + x as u32) as usize];
        Vec4::new(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
            a as f32 / 255.0,
        )
    }
}

/// sRGB transfer function decode
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Sample `rect` at `p`, a point relative to the sprite's center
///
/// Bounds are inclusive on every edge. Out-of-bounds points return
/// transparent black.
pub fn sample_sprite(sheet: &SpriteSheet, p: Vec2, scale: f32, rect: SpriteRect) -> Vec4 {
    let half = rect.world_size() * scale * 0.5;
    if p.x.abs() > half.x || p.y.abs() > half.y {
        return Vec4::ZERO;
    }

    // Sprite-local UV, Y flipped (sheet rows grow downward)
    let u = (p.x + half.x) / (2.0 * half.x);
    let v = 1.0 - (p.y + half.y) / (2.0 * half.y);

    // Snap to the texel center inside the rect so the far edge stays in-rect
    let col = (u * rect.width).floor().min(rect.width - 1.0);
    let row = (v * rect.height).floor().min(rect.height - 1.0);
    let uv = Vec2::new(
        (rect.x + col + 0.5) / SHEET_WIDTH,
        (rect.y + row + 0.5) / SHEET_HEIGHT,
    );
    sheet.texel(uv)
}
