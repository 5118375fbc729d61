//! 2-D signed distance primitives and combinators
//!
//! Negative inside, positive outside. Mirrored in `shaders/sdf.wgsl`.

use glam::Vec2;

/// Signed distance to a circle centered at the origin
#[inline]
pub fn sd_circle(p: Vec2, radius: f32) -> f32 {
    p.length() - radius
}

/// Signed distance to an axis-aligned box with the given half extents
pub fn sd_box(p: Vec2, half: Vec2) -> f32 {
    let d = p.abs() - half;
    d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0)
}

/// Box with rounded corners of radius `r` (half extents include the rounding)
#[inline]
pub fn sd_rounded_box(p: Vec2, half: Vec2, r: f32) -> f32 {
    sd_box(p, half - Vec2::splat(r)) - r
}

/// Distance to the segment a-b, thickened by `r`
pub fn sd_segment(p: Vec2, a: Vec2, b: Vec2, r: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.dot(ba).max(1e-8)).clamp(0.0, 1.0);
    (pa - ba * h).length() - r
}

/// Hollow ring of radius `radius` and wall `thickness`
#[inline]
pub fn sd_ring(p: Vec2, radius: f32, thickness: f32) -> f32 {
    let half = thickness * 0.5;
    op_subtract(sd_circle(p, radius + half), sd_circle(p, radius - half))
}

#[inline]
pub fn op_union(a: f32, b: f32) -> f32 {
    a.min(b)
}

#[inline]
pub fn op_intersect(a: f32, b: f32) -> f32 {
    a.max(b)
}

/// `a` with `b` carved out
#[inline]
pub fn op_subtract(a: f32, b: f32) -> f32 {
    a.max(-b)
}

/// Polynomial smooth minimum with blend radius `k`
pub fn op_smooth_union(a: f32, b: f32, k: f32) -> f32 {
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    b + (a - b) * h - k * h * (1.0 - h)
}

/// Coverage of a filled shape, anti-aliased over `aa` units
#[inline]
pub fn fill(d: f32, aa: f32) -> f32 {
    1.0 - crate::smoothstep(-aa, aa, d)
}

/// Coverage of the shape outline of width `width`
#[inline]
pub fn stroke(d: f32, width: f32, aa: f32) -> f32 {
    fill(d.abs() - width * 0.5, aa)
}

/// Exponential glow falloff outside the shape
#[inline]
pub fn glow(d: f32, falloff: f32) -> f32 {
    (-d.max(0.0) * falloff).exp()
}
