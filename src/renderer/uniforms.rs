//! Uniform block shared by both passes
//!
//! Must match the `Uniforms` struct in `shaders/compose.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::shade::{FrameParams, ViewRect};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub resolution: [f32; 2],        // offset 0
    pub view_origin: [f32; 2],       // offset 8
    pub view_size: [f32; 2],         // offset 16
    pub time: f32,                   // offset 24
    pub scroll: f32,                 // offset 28
    pub score: f32,                  // offset 32
    pub high_score: f32,             // offset 36
    pub jump_offset: f32,            // offset 40
    pub character: u32,              // offset 44
    pub world_seed: u32,             // offset 48
    pub debug_overlay: u32,          // offset 52
    pub signal_collisions: u32,      // offset 56
    pub collision_threshold: f32,    // offset 60
    pub collision_color: [f32; 4],   // offset 64 (16-byte aligned for WGSL vec4)
    pub sky_top: [f32; 4],           // offset 80
    pub sky_bottom: [f32; 4],        // offset 96
    pub collision_view: [f32; 4],    // offset 112 - origin xy, size zw
}

fn vec4(c: Vec3) -> [f32; 4] {
    c.extend(1.0).to_array()
}

impl Uniforms {
    /// Snapshot `params` for a target of `width` x `height` showing `view`
    pub fn new(params: &FrameParams, view: ViewRect, width: u32, height: u32) -> Self {
        let cv = params.collision_view;
        Self {
            resolution: [width as f32, height as f32],
            view_origin: view.origin.to_array(),
            view_size: view.size.to_array(),
            time: params.time,
            scroll: params.scroll,
            score: params.score as f32,
            high_score: params.high_score as f32,
            jump_offset: params.jump_offset,
            character: params.character.discriminant(),
            world_seed: params.world_seed,
            debug_overlay: params.debug_overlay as u32,
            signal_collisions: params.signal_collisions as u32,
            collision_threshold: params.collision_threshold,
            collision_color: vec4(params.collision_color),
            sky_top: vec4(params.sky_top),
            sky_bottom: vec4(params.sky_bottom),
            collision_view: [cv.origin.x, cv.origin.y, cv.size.x, cv.size.y],
        }
    }
}
