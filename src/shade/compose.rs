//! Per-pixel composition
//!
//! Layers, back to front: sky gradient, stars, moon, clouds, horizon, the
//! character, obstacles, the character again, score, game over. Night
//! inversion is applied on top, then the debug overlay, then the collision
//! override.
//!
//! Collision is read off the compositing itself. The character and the
//! obstacle silhouette are composited in both orders; where they overlap the
//! two results differ and the pixel is flagged. The silhouette is drawn in a
//! probe tone far from the character's own colour, since both sprites share
//! the sheet's single ink colour.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::Config;
use crate::consts::{
    COLLISION_THRESHOLD, COLLISION_VIEW_LEFT, COLLISION_VIEW_WIDTH, GAME_HEIGHT, GAME_WIDTH, GROUND_Y, TREX_LEFT,
};
use crate::shade::entities::{game_over, horizon, obstacles, score, sky, trex};
use crate::shade::night::calculate_night_mode;
use crate::shade::sdf;
use crate::shade::sprite::SpriteSheet;
use crate::sim::{CharacterState, GameState};

pub const DEBUG_COLOR: Vec3 = Vec3::new(0.2, 0.6, 1.0);
pub const DEBUG_ALPHA: f32 = 0.8;

/// Axis-aligned world-space window mapped onto a render target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    /// Bottom-left corner
    pub origin: Vec2,
    pub size: Vec2,
}

impl ViewRect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Smallest window containing the whole game frame at the target's aspect
    pub fn fit_game_frame(width: f32, height: f32) -> Self {
        let aspect = width.max(1.0) / height.max(1.0);
        let frame = Vec2::new(GAME_WIDTH, GAME_HEIGHT);
        let size = if aspect > GAME_WIDTH / GAME_HEIGHT {
            Vec2::new(GAME_HEIGHT * aspect, GAME_HEIGHT)
        } else {
            Vec2::new(GAME_WIDTH, GAME_WIDTH / aspect)
        };
        Self {
            origin: (frame - size) * 0.5,
            size,
        }
    }

    /// The fixed game frame; outside it only the sky is drawn
    pub const GAME_FRAME: Self = Self {
        origin: Vec2::ZERO,
        size: Vec2::new(GAME_WIDTH, GAME_HEIGHT),
    };

    /// Narrow window around the character used for collision readback
    pub fn collision_window() -> Self {
        Self {
            origin: Vec2::new(COLLISION_VIEW_LEFT, 0.0),
            size: Vec2::new(COLLISION_VIEW_WIDTH, GAME_HEIGHT),
        }
    }

    /// World point under pixel coordinate `frag` (top-left origin, Y down)
    pub fn to_world(&self, frag: Vec2, resolution: Vec2) -> Vec2 {
        let uv = frag / resolution;
        Vec2::new(
            self.origin.x + uv.x * self.size.x,
            self.origin.y + (1.0 - uv.y) * self.size.y,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.origin + self.size;
        p.x >= self.origin.x && p.y >= self.origin.y && p.x <= max.x && p.y <= max.y
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }
}

/// Everything one frame of the compositor reads
///
/// The GPU uniform block is built from this, so the CPU reference and the
/// shader always see the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub time: f32,
    pub scroll: f32,
    pub score: u32,
    pub high_score: u32,
    pub jump_offset: f32,
    pub character: CharacterState,
    pub world_seed: u32,
    pub debug_overlay: bool,
    pub signal_collisions: bool,
    pub collision_threshold: f32,
    pub collision_color: Vec3,
    pub sky_top: Vec3,
    pub sky_bottom: Vec3,
    pub collision_view: ViewRect,
}

impl Default for FrameParams {
    fn default() -> Self {
        let config = Config::default();
        Self {
            time: 0.0,
            scroll: 0.0,
            score: 0,
            high_score: 0,
            jump_offset: 0.0,
            character: CharacterState::Waiting,
            world_seed: 0,
            debug_overlay: false,
            signal_collisions: false,
            collision_threshold: COLLISION_THRESHOLD,
            collision_color: Vec3::from(config.collision_color),
            sky_top: Vec3::from(config.sky_top),
            sky_bottom: Vec3::from(config.sky_bottom),
            collision_view: ViewRect::collision_window(),
        }
    }
}

impl FrameParams {
    /// Main-pass parameters; debug mode shows the overlay and colours hits
    pub fn from_state(state: &GameState, config: &Config, debug: bool) -> Self {
        Self {
            time: state.time,
            scroll: state.distance_ran,
            score: state.score(),
            high_score: state.high_score,
            jump_offset: state.jump.offset(),
            character: state.character,
            world_seed: state.world_seed,
            debug_overlay: debug,
            signal_collisions: debug,
            collision_threshold: config.collision_threshold,
            collision_color: Vec3::from(config.collision_color),
            sky_top: Vec3::from(config.sky_top),
            sky_bottom: Vec3::from(config.sky_bottom),
            collision_view: ViewRect::collision_window(),
        }
    }

    /// Same snapshot as seen by the collision pass: overlay off, signal on
    pub fn for_collision_pass(self) -> Self {
        Self {
            debug_overlay: false,
            signal_collisions: true,
            ..self
        }
    }
}

/// Straight-alpha `src` over `dst`
pub fn over(dst: Vec4, src: Vec4) -> Vec4 {
    let a = src.w + dst.w * (1.0 - src.w);
    let rgb = (src.xyz() * src.w + dst.xyz() * dst.w * (1.0 - src.w)) / a.max(1e-6);
    rgb.extend(a)
}

/// Background gradient, bottom to top across the game frame
pub fn sky_gradient(p: Vec2, params: &FrameParams) -> Vec3 {
    let t = (p.y / GAME_HEIGHT).clamp(0.0, 1.0);
    params.sky_bottom.lerp(params.sky_top, t)
}

/// `mix(c, 1 - c, progress)`
pub fn invert(c: Vec3, progress: f32) -> Vec3 {
    c.lerp(Vec3::ONE - c, progress)
}

/// Silhouette tone far from the character's own colour
pub fn probe_tone(character: Vec4) -> f32 {
    let luma = character.xyz().dot(Vec3::new(0.2126, 0.7152, 0.0722));
    if luma < 0.5 { 1.0 } else { 0.0 }
}

fn in_game_frame(p: Vec2) -> bool {
    ViewRect::GAME_FRAME.contains(p)
}

/// Collision window outline plus a gauge showing the current jump height
pub fn debug_overlay(p: Vec2, params: &FrameParams) -> Vec4 {
    let view = params.collision_view;
    let window = sdf::sd_rounded_box(p - view.center(), view.size * 0.5, 0.02);
    let outline = sdf::stroke(window, 0.008, 0.003);

    let base = Vec2::new(TREX_LEFT - 0.1, GROUND_Y);
    let tip = base + Vec2::new(0.0, params.jump_offset);
    let bar = sdf::sd_segment(p, base, tip, 0.01);
    let knob = sdf::sd_circle(p - tip, 0.025);
    let gauge = sdf::op_intersect(sdf::op_smooth_union(bar, knob, 0.02), window);

    let coverage = outline.max(sdf::fill(gauge, 0.003));
    DEBUG_COLOR.extend(coverage * DEBUG_ALPHA)
}

/// Background layers shared by every composite of one pixel
fn backdrop(sheet: &SpriteSheet, p: Vec2, params: &FrameParams, night: crate::shade::NightModeSample) -> Vec4 {
    let mut c = sky_gradient(p, params).extend(1.0);
    c = over(c, sky::stars(sheet, p, params.scroll, params.world_seed, night.progress));
    c = over(c, sky::moon(sheet, p, params.scroll, night));
    c = over(c, sky::clouds(sheet, p, params.scroll, params.world_seed));
    over(c, horizon::horizon(sheet, p, params.scroll))
}

/// Character and obstacle colours at `p`
fn actors(sheet: &SpriteSheet, p: Vec2, params: &FrameParams) -> (Vec4, Vec4) {
    let character = trex::trex(
        sheet,
        p,
        params.character,
        params.time,
        params.jump_offset,
        params.world_seed,
    );
    let obstacle = obstacles::obstacles(sheet, p, params.scroll, params.time, params.world_seed);
    (character, obstacle)
}

/// Whether the character and an obstacle overlap at `p`
fn overlaps(base: Vec4, character: Vec4, obstacle: Vec4, threshold: f32) -> bool {
    let probe = Vec3::splat(probe_tone(character)).extend(obstacle.w);
    let behind = over(over(base, character), probe);
    let front = over(over(base, probe), character);
    (front - behind).xyz().abs().max_element() > threshold
}

/// Collision predicate for `p` alone, independent of the override flag
pub fn collision_probe(sheet: &SpriteSheet, p: Vec2, params: &FrameParams) -> bool {
    if !in_game_frame(p) {
        return false;
    }
    let night = calculate_night_mode(params.score as f32);
    let base = backdrop(sheet, p, params, night);
    let (character, obstacle) = actors(sheet, p, params);
    overlaps(base, character, obstacle, params.collision_threshold)
}

/// Final opaque colour of world point `p`
pub fn compose(sheet: &SpriteSheet, p: Vec2, params: &FrameParams) -> Vec4 {
    let night = calculate_night_mode(params.score as f32);

    if !in_game_frame(p) {
        return invert(sky_gradient(p, params), night.progress).extend(1.0);
    }

    let base = backdrop(sheet, p, params, night);
    let (character, obstacle) = actors(sheet, p, params);

    let mut c = over(over(over(base, character), obstacle), character);
    let flashing = params.character != CharacterState::Crashed;
    c = over(c, score::score(sheet, p, params.score, params.high_score, params.time, flashing));
    if params.character == CharacterState::Crashed {
        c = over(c, game_over::game_over(sheet, p, params.time));
    }

    let mut rgb = invert(c.xyz(), night.progress);

    if params.debug_overlay {
        rgb = over(rgb.extend(1.0), debug_overlay(p, params)).xyz();
    }

    if params.signal_collisions && overlaps(base, character, obstacle, params.collision_threshold) {
        rgb = params.collision_color;
    }

    rgb.extend(1.0)
}

/// Quantize a linear colour the way an `Rgba8Unorm` target stores it
pub fn to_rgba8(c: Vec4) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(c.x), q(c.y), q(c.z), q(c.w)]
}

/// Render `view` into a tightly packed RGBA8 buffer of `width` x `height`
pub fn render_region(
    sheet: &SpriteSheet,
    params: &FrameParams,
    view: ViewRect,
    width: u32,
    height: u32,
    out: &mut [u8],
) {
    let resolution = Vec2::new(width as f32, height as f32);
    for (i, px) in out.chunks_exact_mut(4).take((width * height) as usize).enumerate() {
        let frag = Vec2::new((i as u32 % width) as f32 + 0.5, (i as u32 / width) as f32 + 0.5);
        let p = view.to_world(frag, resolution);
        px.copy_from_slice(&to_rgba8(compose(sheet, p, params)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{COLLISION_TARGET_HEIGHT, COLLISION_TARGET_WIDTH};
    use crate::shade::entities::obstacles::{OBSTACLE_SEGMENT_WIDTH, segment_obstacle};
    use crate::shade::sprite::rects;
    use crate::sim::collision::scan_for_collision_color;
    use proptest::prelude::*;

    fn ink_sheet() -> SpriteSheet {
        SpriteSheet::solid(1233, 68, [83, 83, 83, 255])
    }

    fn aux(params: FrameParams) -> FrameParams {
        params.for_collision_pass()
    }

    /// Scroll at which an obstacle on the ground sits under the character
    fn overlapping_scroll(seed: u32) -> f32 {
        let o = (3..500)
            .find_map(|s| segment_obstacle(s, seed).filter(|o| o.bottom < 0.2))
            .unwrap();
        o.center_x - (TREX_LEFT + rects::TREX.world_size().x * 0.5)
    }

    /// Whether the character and any obstacle bounding boxes intersect
    fn boxes_overlap(params: &FrameParams) -> bool {
        let rect = trex::trex_rect(params.character, params.time, params.world_seed);
        let tc = trex::trex_center(rect, params.jump_offset);
        let th = rect.world_size() * 0.5;
        let first = ((params.scroll + TREX_LEFT - 1.0) / OBSTACLE_SEGMENT_WIDTH).floor() as i32;
        (first..first + 3).filter_map(|s| segment_obstacle(s, params.world_seed)).any(|o| {
            let oc = o.center(params.time) - Vec2::new(params.scroll, 0.0);
            let oh = o.half_size(params.time);
            (oc.x - tc.x).abs() <= oh.x + th.x && (oc.y - tc.y).abs() <= oh.y + th.y
        })
    }

    fn collision_frame(params: &FrameParams, sheet: &SpriteSheet) -> Vec<u8> {
        let (w, h) = (COLLISION_TARGET_WIDTH, COLLISION_TARGET_HEIGHT);
        let mut buf = vec![0u8; (w * h * 4) as usize];
        render_region(sheet, params, ViewRect::collision_window(), w, h, &mut buf);
        buf
    }

    #[test]
    fn test_over_identities() {
        let dst = Vec4::new(0.3, 0.4, 0.5, 1.0);
        assert_eq!(over(dst, Vec4::ZERO), dst);
        let src = Vec4::new(0.1, 0.2, 0.3, 1.0);
        assert_eq!(over(dst, src), src);
        assert_eq!(over(Vec4::ZERO, Vec4::ZERO), Vec4::ZERO);
    }

    #[test]
    fn test_fit_game_frame_letterboxes() {
        let wide = ViewRect::fit_game_frame(1600.0, 200.0);
        assert!((wide.size.y - GAME_HEIGHT).abs() < 1e-6);
        assert!(wide.origin.x < 0.0);
        let tall = ViewRect::fit_game_frame(600.0, 600.0);
        assert!((tall.size.x - GAME_WIDTH).abs() < 1e-6);
        assert!(tall.contains(Vec2::new(0.0, 0.0)));
        assert!(tall.contains(Vec2::new(GAME_WIDTH, GAME_HEIGHT)));
        assert!(ViewRect::GAME_FRAME.contains(Vec2::new(GAME_WIDTH, GAME_HEIGHT)));
        assert!(!ViewRect::GAME_FRAME.contains(Vec2::new(3.0, GAME_HEIGHT + 0.01)));
    }

    #[test]
    fn test_to_world_corners() {
        let view = ViewRect::new(Vec2::ZERO, Vec2::new(6.0, 1.5));
        let res = Vec2::new(600.0, 150.0);
        assert_eq!(view.to_world(Vec2::ZERO, res), Vec2::new(0.0, 1.5));
        assert_eq!(view.to_world(res, res), Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_outside_frame_is_sky() {
        let params = FrameParams::default();
        let p = Vec2::new(-1.0, 0.5);
        let expected = sky_gradient(p, &params).extend(1.0);
        assert_eq!(compose(&ink_sheet(), p, &params), expected);
    }

    #[test]
    fn test_night_inverts_before_override() {
        let sheet = SpriteSheet::blank();
        let day = FrameParams::default();
        let night = FrameParams { score: 850, ..day };
        let p = Vec2::new(2.0, 0.5);
        let d = compose(&sheet, p, &day).xyz();
        let n = compose(&sheet, p, &night).xyz();
        assert!((n - (Vec3::ONE - d)).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_overlap_signals_collision_color() {
        let sheet = ink_sheet();
        let params = aux(FrameParams {
            character: CharacterState::Running,
            scroll: overlapping_scroll(3),
            world_seed: 3,
            ..FrameParams::default()
        });
        let buf = collision_frame(&params, &sheet);
        let (w, h) = (COLLISION_TARGET_WIDTH, COLLISION_TARGET_HEIGHT);
        assert!(scan_for_collision_color(&buf, w, h, w * 4, params.collision_color, 0.01));
    }

    #[test]
    fn test_main_pass_hides_collisions_without_debug() {
        let sheet = ink_sheet();
        let params = FrameParams {
            character: CharacterState::Running,
            scroll: overlapping_scroll(3),
            world_seed: 3,
            ..FrameParams::default()
        };
        let buf = collision_frame(&params, &sheet);
        let (w, h) = (COLLISION_TARGET_WIDTH, COLLISION_TARGET_HEIGHT);
        assert!(!scan_for_collision_color(&buf, w, h, w * 4, params.collision_color, 0.01));
    }

    #[test]
    fn test_debug_overlay_outlines_window() {
        let params = FrameParams {
            debug_overlay: true,
            ..FrameParams::default()
        };
        let view = params.collision_view;
        let edge = Vec2::new(view.origin.x + view.size.x, view.center().y);
        assert!(debug_overlay(edge, &params).w > 0.5);
        assert_eq!(debug_overlay(view.center(), &params).w, 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn no_collision_color_without_overlap(
            score in 0u32..3000,
            time in 0.0f32..60.0,
            jump in 0.0f32..1.2,
            scroll in 0.0f32..2000.0,
            seed in any::<u32>(),
            night_sky in any::<bool>(),
        ) {
            let mut params = aux(FrameParams {
                score,
                time,
                scroll,
                jump_offset: jump,
                world_seed: seed,
                character: if jump > 0.0 { CharacterState::Jumping } else { CharacterState::Running },
                ..FrameParams::default()
            });
            if night_sky {
                params.sky_top = Vec3::new(0.55, 0.75, 0.95);
                params.sky_bottom = Vec3::new(0.95, 0.97, 1.0);
            }
            prop_assume!(!boxes_overlap(&params));

            let buf = collision_frame(&params, &ink_sheet());
            let (w, h) = (COLLISION_TARGET_WIDTH, COLLISION_TARGET_HEIGHT);
            prop_assert!(!scan_for_collision_color(&buf, w, h, w * 4, params.collision_color, 0.01));
        }
    }
}
