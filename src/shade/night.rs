//! Night mode as a pure function of score

use crate::smoothstep;

/// Night falls every this many points
pub const NIGHT_INTERVAL: f32 = 700.0;
/// Length of each night, starting at the interval boundary
pub const NIGHT_WINDOW: f32 = 250.0;
/// Fade length at each edge of the window
pub const NIGHT_TRANSITION: f32 = 50.0;
/// Distinct moon phases cycled through night after night
pub const MOON_PHASES: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightModeSample {
    /// 0 = day, 1 = full night
    pub progress: f32,
    /// Completed night intervals, selects the moon phase
    pub cycle_count: u32,
}

impl NightModeSample {
    /// Moon phase index, cycling through the seven-phase strip
    pub fn moon_phase(&self) -> u32 {
        self.cycle_count % MOON_PHASES
    }
}

/// Fade progress and cycle counter for `score`
pub fn calculate_night_mode(score: f32) -> NightModeSample {
    let cycle = (score / NIGHT_INTERVAL).floor().max(0.0);
    let local = score - cycle * NIGHT_INTERVAL;

    let fade_in = smoothstep(0.0, NIGHT_TRANSITION, local);
    let fade_out = 1.0 - smoothstep(NIGHT_WINDOW - NIGHT_TRANSITION, NIGHT_WINDOW, local);
    let active = if cycle >= 1.0 { 1.0 } else { 0.0 };

    NightModeSample {
        progress: fade_in * fade_out * active,
        cycle_count: cycle as u32,
    }
}
