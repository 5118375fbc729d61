//! Vertical jump kinematics
//!
//! Constant acceleration, integrated exactly rather than with Euler steps, so
//! the landing time does not depend on the frame rate.

use serde::{Deserialize, Serialize};

/// Downward acceleration (world units / s^2)
pub const GRAVITY: f32 = 21.6;
/// Take-off velocity at rest (world units / s)
pub const INITIAL_JUMP_VELOCITY: f32 = 6.0;
/// Fastest take-off; the apex at this velocity keeps the sprite inside the frame
pub const MAX_JUMP_VELOCITY: f32 = 6.3;
/// Upward velocity cap after an early release
pub const DROP_VELOCITY: f32 = 3.0;
/// Releasing the jump key below this height has no effect yet
pub const MIN_JUMP_HEIGHT: f32 = 0.3;
/// Gravity multiplier while speed-dropping
pub const SPEED_DROP_COEFFICIENT: f32 = 3.0;
/// Velocity forced by a speed drop
pub const SPEED_DROP_VELOCITY: f32 = -0.6;

/// Air time of a jump launched at `v0` under gravity `g`
pub fn flight_time(v0: f32, g: f32) -> f32 {
    2.0 * v0 / g
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpIntegrator {
    offset: f32,
    velocity: f32,
    airborne: bool,
    /// Set once `MIN_JUMP_HEIGHT` is passed; early releases wait for it
    reached_min_height: bool,
    /// Release requested before the minimum height was reached
    release_pending: bool,
    speed_drop: bool,
}

impl JumpIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height above the ground line
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn is_speed_dropping(&self) -> bool {
        self.speed_drop
    }

    /// Take off with `initial_velocity`; ignored while already airborne
    pub fn start(&mut self, initial_velocity: f32) -> bool {
        if self.airborne {
            return false;
        }
        *self = Self {
            velocity: initial_velocity,
            airborne: true,
            ..Self::default()
        };
        true
    }

    /// Jump key released: cut the ascent short
    pub fn release(&mut self) {
        if !self.airborne {
            return;
        }
        if self.reached_min_height {
            self.velocity = self.velocity.min(DROP_VELOCITY);
        } else {
            self.release_pending = true;
        }
    }

    /// Duck pressed mid-air: fall fast
    pub fn speed_drop(&mut self) {
        if self.airborne {
            self.speed_drop = true;
            self.velocity = self.velocity.min(SPEED_DROP_VELOCITY);
        }
    }

    /// Advance by `dt`; returns true on the step that lands
    pub fn step(&mut self, dt: f32) -> bool {
        if !self.airborne {
            return false;
        }

        let g = if self.speed_drop {
            GRAVITY * SPEED_DROP_COEFFICIENT
        } else {
            GRAVITY
        };
        self.offset += self.velocity * dt - 0.5 * g * dt * dt;
        self.velocity -= g * dt;

        if !self.reached_min_height && self.offset >= MIN_JUMP_HEIGHT {
            self.reached_min_height = true;
            if self.release_pending {
                self.velocity = self.velocity.min(DROP_VELOCITY);
            }
        }

        if self.offset <= 0.0 && self.velocity <= 0.0 {
            self.reset();
            return true;
        }
        false
    }

    /// Back on the ground, at rest
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
