//! Game state and core simulation types
//!
//! Everything the loop mutates between frames lives on `GameState`; there is
//! no module-level state.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::jump::JumpIntegrator;
use crate::consts::*;

/// Character pose, doubling as the game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum CharacterState {
    /// Before the first jump; nothing scrolls
    #[default]
    Waiting = 0,
    Running = 1,
    Jumping = 2,
    Ducking = 3,
    /// Run over; speed is zero until restart
    Crashed = 4,
}

impl CharacterState {
    pub const COUNT: usize = 5;

    /// Value written to the uniform block
    pub fn discriminant(self) -> u32 {
        self as u32
    }

    /// Whether the world scrolls in this state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Jumping | Self::Ducking)
    }
}

/// Things that happened during a tick, for sound and persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Jumped,
    /// Score crossed a multiple of `ACHIEVEMENT_SCORE`
    Milestone(u32),
    Crashed { new_high_score: Option<u32> },
    Restarted,
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the per-run world seeds are drawn from
    pub seed: u64,
    /// Hash seed for obstacle, cloud and star placement this run
    pub world_seed: u32,
    /// Bumped on every restart; tags collision readbacks
    pub run_id: u32,
    pub character: CharacterState,
    /// World units scrolled this run
    pub distance_ran: f32,
    /// Current run speed (world units / s)
    pub speed: f32,
    /// Seconds since the page loaded or the run restarted
    pub time: f32,
    pub jump: JumpIntegrator,
    pub high_score: u32,
    /// Duck key currently down
    pub duck_held: bool,
    /// Last milestone announced
    pub last_milestone: u32,
}

impl GameState {
    /// Fresh state waiting for the first jump
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            world_seed: 0,
            run_id: 0,
            character: CharacterState::Waiting,
            distance_ran: 0.0,
            speed: START_SPEED,
            time: 0.0,
            jump: JumpIntegrator::new(),
            high_score: 0,
            duck_held: false,
            last_milestone: 0,
        };
        state.world_seed = state.derive_world_seed();
        state
    }

    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    fn derive_world_seed(&self) -> u32 {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        // One draw per run so each restart gets a new world
        for _ in 0..self.run_id {
            let _: u32 = rng.random();
        }
        rng.random()
    }

    /// floor(distance_ran * DISTANCE_COEFFICIENT), capped for display
    pub fn score(&self) -> u32 {
        ((self.distance_ran * DISTANCE_COEFFICIENT).floor() as u32).min(MAX_SCORE)
    }

    /// Stop the run. Idempotent; returns the new high score if it was beaten
    pub fn crash(&mut self) -> Option<u32> {
        if self.character == CharacterState::Crashed {
            return None;
        }
        self.character = CharacterState::Crashed;
        self.speed = 0.0;
        self.jump.reset();
        self.duck_held = false;

        let score = self.score();
        if score > self.high_score {
            self.high_score = score;
            Some(score)
        } else {
            None
        }
    }

    /// Restart in place, straight into a running state
    pub fn reset(&mut self) {
        self.run_id = self.run_id.wrapping_add(1);
        self.world_seed = self.derive_world_seed();
        self.character = CharacterState::Running;
        self.distance_ran = 0.0;
        self.speed = START_SPEED;
        self.time = 0.0;
        self.jump.reset();
        self.duck_held = false;
        self.last_milestone = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_match_shader_table() {
        let states = [
            CharacterState::Waiting,
            CharacterState::Running,
            CharacterState::Jumping,
            CharacterState::Ducking,
            CharacterState::Crashed,
        ];
        for (i, state) in states.into_iter().enumerate() {
            assert_eq!(state.discriminant(), i as u32);
        }
        assert_eq!(states.len(), CharacterState::COUNT);
    }

    #[test]
    fn test_score_from_distance() {
        let mut state = GameState::new(1);
        state.distance_ran = 10.39;
        assert_eq!(state.score(), 25);
        state.distance_ran = 1e9;
        assert_eq!(state.score(), MAX_SCORE);
    }

    #[test]
    fn test_crash_is_idempotent() {
        let mut state = GameState::new(1).with_high_score(10);
        state.character = CharacterState::Running;
        state.distance_ran = 20.0;
        assert_eq!(state.crash(), Some(50));
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.crash(), None);
        assert_eq!(state.high_score, 50);
    }

    #[test]
    fn test_crash_below_high_score() {
        let mut state = GameState::new(1).with_high_score(500);
        state.character = CharacterState::Running;
        state.distance_ran = 20.0;
        assert_eq!(state.crash(), None);
        assert_eq!(state.high_score, 500);
    }

    #[test]
    fn test_reset_starts_running() {
        let mut state = GameState::new(9);
        let first_world = state.world_seed;
        state.character = CharacterState::Running;
        state.distance_ran = 123.0;
        state.crash();
        state.reset();

        assert_eq!(state.distance_ran, 0.0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.character, CharacterState::Running);
        assert_eq!(state.speed, START_SPEED);
        assert_eq!(state.run_id, 1);
        assert_ne!(state.world_seed, first_world);
    }

    #[test]
    fn test_same_seed_same_world() {
        assert_eq!(GameState::new(5).world_seed, GameState::new(5).world_seed);
    }
}
