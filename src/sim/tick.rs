//! Per-frame game loop step
//!
//! Advances time, speed, distance and the jump, and reports what happened as
//! a list of events. Collisions are not detected here; they arrive from the
//! GPU readback and are applied with `GameState::crash`.

use super::collision::ReadbackResult;
use super::jump::{INITIAL_JUMP_VELOCITY, MAX_JUMP_VELOCITY};
use super::state::{CharacterState, GameEvent, GameState};
use crate::consts::*;
use crate::shade::entities::obstacles::{OBSTACLE_SEGMENT_WIDTH, ObstacleKind, segment_obstacle};
use crate::shade::entities::trex::trex_rect;

/// Seconds of warning the auto-player wants before an obstacle arrives
pub const IDLE_LOOKAHEAD: f32 = 0.15;
/// Pterodactyl height slot the auto-player ducks under
const DUCK_SLOT: u32 = 1;

/// Input for one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Jump key went down this frame
    pub jump_pressed: bool,
    /// Jump key went up this frame
    pub jump_released: bool,
    /// Duck key is down
    pub duck_held: bool,
    /// Restart requested (tap or click on the crashed screen)
    pub restart: bool,
    /// Idle/demo mode - the game plays itself
    pub idle_mode: bool,
}

/// Take-off velocity grows with run speed so jumps cover more ground
pub fn jump_velocity(speed: f32) -> f32 {
    (INITIAL_JUMP_VELOCITY + speed / 30.0).min(MAX_JUMP_VELOCITY)
}

/// Advance the game by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.time += dt;

    let mut input = input.clone();
    if input.idle_mode {
        let auto = idle_input(state);
        input.jump_pressed |= auto.jump_pressed;
        input.duck_held |= auto.duck_held;
    }

    match state.character {
        CharacterState::Waiting => {
            if input.jump_pressed {
                state.character = CharacterState::Running;
                events.push(GameEvent::Started);
                start_jump(state, &mut events);
            }
            return events;
        }
        CharacterState::Crashed => {
            if input.restart || input.jump_pressed {
                state.reset();
                events.push(GameEvent::Restarted);
            }
            return events;
        }
        _ => {}
    }

    state.speed = (state.speed + ACCELERATION * dt).min(MAX_SPEED);
    state.distance_ran += state.speed * dt;
    state.duck_held = input.duck_held;

    if state.jump.is_airborne() {
        if input.jump_released {
            state.jump.release();
        }
        if input.duck_held && !state.jump.is_speed_dropping() {
            state.jump.speed_drop();
        }
        if state.jump.step(dt) {
            state.character = ground_state(state.duck_held);
        }
    } else if input.jump_pressed {
        start_jump(state, &mut events);
    } else {
        state.character = ground_state(state.duck_held);
    }

    let milestone = state.score() / ACHIEVEMENT_SCORE * ACHIEVEMENT_SCORE;
    if milestone > state.last_milestone {
        state.last_milestone = milestone;
        events.push(GameEvent::Milestone(milestone));
    }

    events
}

/// Crash the run if a readback from this run found an overlap
///
/// Results tagged with an earlier run, or arriving once the run is already
/// over, are dropped.
pub fn apply_collision(state: &mut GameState, result: ReadbackResult) -> Option<GameEvent> {
    if !result.applies_to(state.run_id) || !state.character.is_active() {
        return None;
    }
    let new_high_score = state.crash();
    Some(GameEvent::Crashed { new_high_score })
}

fn ground_state(duck_held: bool) -> CharacterState {
    if duck_held {
        CharacterState::Ducking
    } else {
        CharacterState::Running
    }
}

fn start_jump(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.jump.start(jump_velocity(state.speed)) {
        state.character = CharacterState::Jumping;
        events.push(GameEvent::Jumped);
    }
}

/// Auto-player: jump or duck when the next obstacle gets close
///
/// Looks ahead with the same dispatcher the shader draws from, so it reacts
/// to exactly what is on screen.
pub fn idle_input(state: &GameState) -> TickInput {
    if state.character == CharacterState::Waiting {
        return TickInput {
            jump_pressed: true,
            ..Default::default()
        };
    }
    if !state.character.is_active() {
        return TickInput::default();
    }

    let standing = trex_rect(CharacterState::Running, 0.0, 0).world_size().x;
    let trex_right = TREX_LEFT + standing;
    let first = ((state.distance_ran + TREX_LEFT) / OBSTACLE_SEGMENT_WIDTH).floor() as i32;

    let next = (first - 1..first + 3)
        .filter_map(|s| segment_obstacle(s, state.world_seed))
        .map(|o| {
            let half = o.half_size(state.time).x;
            (o, o.center_x - half - state.distance_ran, o.center_x + half - state.distance_ran)
        })
        .find(|(_, _, right)| *right > TREX_LEFT);

    let Some((obstacle, left, _)) = next else {
        return TickInput::default();
    };
    let gap = left - trex_right;
    if gap > state.speed * IDLE_LOOKAHEAD {
        return TickInput::default();
    }

    match obstacle.kind {
        ObstacleKind::Pterodactyl if obstacle.variant == DUCK_SLOT => TickInput {
            duck_held: true,
            ..Default::default()
        },
        ObstacleKind::Pterodactyl if obstacle.variant > DUCK_SLOT => TickInput::default(),
        _ => TickInput {
            jump_pressed: true,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::jump::{GRAVITY, flight_time};

    const DT: f32 = 1.0 / 60.0;

    fn hit(run_id: u32) -> ReadbackResult {
        ReadbackResult { run_id, hit: true }
    }

    fn running(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.character = CharacterState::Running;
        state
    }

    #[test]
    fn test_waiting_until_jump() {
        let mut state = GameState::new(1);
        for _ in 0..30 {
            assert!(tick(&mut state, &TickInput::default(), DT).is_empty());
        }
        assert_eq!(state.character, CharacterState::Waiting);
        assert_eq!(state.distance_ran, 0.0);

        let input = TickInput {
            jump_pressed: true,
            ..Default::default()
        };
        let events = tick(&mut state, &input, DT);
        assert_eq!(events, vec![GameEvent::Started, GameEvent::Jumped]);
        assert_eq!(state.character, CharacterState::Jumping);
    }

    #[test]
    fn test_jump_lands_back_running() {
        let mut state = running(1);
        let input = TickInput {
            jump_pressed: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.character, CharacterState::Jumping);

        let air = flight_time(jump_velocity(START_SPEED), GRAVITY);
        let frames = (air / DT).ceil() as usize + 2;
        for _ in 0..frames {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.character, CharacterState::Running);
        assert_eq!(state.jump.offset(), 0.0);
    }

    #[test]
    fn test_highest_jump_stays_in_frame() {
        use crate::shade::sprite::rects;

        let v = jump_velocity(MAX_SPEED);
        assert!(v > jump_velocity(START_SPEED));
        let apex = v * v / (2.0 * GRAVITY);
        let top = GROUND_Y + apex + rects::TREX.world_size().y;
        assert!(top <= GAME_HEIGHT, "sprite top {top} above the frame");
        assert_eq!(jump_velocity(1000.0), MAX_JUMP_VELOCITY);
    }

    #[test]
    fn test_duck_held() {
        let mut state = running(1);
        let input = TickInput {
            duck_held: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.character, CharacterState::Ducking);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.character, CharacterState::Running);
    }

    #[test]
    fn test_crashed_freezes_distance_until_restart() {
        let mut state = running(1);
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), DT);
        }
        state.crash();
        let frozen = state.distance_ran;
        assert!(frozen > 0.0);

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), DT);
            assert_eq!(state.distance_ran, frozen);
            assert_eq!(state.speed, 0.0);
        }

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        let events = tick(&mut state, &restart, DT);
        assert_eq!(events, vec![GameEvent::Restarted]);
        assert_eq!(state.distance_ran, 0.0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.character, CharacterState::Running);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut state = running(1);
        for _ in 0..60 * 60 * 5 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.speed, MAX_SPEED);
    }

    #[test]
    fn test_milestone_event() {
        let mut state = running(1);
        state.distance_ran = (ACHIEVEMENT_SCORE as f32 - 0.5) / DISTANCE_COEFFICIENT;
        let mut seen = Vec::new();
        for _ in 0..30 {
            seen.extend(tick(&mut state, &TickInput::default(), DT));
        }
        assert_eq!(seen, vec![GameEvent::Milestone(ACHIEVEMENT_SCORE)]);
    }

    #[test]
    fn test_idle_mode_jumps_cactus() {
        let mut state = running(4);
        let trex_right = TREX_LEFT + trex_rect(CharacterState::Running, 0.0, 0).world_size().x;
        let o = (3..200)
            .find_map(|s| segment_obstacle(s, state.world_seed).filter(|o| o.kind != ObstacleKind::Pterodactyl))
            .unwrap();
        // Left edge of the cactus a hair in front of the character
        state.distance_ran = o.center_x - o.half_size(0.0).x - trex_right - 0.05;

        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let events = tick(&mut state, &input, DT);
        assert!(events.contains(&GameEvent::Jumped));
    }

    #[test]
    fn test_idle_mode_starts_game() {
        let mut state = GameState::new(2);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.character, CharacterState::Jumping);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99_999);
        let mut b = GameState::new(99_999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            assert_eq!(tick(&mut a, &input, DT), tick(&mut b, &input, DT));
        }
        assert_eq!(a.distance_ran, b.distance_ran);
        assert_eq!(a.character, b.character);
    }

    #[test]
    fn test_collision_crashes_once() {
        let mut state = running(2);
        state.distance_ran = 100.0;
        let result = hit(state.run_id);
        let event = apply_collision(&mut state, result);
        assert_eq!(event, Some(GameEvent::Crashed { new_high_score: Some(250) }));
        assert_eq!(state.character, CharacterState::Crashed);
        assert_eq!(apply_collision(&mut state, result), None);
    }

    #[test]
    fn test_stale_collision_ignored_after_restart() {
        let mut state = running(2);
        let old_run = state.run_id;
        state.reset();
        assert_eq!(apply_collision(&mut state, hit(old_run)), None);
        assert!(state.character.is_active());
    }

    #[test]
    fn test_miss_does_nothing() {
        let mut state = running(2);
        let miss = ReadbackResult {
            run_id: state.run_id,
            hit: false,
        };
        assert_eq!(apply_collision(&mut state, miss), None);
    }

    #[test]
    fn test_waiting_ignores_collision() {
        let mut state = GameState::new(2);
        let result = hit(state.run_id);
        assert_eq!(apply_collision(&mut state, result), None);
        assert_eq!(state.character, CharacterState::Waiting);
    }
}
