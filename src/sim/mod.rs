//! Game simulation
//!
//! CPU-side state only: the run, the jump, and the collision readback
//! bookkeeping. No rendering or platform dependencies.

pub mod collision;
pub mod jump;
pub mod state;
pub mod tick;

pub use collision::{CollisionPhase, ReadbackGate, ReadbackResult, scan_for_collision_color};
pub use jump::{JumpIntegrator, flight_time};
pub use state::{CharacterState, GameEvent, GameState};
pub use tick::{TickInput, apply_collision, idle_input, tick};
