//! WebGPU rendering module
//!
//! The whole frame is one fragment shader; see `shade` for its CPU twin.

pub mod collision;
pub mod pipeline;
pub mod texture;
pub mod uniforms;

pub use collision::CollisionDetector;
pub use pipeline::RenderState;
pub use texture::{SPRITE_SHEET_PATH, TextureError, load_sprite_sheet};
pub use uniforms::Uniforms;
