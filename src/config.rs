//! Game configuration
//!
//! Persisted separately from the high score in LocalStorage.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::COLLISION_THRESHOLD;

/// Sky gradient rows checked by `Config::validate`
const SKY_SAMPLES: usize = 17;

/// Reasons a configuration is refused
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Normal rendering can produce a colour this close to the collision colour
    CollisionColorAmbiguous {
        /// Gradient position (0 = bottom, 1 = top) of the offending sky row
        sky_t: f32,
        distance: f32,
    },
    /// Tolerance outside (0, 0.25]
    ToleranceOutOfRange(f32),
    /// Overlap threshold outside (0, 0.5]
    ThresholdOutOfRange(f32),
    /// A channel outside [0, 1] is clamped by the render target and never matches
    CollisionColorOutOfRange([f32; 3]),
    /// A zero interval would start a readback every frame
    IntervalOutOfRange(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::CollisionColorAmbiguous { sky_t, distance } => write!(
                f,
                "collision colour is {distance:.4} from colours reachable over the sky at t={sky_t:.2}"
            ),
            ConfigError::ToleranceOutOfRange(t) => write!(f, "collision tolerance {t} out of range"),
            ConfigError::ThresholdOutOfRange(t) => write!(f, "collision threshold {t} out of range"),
            ConfigError::CollisionColorOutOfRange(c) => {
                write!(f, "collision colour {c:?} has a channel outside [0, 1]")
            }
            ConfigError::IntervalOutOfRange(ms) => write!(f, "collision interval {ms} ms out of range"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // === Collision ===
    /// Reserved colour the shader writes on overlapping pixels (linear RGB)
    pub collision_color: [f32; 3],
    /// Per-channel match tolerance used by the readback scan
    pub collision_tolerance: f32,
    /// Per-channel divergence that marks a pixel as overlapping
    pub collision_threshold: f32,
    /// Minimum wall-clock time between readbacks
    pub collision_interval_ms: u32,

    // === Background ===
    pub sky_top: [f32; 3],
    pub sky_bottom: [f32; 3],

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collision_color: [1.0, 0.0, 1.0],
            collision_tolerance: 0.01,
            collision_threshold: COLLISION_THRESHOLD,
            collision_interval_ms: 50,

            sky_top: [0.98, 0.98, 0.98],
            sky_bottom: [0.93, 0.93, 0.93],

            master_volume: 0.8,
            muted: false,
        }
    }
}

/// Distance from `q` to the plane through the origin spanned by `sky` and grey
///
/// Every colour the compositor can produce over a pixel whose sky colour is
/// `sky` lies on that plane: sprites are grey, so blending stays in
/// span(sky, grey), and night inversion `c * (1 - 2p) + p` does too.
pub fn distance_to_sky_plane(q: Vec3, sky: Vec3) -> f32 {
    let grey = Vec3::ONE.normalize();
    let chroma = sky - grey * sky.dot(grey);
    let along_grey = q - grey * q.dot(grey);
    if chroma.length() < 1e-6 {
        return along_grey.length();
    }
    let chroma = chroma.normalize();
    (along_grey - chroma * along_grey.dot(chroma)).length()
}

impl Config {
    /// Check that the collision colour cannot be produced by normal rendering
    ///
    /// Conservative: rejects a colour if it lies within `2 * tolerance` per
    /// channel of the colour plane reachable over any sampled sky row.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.collision_tolerance > 0.0 && self.collision_tolerance <= 0.25) {
            return Err(ConfigError::ToleranceOutOfRange(self.collision_tolerance));
        }
        if !(self.collision_threshold > 0.0 && self.collision_threshold <= 0.5) {
            return Err(ConfigError::ThresholdOutOfRange(self.collision_threshold));
        }
        if !self.collision_color.iter().all(|c| (0.0..=1.0).contains(c)) {
            return Err(ConfigError::CollisionColorOutOfRange(self.collision_color));
        }
        if self.collision_interval_ms == 0 {
            return Err(ConfigError::IntervalOutOfRange(self.collision_interval_ms));
        }

        let q = Vec3::from(self.collision_color);
        let margin = 2.0 * self.collision_tolerance * 3.0_f32.sqrt();
        let (bottom, top) = (Vec3::from(self.sky_bottom), Vec3::from(self.sky_top));
        for i in 0..SKY_SAMPLES {
            let sky_t = i as f32 / (SKY_SAMPLES - 1) as f32;
            let distance = distance_to_sky_plane(q, bottom.lerp(top, sky_t));
            if distance <= margin {
                return Err(ConfigError::CollisionColorAmbiguous { sky_t, distance });
            }
        }
        Ok(())
    }

    /// Validated copy, falling back to defaults when the stored one is unsafe
    pub fn validated(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                log::warn!("Invalid config ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Effective master gain
    pub fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume.clamp(0.0, 1.0) }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "trex_runner_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<Config>(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config.validated();
                    }
                    Err(e) => log::warn!("Stored config unreadable: {e}"),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Config saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
