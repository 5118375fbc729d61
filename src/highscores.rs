//! Best score
//!
//! A single number persisted to LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_SCORE;

/// Best score reached on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScore(pub u32);

impl HighScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "trex_runner_highscore";

    pub fn value(self) -> u32 {
        self.0
    }

    /// Record `score`; true if it beat the stored best
    pub fn submit(&mut self, score: u32) -> bool {
        let score = score.min(MAX_SCORE);
        if score > self.0 {
            self.0 = score;
            true
        } else {
            false
        }
    }

    /// Load the high score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(score) = serde_json::from_str::<HighScore>(&json) {
                    log::info!("Loaded high score {}", score.0);
                    return Self(score.0.min(MAX_SCORE));
                }
            }
        }

        log::info!("No high score found, starting fresh");
        Self::default()
    }

    /// Save the high score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("High score saved ({})", self.0);
            }
        }
    }

    /// Remove the stored value (debug action)
    #[cfg(target_arch = "wasm32")]
    pub fn clear(&mut self) {
        self.0 = 0;
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if let Some(storage) = storage {
            let _ = storage.remove_item(Self::STORAGE_KEY);
            log::info!("High score cleared");
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

    #[cfg(not(target_arch = "wasm32"))]
    pub fn clear(&mut self) {
        self.0 = 0;
    }
}
