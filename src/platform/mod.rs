//! Platform glue
//!
//! Browser queries the game loop needs at startup: the debug flag and the
//! kind of pointer, which decides the control hint shown. Native builds get
//! fixed answers.

/// Which control hint to surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProfile {
    /// Fine pointer and keyboard: "press space"
    Keyboard,
    /// Coarse pointer: "tap to jump"
    Touch,
}

impl InputProfile {
    /// Element id of the hint for this profile
    pub fn hint_element_id(self) -> &'static str {
        match self {
            InputProfile::Keyboard => "hint-keyboard",
            InputProfile::Touch => "hint-touch",
        }
    }
}

/// Query-string flag that turns on debug mode
pub const DEBUG_FLAG: &str = "debug";

/// Whether `search` (a `?a=b&c` query string) carries the debug flag
pub fn has_debug_flag(search: &str) -> bool {
    search
        .trim_start_matches('?')
        .split('&')
        .any(|pair| pair.split('=').next() == Some(DEBUG_FLAG))
}

/// Debug mode requested through the page URL
#[cfg(target_arch = "wasm32")]
pub fn debug_requested() -> bool {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .map(|s| has_debug_flag(&s))
        .unwrap_or(false)
}

/// Debug mode requested through the environment
#[cfg(not(target_arch = "wasm32"))]
pub fn debug_requested() -> bool {
    std::env::var_os("TREX_DEBUG").is_some()
}

/// Touch if the primary pointer is coarse
#[cfg(target_arch = "wasm32")]
pub fn input_profile() -> InputProfile {
    let coarse = web_sys::window()
        .and_then(|w| w.match_media("(pointer: coarse)").ok().flatten())
        .map(|m| m.matches())
        .unwrap_or(false);
    if coarse {
        InputProfile::Touch
    } else {
        InputProfile::Keyboard
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn input_profile() -> InputProfile {
    InputProfile::Keyboard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_parsing() {
        assert!(has_debug_flag("?debug"));
        assert!(has_debug_flag("?a=1&debug=true"));
        assert!(!has_debug_flag("?debugger"));
        assert!(!has_debug_flag(""));
        assert!(!has_debug_flag("?nodebug=1"));
    }

    #[test]
    fn test_hint_ids_differ() {
        assert_ne!(
            InputProfile::Keyboard.hint_element_id(),
            InputProfile::Touch.hint_element_id()
        );
    }
}
