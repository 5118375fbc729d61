//! Audio system using Web Audio API
//!
//! Procedurally generated blips in the spirit of the original game's sounds,
//! so no audio files are fetched. A missing `AudioContext` leaves every
//! `play` call silent.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Take-off
    Jump,
    /// Every hundred points
    Milestone,
    /// Ran into an obstacle
    Crash,
    /// Crashed with a new best score
    HighScore,
}

impl SoundEffect {
    /// Sound to play for a game event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Jumped => Some(Self::Jump),
            GameEvent::Milestone(_) => Some(Self::Milestone),
            GameEvent::Crashed { new_high_score: Some(_) } => Some(Self::HighScore),
            GameEvent::Crashed { new_high_score: None } => Some(Self::Crash),
            GameEvent::Started | GameEvent::Restarted => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Jump => self.play_jump(ctx, vol),
            SoundEffect::Milestone => self.play_milestone(ctx, vol),
            SoundEffect::Crash => self.play_crash(ctx, vol),
            SoundEffect::HighScore => {
                self.play_crash(ctx, vol);
                self.play_high_score(ctx, vol);
            }
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Jump - short square-wave chirp
    fn play_jump(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 520.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.15, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.08)
            .ok();
        osc.frequency().set_value_at_time(520.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(780.0, t + 0.06)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.1).ok();
    }

    /// Milestone - two rising beeps
    fn play_milestone(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [880.0, 1320.0].iter().enumerate() {
            let delay = i as f64 * 0.09;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.12, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.09).ok();
            }
        }
    }

    /// Crash - low buzzing thud
    fn play_crash(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(60.0, t + 0.25)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        // Bass thump
        if let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.12).ok();
        }
    }

    /// High score - celebratory arpeggio after the crash
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
            let delay = 0.3 + i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }
}
