//! Collision readback bookkeeping and the pixel scan
//!
//! The GPU marks overlapping pixels with the collision colour; this module
//! decides when a readback may start and finds that colour in the bytes that
//! come back. Nothing here touches the device.

use glam::Vec3;

/// Where a detection cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPhase {
    #[default]
    Idle,
    /// Auxiliary pass encoded and submitted
    Rendering,
    /// Waiting on `map_async`
    ReadingBack,
    /// Pixels mapped, looking for the collision colour
    Scanning,
}

/// Outcome of one detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackResult {
    /// Run the readback was started in
    pub run_id: u32,
    pub hit: bool,
}

impl ReadbackResult {
    /// Only results from the current run may crash it
    pub fn applies_to(&self, run_id: u32) -> bool {
        self.hit && self.run_id == run_id
    }
}

/// Wall-clock gate allowing at most one readback in flight
///
/// A tick that arrives while a request is pending is skipped, never queued.
#[derive(Debug, Clone)]
pub struct ReadbackGate {
    interval_ms: f64,
    last_start_ms: Option<f64>,
    phase: CollisionPhase,
}

impl ReadbackGate {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms as f64,
            last_start_ms: None,
            phase: CollisionPhase::Idle,
        }
    }

    pub fn phase(&self) -> CollisionPhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.phase != CollisionPhase::Idle
    }

    /// Claim the next cycle at `now_ms`; false while busy or too soon
    pub fn try_begin(&mut self, now_ms: f64) -> bool {
        if self.in_flight() {
            return false;
        }
        if matches!(self.last_start_ms, Some(last) if now_ms - last < self.interval_ms) {
            return false;
        }
        self.last_start_ms = Some(now_ms);
        self.phase = CollisionPhase::Rendering;
        true
    }

    /// Advance the in-flight cycle; ignored when idle
    pub fn advance(&mut self, phase: CollisionPhase) {
        if self.in_flight() {
            self.phase = phase;
        }
    }

    /// Cycle finished (or failed); the next interval may start
    pub fn finish(&mut self) {
        self.phase = CollisionPhase::Idle;
    }
}

/// Whether any pixel matches `color` within `tolerance` on every channel
///
/// `pixels` holds `height` rows of `bytes_per_row` bytes, of which the first
/// `width * 4` are RGBA8 texels and the rest padding.
pub fn scan_for_collision_color(
    pixels: &[u8],
    width: u32,
    height: u32,
    bytes_per_row: u32,
    color: Vec3,
    tolerance: f32,
) -> bool {
    let row_bytes = (width * 4) as usize;
    pixels
        .chunks(bytes_per_row as usize)
        .take(height as usize)
        .any(|row| {
            row[..row_bytes.min(row.len())].chunks_exact(4).any(|px| {
                let c = Vec3::new(px[0] as f32, px[1] as f32, px[2] as f32) / 255.0;
                (c - color).abs().max_element() <= tolerance
            })
        })
}
