//! Pixel-readback collision detector
//!
//! Owns the small offscreen target the collision pass draws into and the
//! buffer it is copied to. One readback at most is in flight; results are
//! tagged with the run they were started in.

use std::sync::mpsc;

use glam::Vec3;

use crate::consts::{COLLISION_TARGET_HEIGHT, COLLISION_TARGET_WIDTH};
use crate::sim::{CollisionPhase, ReadbackGate, ReadbackResult, scan_for_collision_color};

/// Format of the collision target; no sRGB encode, so the reserved colour is stored as-is
pub const COLLISION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Row pitch for a buffer copy of `width` RGBA8 texels
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

enum ReadbackState {
    Idle,
    Pending {
        rx: mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
        run_id: u32,
    },
}

pub struct CollisionDetector {
    pub view: wgpu::TextureView,
    target: wgpu::Texture,
    readback: wgpu::Buffer,
    bytes_per_row: u32,
    gate: ReadbackGate,
    state: ReadbackState,
    color: Vec3,
    tolerance: f32,
}

impl CollisionDetector {
    pub fn new(device: &wgpu::Device, interval_ms: u32, color: Vec3, tolerance: f32) -> Self {
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("collision_target"),
            size: wgpu::Extent3d {
                width: COLLISION_TARGET_WIDTH,
                height: COLLISION_TARGET_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLLISION_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes_per_row = padded_bytes_per_row(COLLISION_TARGET_WIDTH);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("collision_readback"),
            size: (bytes_per_row * COLLISION_TARGET_HEIGHT) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            view,
            target,
            readback,
            bytes_per_row,
            gate: ReadbackGate::new(interval_ms),
            state: ReadbackState::Idle,
            color,
            tolerance,
        }
    }

    pub fn phase(&self) -> CollisionPhase {
        self.gate.phase()
    }

    /// Claim a detection cycle; the caller then encodes the pass and `encode_copy`
    pub fn try_begin(&mut self, now_ms: f64) -> bool {
        self.gate.try_begin(now_ms)
    }

    /// Copy the rendered target into the readback buffer
    pub fn encode_copy(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(COLLISION_TARGET_HEIGHT),
                },
            },
            wgpu::Extent3d {
                width: COLLISION_TARGET_WIDTH,
                height: COLLISION_TARGET_HEIGHT,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Request the mapping once the copy has been submitted
    pub fn after_submit(&mut self, run_id: u32) {
        let (tx, rx) = mpsc::channel();
        self.readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.gate.advance(CollisionPhase::ReadingBack);
        self.state = ReadbackState::Pending { rx, run_id };
    }

    /// Non-blocking check for a finished readback
    pub fn poll(&mut self, device: &wgpu::Device) -> Option<ReadbackResult> {
        let ReadbackState::Pending { rx, run_id } = &self.state else {
            return None;
        };
        let run_id = *run_id;

        if let Err(e) = device.poll(wgpu::PollType::Poll) {
            log::warn!("Device poll failed: {e}");
        }

        let received = rx.try_recv();
        match received {
            Ok(Ok(())) => {
                self.gate.advance(CollisionPhase::Scanning);
                let hit = {
                    let pixels = self.readback.slice(..).get_mapped_range();
                    scan_for_collision_color(
                        &pixels,
                        COLLISION_TARGET_WIDTH,
                        COLLISION_TARGET_HEIGHT,
                        self.bytes_per_row,
                        self.color,
                        self.tolerance,
                    )
                };
                self.readback.unmap();
                self.finish();
                Some(ReadbackResult { run_id, hit })
            }
            Ok(Err(e)) => {
                log::warn!("Collision readback failed: {e}");
                self.finish();
                None
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                log::warn!("Collision readback dropped");
                self.finish();
                None
            }
        }
    }

    fn finish(&mut self) {
        self.state = ReadbackState::Idle;
        self.gate.finish();
    }
}
