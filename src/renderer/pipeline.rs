//! WebGPU render pipeline
//!
//! One fragment shader draws the whole frame from a fullscreen triangle.
//! The same shader runs twice: into the surface, and at a low fixed
//! resolution into the collision target with the collision override on.

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::collision::{COLLISION_FORMAT, CollisionDetector};
use super::texture::SpriteTexture;
use super::uniforms::Uniforms;
use crate::Config;
use crate::consts::{COLLISION_TARGET_HEIGHT, COLLISION_TARGET_WIDTH};
use crate::shade::{FrameParams, SpriteSheet, ViewRect};
use crate::sim::ReadbackResult;

/// Shader sources, concatenated into one module
const SHADER_SOURCES: [&str; 5] = [
    include_str!("shaders/compose.wgsl"),
    include_str!("shaders/hash.wgsl"),
    include_str!("shaders/sdf.wgsl"),
    include_str!("shaders/sprite.wgsl"),
    include_str!("shaders/entities.wgsl"),
];

/// Uniform buffer and bind group for one pass
struct PassBindings {
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PassBindings {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sprite: &SpriteTexture,
        label: &str,
    ) -> Self {
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&Uniforms::new(
                &FrameParams::default(),
                ViewRect::collision_window(),
                1,
                1,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sprite.sampler),
                },
            ],
        });

        Self {
            uniforms,
            bind_group,
        }
    }
}

pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    collision_pipeline: wgpu::RenderPipeline,

    main_pass: PassBindings,
    collision_pass: PassBindings,
    _sprite: SpriteTexture,
    detector: CollisionDetector,

    pub size: (u32, u32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        sheet: &SpriteSheet,
        game_config: &Config,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("trex-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trex_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCES.join("\n").into()),
        });

        let sprite = SpriteTexture::upload(&device, &queue, sheet);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trex_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let main_pass = PassBindings::new(&device, &bind_group_layout, &sprite, "main_uniforms");
        let collision_pass =
            PassBindings::new(&device, &bind_group_layout, &sprite, "collision_uniforms");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trex_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, "main_pipeline");
        let collision_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            COLLISION_FORMAT,
            "collision_pipeline",
        );

        let detector = CollisionDetector::new(
            &device,
            game_config.collision_interval_ms,
            Vec3::from(game_config.collision_color),
            game_config.collision_tolerance,
        );

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            collision_pipeline,
            main_pass,
            collision_pass,
            _sprite: sprite,
            detector,
            size: (width, height),
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Draw the frame, plus a collision pass when the readback gate allows
    ///
    /// `now_ms` is wall-clock time for the gate; `run_id` tags the readback.
    pub fn render(
        &mut self,
        params: &FrameParams,
        run_id: u32,
        now_ms: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        if self.detector.try_begin(now_ms) {
            self.render_collision_pass(params, run_id);
        }

        let (width, height) = self.size;
        let view_rect = ViewRect::fit_game_frame(width as f32, height as f32);
        let uniforms = Uniforms::new(params, view_rect, width, height);
        self.queue
            .write_buffer(&self.main_pass.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("main_encoder"),
            });

        {
            let mut render_pass = begin_pass(&mut encoder, &view, "main_render_pass");
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.main_pass.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Auxiliary pass over the collision window, copied out for readback
    fn render_collision_pass(&mut self, params: &FrameParams, run_id: u32) {
        let params = params.for_collision_pass();
        let uniforms = Uniforms::new(
            &params,
            params.collision_view,
            COLLISION_TARGET_WIDTH,
            COLLISION_TARGET_HEIGHT,
        );
        self.queue.write_buffer(
            &self.collision_pass.uniforms,
            0,
            bytemuck::bytes_of(&uniforms),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("collision_encoder"),
            });

        {
            let mut render_pass =
                begin_pass(&mut encoder, &self.detector.view, "collision_render_pass");
            render_pass.set_pipeline(&self.collision_pipeline);
            render_pass.set_bind_group(0, &self.collision_pass.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
        self.detector.encode_copy(&mut encoder);

        self.queue.submit(std::iter::once(encoder.finish()));
        self.detector.after_submit(run_id);
    }

    /// Finished collision readback, if one resolved since the last call
    pub fn poll_collision(&mut self) -> Option<ReadbackResult> {
        self.detector.poll(&self.device)
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[], // No vertex buffers - fullscreen triangle
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn begin_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::consts::*;
    use crate::shade::compose::{DEBUG_ALPHA, DEBUG_COLOR};
    use crate::shade::entities::{game_over, horizon, obstacles, score, sky, trex};
    use crate::shade::hash::channel;
    use crate::shade::night;
    use crate::shade::sprite::{SHEET_HEIGHT, SHEET_WIDTH, SpriteRect, rects};

    fn shader_module() -> naga::Module {
        let source = SHADER_SOURCES.join("\n");
        naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(&source)))
    }

    /// Scalar leaves of a constant initializer, in declaration order
    fn flatten(module: &naga::Module, expr: naga::Handle<naga::Expression>) -> Vec<f64> {
        use naga::{Expression, Literal};
        match &module.global_expressions[expr] {
            Expression::Literal(Literal::F32(v)) => vec![*v as f64],
            Expression::Literal(Literal::U32(v)) => vec![*v as f64],
            Expression::Literal(Literal::I32(v)) => vec![*v as f64],
            Expression::Constant(c) => flatten(module, module.constants[*c].init),
            Expression::Compose { components, .. } => {
                components.iter().flat_map(|&c| flatten(module, c)).collect()
            }
            Expression::Splat { size, value } => flatten(module, *value).repeat(*size as usize),
            _ => Vec::new(),
        }
    }

    fn shader_constants() -> HashMap<String, Vec<f64>> {
        let module = shader_module();
        module
            .constants
            .iter()
            .filter_map(|(_, c)| Some((c.name.clone()?, flatten(&module, c.init))))
            .collect()
    }

    fn rect(r: SpriteRect) -> Vec<f64> {
        [r.x, r.y, r.width, r.height].map(f64::from).to_vec()
    }

    fn floats(values: impl IntoIterator<Item = f32>) -> Vec<f64> {
        values.into_iter().map(f64::from).collect()
    }

    #[test]
    fn test_shader_validates() {
        let module = shader_module();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{e:?}"));

        let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(entry_points.contains(&"vs_main"));
        assert!(entry_points.contains(&"fs_main"));
    }

    #[test]
    fn test_shader_constants_match_reference() {
        let shader = shader_constants();
        let expected: Vec<(&str, Vec<f64>)> = vec![
            // Frame and scoring
            ("PIXELS_PER_UNIT", floats([PIXELS_PER_UNIT])),
            ("GAME_WIDTH", floats([GAME_WIDTH])),
            ("GAME_HEIGHT", floats([GAME_HEIGHT])),
            ("GROUND_Y", floats([GROUND_Y])),
            ("TREX_LEFT", floats([TREX_LEFT])),
            ("DISTANCE_COEFFICIENT", floats([DISTANCE_COEFFICIENT])),
            ("MAX_SCORE", vec![MAX_SCORE as f64]),
            ("ACHIEVEMENT_SCORE", vec![ACHIEVEMENT_SCORE as f64]),
            ("DEBUG_COLOR", floats(DEBUG_COLOR.to_array())),
            ("DEBUG_ALPHA", floats([DEBUG_ALPHA])),
            // Hash channels
            ("CHANNEL_EXISTS", vec![channel::EXISTS as f64]),
            ("CHANNEL_HEIGHT", vec![channel::HEIGHT as f64]),
            ("CHANNEL_JITTER", vec![channel::JITTER as f64]),
            ("CHANNEL_VARIANT", vec![channel::VARIANT as f64]),
            ("CHANNEL_KIND", vec![channel::KIND as f64]),
            ("CHANNEL_BLINK", vec![channel::BLINK as f64]),
            // Sprite sheet
            ("SHEET_WIDTH", floats([SHEET_WIDTH])),
            ("SHEET_HEIGHT", floats([SHEET_HEIGHT])),
            ("RECT_RESTART", rect(rects::RESTART)),
            ("RECT_CLOUD", rect(rects::CLOUD)),
            ("RECT_PTERODACTYL", rect(rects::PTERODACTYL)),
            ("RECT_CACTUS_SMALL", rect(rects::CACTUS_SMALL)),
            ("RECT_CACTUS_LARGE", rect(rects::CACTUS_LARGE)),
            ("RECT_MOON", rect(rects::MOON)),
            ("RECT_STAR", rect(rects::STAR)),
            ("RECT_TEXT", rect(rects::TEXT)),
            ("RECT_GAME_OVER", rect(rects::GAME_OVER)),
            ("RECT_TREX", rect(rects::TREX)),
            ("RECT_TREX_DUCK", rect(rects::TREX_DUCK)),
            ("RECT_HORIZON_FLAT", rect(rects::HORIZON_FLAT)),
            ("RECT_HORIZON_BUMPY", rect(rects::HORIZON_BUMPY)),
            // Night and sky
            ("INK", floats([crate::shade::entities::INK])),
            ("NIGHT_INTERVAL", floats([night::NIGHT_INTERVAL])),
            ("NIGHT_WINDOW", floats([night::NIGHT_WINDOW])),
            ("NIGHT_TRANSITION", floats([night::NIGHT_TRANSITION])),
            ("MOON_PHASES", vec![night::MOON_PHASES as f64]),
            ("HORIZON_SEGMENT_WIDTH", floats([horizon::HORIZON_SEGMENT_WIDTH])),
            ("HORIZON_Y", floats([horizon::horizon_y()])),
            ("CLOUD_CELL_WIDTH", floats([sky::CLOUD_CELL_WIDTH])),
            ("CLOUD_FREQUENCY", floats([sky::CLOUD_FREQUENCY])),
            ("CLOUD_PARALLAX", floats([sky::CLOUD_PARALLAX])),
            ("CLOUD_MIN_Y", floats([sky::CLOUD_MIN_Y])),
            ("CLOUD_MAX_Y", floats([sky::CLOUD_MAX_Y])),
            ("STAR_CELL_WIDTH", floats([sky::STAR_CELL_WIDTH])),
            ("STAR_FREQUENCY", floats([sky::STAR_FREQUENCY])),
            ("STAR_PARALLAX", floats([sky::STAR_PARALLAX])),
            ("STAR_MIN_Y", floats([sky::STAR_MIN_Y])),
            ("STAR_MAX_Y", floats([sky::STAR_MAX_Y])),
            ("MOON_PHASE_OFFSETS", floats(sky::MOON_PHASE_OFFSETS)),
            ("FULL_MOON_PHASE", vec![sky::FULL_MOON_PHASE as f64]),
            ("MOON_Y", floats([sky::MOON_Y])),
            ("MOON_PARALLAX", floats([sky::MOON_PARALLAX])),
            ("MOON_HALO_RADIUS", floats([sky::MOON_HALO_RADIUS])),
            ("MOON_HALO_FALLOFF", floats([sky::MOON_HALO_FALLOFF])),
            ("MOON_HALO_STRENGTH", floats([sky::MOON_HALO_STRENGTH])),
            // Character
            (
                "TREX_FRAMES",
                floats(trex::TREX_ANIMATIONS.iter().flat_map(|a| a.frames)),
            ),
            ("TREX_FPS", floats(trex::TREX_ANIMATIONS.iter().map(|a| a.fps))),
            (
                "TREX_DUCKING",
                trex::TREX_ANIMATIONS.iter().map(|a| a.ducking as u32 as f64).collect(),
            ),
            ("BLINK_FRAME", floats([trex::BLINK_FRAME])),
            ("BLINK_PERIOD", floats([trex::BLINK_PERIOD])),
            ("BLINK_DURATION", floats([trex::BLINK_DURATION])),
            // Obstacles
            ("OBSTACLE_SEGMENT_WIDTH", floats([obstacles::OBSTACLE_SEGMENT_WIDTH])),
            ("OBSTACLE_FREQUENCY", floats([obstacles::OBSTACLE_FREQUENCY])),
            ("CLEAR_SEGMENTS", vec![obstacles::CLEAR_SEGMENTS as f64]),
            (
                "OBSTACLE_RECTS",
                obstacles::OBSTACLE_TABLE.iter().flat_map(|o| rect(o.rect)).collect(),
            ),
            (
                "OBSTACLE_VARIANTS",
                obstacles::OBSTACLE_TABLE.iter().map(|o| o.variants as f64).collect(),
            ),
            (
                "OBSTACLE_GROUPED",
                obstacles::OBSTACLE_TABLE.iter().map(|o| o.grouped as u32 as f64).collect(),
            ),
            (
                "OBSTACLE_BOTTOMS",
                floats(obstacles::OBSTACLE_TABLE.iter().flat_map(|o| o.bottoms)),
            ),
            (
                "OBSTACLE_UNLOCK",
                floats(obstacles::OBSTACLE_TABLE.iter().map(|o| o.unlock_score)),
            ),
            (
                "OBSTACLE_FRAME_STRIDE",
                floats(obstacles::OBSTACLE_TABLE.iter().map(|o| o.frame_stride)),
            ),
            ("OBSTACLE_FPS", floats(obstacles::OBSTACLE_TABLE.iter().map(|o| o.fps))),
            // Score
            ("SCORE_DIGITS", vec![score::SCORE_DIGITS as f64]),
            ("DIGIT_CELL_WIDTH", floats([score::DIGIT_CELL_WIDTH])),
            ("SCORE_LEFT", floats([score::SCORE_LEFT])),
            ("HIGH_SCORE_LEFT", floats([score::HIGH_SCORE_LEFT])),
            ("SCORE_Y", floats([score::SCORE_Y])),
            ("HIGH_SCORE_ALPHA", floats([score::HIGH_SCORE_ALPHA])),
            ("GLYPH_H", vec![score::GLYPH_H as f64]),
            ("GLYPH_I", vec![score::GLYPH_I as f64]),
            ("GLYPH_BLANK", vec![score::GLYPH_BLANK as f64]),
            ("FLASH_SCORE_SPAN", vec![score::FLASH_SCORE_SPAN as f64]),
            ("FLASH_RATE", floats([score::FLASH_RATE])),
            // Game over
            ("GAME_OVER_CENTER", floats(game_over::GAME_OVER_CENTER.to_array())),
            ("RESTART_CENTER", floats(game_over::RESTART_CENTER.to_array())),
            ("RING_RADIUS", floats([game_over::RING_RADIUS])),
            ("RING_WIDTH", floats([game_over::RING_WIDTH])),
            ("RING_ALPHA", floats([game_over::RING_ALPHA])),
            ("RING_PULSE_SPEED", floats([game_over::RING_PULSE_SPEED])),
        ];

        for (name, want) in expected {
            let got = shader
                .get(name)
                .unwrap_or_else(|| panic!("shader has no constant {name}"));
            assert_eq!(got.len(), want.len(), "{name} length");
            for (g, w) in got.iter().zip(&want) {
                assert!((g - w).abs() < 1e-5, "{name}: shader {got:?}, reference {want:?}");
            }
        }
    }
}
