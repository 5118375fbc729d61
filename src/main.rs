//! T-Rex runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use trex_shader_runner::audio::{AudioManager, SoundEffect};
    use trex_shader_runner::consts::*;
    use trex_shader_runner::platform::{self, InputProfile};
    use trex_shader_runner::renderer::{RenderState, SPRITE_SHEET_PATH, load_sprite_sheet};
    use trex_shader_runner::shade::FrameParams;
    use trex_shader_runner::sim::{
        CharacterState, GameEvent, GameState, TickInput, apply_collision, tick,
    };
    use trex_shader_runner::{Config, HighScore};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        config: Config,
        high_score: HighScore,
        render_state: Option<RenderState>,
        audio: AudioManager,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        debug: bool,
        profile: InputProfile,
    }

    impl Game {
        fn new(seed: u64, config: Config, debug: bool) -> Self {
            let high_score = HighScore::load();
            let mut audio = AudioManager::new();
            audio.set_master_volume(config.master_volume);
            audio.set_muted(config.muted);
            Self {
                state: GameState::new(seed).with_high_score(high_score.value()),
                config,
                high_score,
                render_state: None,
                audio,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                debug,
                profile: platform::input_profile(),
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                let events = tick(&mut self.state, &input, SIM_DT);
                self.handle_events(&events);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.jump_pressed = false;
                self.input.jump_released = false;
                self.input.restart = false;
            }
        }

        /// Apply any collision readback that resolved since last frame
        fn poll_collision(&mut self) {
            let Some(result) = self
                .render_state
                .as_mut()
                .and_then(|rs| rs.poll_collision())
            else {
                return;
            };
            if let Some(event) = apply_collision(&mut self.state, result) {
                log::info!("Crashed at {}", self.state.score());
                self.handle_events(&[event]);
            }
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            for event in events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
                match event {
                    GameEvent::Crashed {
                        new_high_score: Some(score),
                    } => {
                        if self.high_score.submit(*score) {
                            self.high_score.save();
                        }
                    }
                    GameEvent::Restarted => log::info!("Run {} started", self.state.run_id),
                    _ => {}
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let params = FrameParams::from_state(&self.state, &self.config, self.debug);
            let run_id = self.state.run_id;
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&params, run_id, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Show the control hint only before the first jump
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let waiting = self.state.character == CharacterState::Waiting;
            for profile in [InputProfile::Keyboard, InputProfile::Touch] {
                if let Some(el) = document.get_element_by_id(profile.hint_element_id()) {
                    let shown = waiting && profile == self.profile;
                    let _ = el.class_list().toggle_with_force("hidden", !shown);
                }
            }
        }

        fn press(&mut self) {
            self.audio.resume();
            if self.state.character == CharacterState::Crashed {
                self.input.restart = true;
            } else {
                self.input.jump_pressed = true;
            }
        }

        fn toggle_mute(&mut self) {
            self.config.muted = !self.config.muted;
            self.audio.set_muted(self.config.muted);
            self.config.save();
            log::info!("Muted: {}", self.config.muted);
        }

        fn clear_high_score(&mut self) {
            self.high_score.clear();
            self.state.high_score = 0;
        }
    }

    fn size_canvas(canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("T-Rex runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = size_canvas(&canvas);

        let debug = platform::debug_requested();
        let config = Config::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, config.clone(), debug)));

        log::info!("Game initialized with seed: {} (debug: {})", seed, debug);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let sheet = load_sprite_sheet(SPRITE_SHEET_PATH).await;
        let render_state = RenderState::new(surface, &adapter, width, height, &sheet, &config).await;
        game.borrow_mut().render_state = Some(render_state);

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        setup_input_handlers(&canvas, game.clone());
        setup_resize(canvas, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("T-Rex runner running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "ArrowUp" => {
                        event.prevent_default();
                        if !event.repeat() {
                            g.press();
                        }
                    }
                    "ArrowDown" => {
                        event.prevent_default();
                        g.input.duck_held = true;
                    }
                    "Enter" => {
                        if g.state.character == CharacterState::Crashed {
                            g.input.restart = true;
                        }
                    }
                    "i" | "I" => {
                        g.input.idle_mode = !g.input.idle_mode;
                        log::info!("Idle mode: {}", g.input.idle_mode);
                    }
                    "m" | "M" => g.toggle_mute(),
                    "c" | "C" if g.debug => {
                        g.clear_high_score();
                        log::info!("High score cleared (debug)");
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "ArrowUp" => g.input.jump_released = true,
                    "ArrowDown" => g.input.duck_held = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer (mouse, pen and touch) - tap to jump or restart
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                game.borrow_mut().press();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().input.jump_released = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = size_canvas(&canvas);
            if let Some(ref mut rs) = game.borrow_mut().render_state {
                rs.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.poll_collision();
            g.update(dt);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("T-Rex runner (native) starting...");
    log::info!("The game itself needs a browser - run with `trunk serve` for the web version");
    log::info!("Running a headless idle demo with CPU collision detection");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Auto-play a few runs, detecting collisions on the CPU twin of the shader
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use trex_shader_runner::consts::*;
    use trex_shader_runner::renderer::{SPRITE_SHEET_PATH, load_sprite_sheet};
    use trex_shader_runner::shade::{FrameParams, render_region};
    use trex_shader_runner::sim::{
        GameEvent, GameState, ReadbackGate, ReadbackResult, TickInput, apply_collision,
        scan_for_collision_color, tick,
    };
    use trex_shader_runner::{Config, HighScore};

    const DEMO_SECONDS: f32 = 30.0;

    let config = Config::load().validated();
    let sheet = load_sprite_sheet(SPRITE_SHEET_PATH);
    if sheet.is_blank() {
        log::warn!("Without sprites nothing can collide; the run will never end");
    }

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut high_score = HighScore::load();
    let mut state = GameState::new(seed).with_high_score(high_score.value());
    let mut gate = ReadbackGate::new(config.collision_interval_ms);

    let (w, h) = (COLLISION_TARGET_WIDTH, COLLISION_TARGET_HEIGHT);
    let mut pixels = vec![0u8; (w * h * 4) as usize];
    let color = glam::Vec3::from(config.collision_color);

    let mut input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let steps = (DEMO_SECONDS / SIM_DT) as u32;
    for step in 0..steps {
        let mut events = tick(&mut state, &input, SIM_DT);
        input.restart = false;

        let now_ms = step as f64 * SIM_DT as f64 * 1000.0;
        if state.character.is_active() && gate.try_begin(now_ms) {
            let params = FrameParams::from_state(&state, &config, false).for_collision_pass();
            render_region(&sheet, &params, params.collision_view, w, h, &mut pixels);
            let hit = scan_for_collision_color(&pixels, w, h, w * 4, color, config.collision_tolerance);
            gate.finish();
            let result = ReadbackResult {
                run_id: state.run_id,
                hit,
            };
            events.extend(apply_collision(&mut state, result));
        }

        for event in events {
            match event {
                GameEvent::Crashed { new_high_score } => {
                    log::info!("Run {} crashed at {}", state.run_id, state.score());
                    if let Some(score) = new_high_score {
                        if high_score.submit(score) {
                            high_score.save();
                            log::info!("New high score: {}", score);
                        }
                    }
                    input.restart = true;
                }
                GameEvent::Milestone(score) => log::info!("Reached {}", score),
                _ => {}
            }
        }
    }

    log::info!(
        "Demo finished: {} runs, last score {}, best {}",
        state.run_id + 1,
        state.score(),
        high_score.value()
    );
}
