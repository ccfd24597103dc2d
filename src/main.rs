//! Flappy Gates entry point
//!
//! Browser builds draw to a 2D canvas. Native builds run headless autopilot
//! rounds, which is handy for balancing a tuning file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::PI;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent};

    use flappy_gates::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
    use flappy_gates::persistence::LocalStorageStore;
    use flappy_gates::renderer::{DrawCommand, RenderError, RenderSurface, Sprite, TextAlign};
    use flappy_gates::sim::Rgba;
    use flappy_gates::{FrameControl, Game, Settings, Tuning};

    fn css(color: Rgba) -> String {
        let [r, g, b, a] = color;
        format!(
            "rgba({}, {}, {}, {})",
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            a
        )
    }

    fn backend(e: JsValue) -> RenderError {
        RenderError::Backend(format!("{:?}", e))
    }

    /// Canvas 2D render surface
    struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        fn avatar(&self, size: f64) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            let r = size / 2.0;
            // Body
            ctx.set_fill_style_str("#f5d142");
            ctx.begin_path();
            ctx.arc(0.0, 0.0, r, 0.0, 2.0 * PI)?;
            ctx.fill();
            // Wing
            ctx.set_fill_style_str("#e0a92e");
            ctx.begin_path();
            ctx.ellipse(-r * 0.2, r * 0.2, r * 0.45, r * 0.28, 0.0, 0.0, 2.0 * PI)?;
            ctx.fill();
            // Eye
            ctx.set_fill_style_str("white");
            ctx.begin_path();
            ctx.arc(r * 0.35, -r * 0.3, r * 0.25, 0.0, 2.0 * PI)?;
            ctx.fill();
            ctx.set_fill_style_str("black");
            ctx.begin_path();
            ctx.arc(r * 0.42, -r * 0.3, r * 0.1, 0.0, 2.0 * PI)?;
            ctx.fill();
            // Beak
            ctx.set_fill_style_str("#f5842a");
            ctx.begin_path();
            ctx.move_to(r * 0.7, -r * 0.05);
            ctx.line_to(r * 1.15, r * 0.1);
            ctx.line_to(r * 0.7, r * 0.25);
            ctx.close_path();
            ctx.fill();
            Ok(())
        }

        fn droplet(&self, size: f64) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            let h = size / 2.0;
            ctx.set_fill_style_str("#1e90ff");
            ctx.begin_path();
            ctx.move_to(0.0, -h);
            ctx.bezier_curve_to(-h, -h, -h, h / 2.0, 0.0, h);
            ctx.bezier_curve_to(h, h / 2.0, h, -h, 0.0, -h);
            ctx.fill();
            // Shine
            ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
            ctx.begin_path();
            ctx.arc(-size / 4.0, -size / 4.0, size / 6.0, 0.0, 2.0 * PI)?;
            ctx.fill();
            Ok(())
        }

        fn draw(&self, command: &DrawCommand) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            match command {
                DrawCommand::Clear { color } => {
                    ctx.set_fill_style_str(&css(*color));
                    ctx.fill_rect(0.0, 0.0, PLAYFIELD_WIDTH as f64, PLAYFIELD_HEIGHT as f64);
                }
                DrawCommand::Rect { rect, color } => {
                    ctx.set_fill_style_str(&css(*color));
                    ctx.fill_rect(
                        rect.min.x as f64,
                        rect.min.y as f64,
                        rect.size.x as f64,
                        rect.size.y as f64,
                    );
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    color,
                    glow,
                } => {
                    ctx.save();
                    if *glow {
                        ctx.set_shadow_color(&css(*color));
                        ctx.set_shadow_blur(15.0);
                    }
                    ctx.set_fill_style_str(&css(*color));
                    ctx.begin_path();
                    ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, 2.0 * PI)?;
                    ctx.fill();
                    ctx.restore();
                }
                DrawCommand::Ring {
                    center,
                    radius,
                    width,
                    color,
                    dash_offset,
                } => {
                    ctx.save();
                    ctx.set_stroke_style_str(&css(*color));
                    ctx.set_line_width(*width as f64);
                    if let Some(offset) = dash_offset {
                        let dash = js_sys::Array::of2(&5.0.into(), &5.0.into());
                        ctx.set_line_dash(&dash)?;
                        ctx.set_line_dash_offset(*offset as f64);
                    }
                    ctx.begin_path();
                    ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, 2.0 * PI)?;
                    ctx.stroke();
                    ctx.restore();
                }
                DrawCommand::Sprite {
                    sprite,
                    center,
                    size,
                    rotation,
                    glow,
                } => {
                    ctx.save();
                    ctx.translate(center.x as f64, center.y as f64)?;
                    ctx.rotate(*rotation as f64)?;
                    if let Some(color) = glow {
                        ctx.set_shadow_color(&css(*color));
                        ctx.set_shadow_blur(10.0);
                    }
                    match sprite {
                        Sprite::Avatar => self.avatar(*size as f64)?,
                        Sprite::Droplet => self.droplet(*size as f64)?,
                    }
                    ctx.restore();
                }
                DrawCommand::Text {
                    text,
                    pos,
                    size,
                    color,
                    align,
                } => {
                    ctx.set_fill_style_str(&css(*color));
                    ctx.set_font(&format!("bold {}px Arial", size));
                    ctx.set_text_baseline("middle");
                    ctx.set_text_align(match align {
                        TextAlign::Left => "left",
                        TextAlign::Center => "center",
                        TextAlign::Right => "right",
                    });
                    ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
                }
            }
            Ok(())
        }
    }

    impl RenderSurface for CanvasSurface {
        fn submit(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
            self.draw(command).map_err(backend)
        }
    }

    /// Game plus the canvas it draws to
    struct App {
        game: Game,
        surface: CanvasSurface,
    }

    impl App {
        fn frame(&mut self, time: f64) -> FrameControl {
            let control = self.game.frame(time, &mut self.surface);
            for event in self.game.drain_events() {
                log::debug!("{:?}", event);
            }
            control
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Flappy Gates starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        canvas.set_width(PLAYFIELD_WIDTH as u32);
        canvas.set_height(PLAYFIELD_HEIGHT as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(
            seed,
            Tuning::default(),
            Settings::load(),
            Box::new(LocalStorageStore),
        );
        let app = Rc::new(RefCell::new(App {
            game,
            surface: CanvasSurface { ctx },
        }));

        // Title screen
        app.borrow_mut().frame(0.0);

        setup_input_handlers(&canvas, app.clone());

        log::info!("Flappy Gates running (seed {})", seed);
        Ok(())
    }

    /// Route a primary action, scheduling frames when the loop was idle
    fn primary_action(app: &Rc<RefCell<App>>) {
        let start = app.borrow_mut().game.primary_action();
        if start {
            request_animation_frame(app.clone());
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                primary_action(&app);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                primary_action(&app);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                match event.key().as_str() {
                    " " | "ArrowUp" | "Enter" => {
                        event.prevent_default();
                        primary_action(&app);
                    }
                    "a" | "A" => {
                        let mut a = app.borrow_mut();
                        let on = !a.game.autopilot();
                        a.game.set_autopilot(on);
                        a.game.settings().save();
                    }
                    "q" | "Q" => {
                        let mut a = app.borrow_mut();
                        let mut settings = a.game.settings().clone();
                        settings.quality = settings.quality.next();
                        log::info!("Quality: {}", settings.quality.as_str());
                        settings.save();
                        a.game.set_settings(settings);
                    }
                    "h" | "H" => {
                        let mut a = app.borrow_mut();
                        let mut settings = a.game.settings().clone();
                        settings.show_hud = !settings.show_hud;
                        settings.save();
                        a.game.set_settings(settings);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let control = app.borrow_mut().frame(time);
        if control == FrameControl::Continue {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use flappy_gates::persistence::JsonFileStore;
    use flappy_gates::renderer::RecordingSurface;
    use flappy_gates::sim::GameEvent;
    use flappy_gates::{FrameControl, Game, ScoringPolicy, Settings, Tuning};

    /// Where the native build keeps its best score
    const BEST_SCORE_FILE: &str = "flappy_gates_best.json";
    /// Give up on a round the autopilot never loses (two simulated minutes)
    const MAX_ROUND_FRAMES: u32 = 60 * 120;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    #[derive(Parser, Debug)]
    #[command(name = "flappy-gates")]
    #[command(about = "Headless Flappy Gates rounds flown by the autopilot")]
    pub struct Cli {
        /// Tuning JSON overriding the built-in constants
        tuning: Option<PathBuf>,
        /// Rounds to play
        #[arg(long, default_value_t = 3)]
        rounds: u32,
        /// RNG seed; defaults to the clock
        #[arg(long)]
        seed: Option<u64>,
        /// Score one point per survived second instead of per gate
        #[arg(long)]
        time_score: bool,
    }

    fn clock_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    fn load_tuning(cli: &Cli) -> Result<Tuning> {
        let mut tuning = match &cli.tuning {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                Tuning::from_json(&json).with_context(|| format!("invalid tuning in {}", path.display()))?
            }
            None => Tuning::default(),
        };
        if cli.time_score {
            tuning.scoring = ScoringPolicy::TimeBased;
        }
        Ok(tuning)
    }

    pub fn run(cli: Cli) -> Result<()> {
        let tuning = load_tuning(&cli)?;
        let mut game = Game::new(
            cli.seed.unwrap_or_else(clock_seed),
            tuning,
            Settings::default(),
            Box::new(JsonFileStore::new(BEST_SCORE_FILE)),
        );
        game.set_autopilot(true);
        let mut surface = RecordingSurface::new();
        let mut now = 0.0;

        for round in 1..=cli.rounds {
            game.primary_action();
            let mut frames = 0;
            while frames < MAX_ROUND_FRAMES {
                now += FRAME_MS;
                frames += 1;
                if game.frame(now, &mut surface) == FrameControl::Stop {
                    break;
                }
            }
            if game.abandon_round() {
                log::warn!("Round {} still alive after {} frames, ending it", round, frames);
            }

            let mut new_best = false;
            for event in game.drain_events() {
                log::debug!("{:?}", event);
                if let GameEvent::RoundEnded { new_best: true, .. } = event {
                    new_best = true;
                }
            }
            let state = game.state();
            println!(
                "round {:>2}: score {:>4}  gates {:>3}  droplets {:>3}  {:>6.1}s{}",
                round,
                state.score,
                state.obstacles_passed,
                state.pickups_collected,
                state.now_ms() as f64 / 1000.0,
                if new_best { "  new best!" } else { "" }
            );
        }
        println!("best score: {}", game.state().best_score());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Flappy Gates (native, headless autopilot) starting...");
    native::run(native::Cli::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
