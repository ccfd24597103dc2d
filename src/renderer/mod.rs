//! Rendering module
//!
//! The simulation never touches a graphics API. Each frame is turned into a
//! flat list of [`DrawCommand`]s and handed to whatever [`RenderSurface`] the
//! host provides: a 2D canvas in the browser, a recorder in tests and in the
//! headless binary.

pub mod shapes;

use std::fmt;

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::collision::Rect;
use crate::sim::state::{GameState, Rgba};

/// Pre-drawn images the surface knows how to paint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Avatar,
    /// Bonus pickup (teardrop)
    Droplet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One primitive for the render surface. Coordinates are playfield pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Start of a frame: fill the whole playfield
    Clear { color: Rgba },
    Rect { rect: Rect, color: Rgba },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
        /// Soft halo; surfaces without glow support may ignore it
        glow: bool,
    },
    Ring {
        center: Vec2,
        radius: f32,
        width: f32,
        color: Rgba,
        /// Dash pattern offset; `None` strokes a solid ring
        dash_offset: Option<f32>,
    },
    Sprite {
        sprite: Sprite,
        center: Vec2,
        size: f32,
        /// Radians, clockwise
        rotation: f32,
        glow: Option<Rgba>,
    },
    Text {
        text: String,
        pos: Vec2,
        size: f32,
        color: Rgba,
        align: TextAlign,
    },
}

/// Render surface failures
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The surface went away (canvas detached, context lost)
    SurfaceLost,
    /// Backend rejected a command
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceLost => write!(f, "render surface lost"),
            Self::Backend(msg) => write!(f, "render backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Sink for draw commands
pub trait RenderSurface {
    fn submit(&mut self, command: &DrawCommand) -> Result<(), RenderError>;
}

/// Surface that keeps the most recent frame in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Commands since the last `Clear`
    pub commands: Vec<DrawCommand>,
    /// Frames started
    pub frames: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All text drawn this frame
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn submit(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        if matches!(command, DrawCommand::Clear { .. }) {
            self.commands.clear();
            self.frames += 1;
        }
        self.commands.push(command.clone());
        Ok(())
    }
}

/// Draw the whole frame. Returns the number of commands submitted.
///
/// Stops at the first command the surface rejects.
pub fn render(
    state: &GameState,
    settings: &Settings,
    surface: &mut dyn RenderSurface,
) -> Result<usize, RenderError> {
    let commands = shapes::frame(state, settings);
    for command in &commands {
        surface.submit(command)?;
    }
    Ok(commands.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    /// Accepts `budget` commands, then reports the surface lost
    struct FlakySurface {
        budget: usize,
        accepted: usize,
    }

    impl RenderSurface for FlakySurface {
        fn submit(&mut self, _command: &DrawCommand) -> Result<(), RenderError> {
            if self.accepted == self.budget {
                return Err(RenderError::SurfaceLost);
            }
            self.accepted += 1;
            Ok(())
        }
    }

    fn playing() -> (GameState, Settings) {
        let tuning = Tuning::default();
        let mut state = GameState::new(5, 0, &tuning);
        state.start_round(&tuning);
        (state, Settings::default())
    }

    #[test]
    fn test_frame_starts_with_clear() {
        let (state, settings) = playing();
        let mut surface = RecordingSurface::new();
        let count = render(&state, &settings, &mut surface).unwrap();
        assert_eq!(count, surface.commands.len());
        assert!(matches!(surface.commands[0], DrawCommand::Clear { .. }));
        assert_eq!(surface.frames, 1);

        render(&state, &settings, &mut surface).unwrap();
        assert_eq!(surface.frames, 2);
        assert_eq!(surface.commands.len(), count);
    }

    #[test]
    fn test_render_stops_at_first_rejection() {
        let (state, settings) = playing();
        let mut surface = FlakySurface {
            budget: 2,
            accepted: 0,
        };
        assert_eq!(
            render(&state, &settings, &mut surface),
            Err(RenderError::SurfaceLost)
        );
        assert_eq!(surface.accepted, 2);
    }

    #[test]
    fn test_avatar_always_drawn() {
        let (state, settings) = playing();
        let mut surface = RecordingSurface::new();
        render(&state, &settings, &mut surface).unwrap();
        let avatars = surface
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { sprite: Sprite::Avatar, .. }))
            .count();
        assert_eq!(avatars, 1);
    }
}
