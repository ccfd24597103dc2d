//! Flappy Gates - a single-screen flappy arcade game
//!
//! Core modules:
//! - `sim`: Per-tick simulation (physics, spawning, collisions, power-ups)
//! - `renderer`: Draw command generation for an opaque render surface
//! - `game`: Frame-driven host that owns a session and its collaborators
//! - `persistence`: Best-score storage backends
//! - `tuning`: Data-driven game balance

pub mod game;
pub mod highscores;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{FrameControl, Game};
pub use highscores::BestScore;
pub use settings::{QualityPreset, Settings};
pub use tuning::{FailurePolicy, ScoringPolicy, Tuning};

/// Game configuration constants
pub mod consts {
    /// Simulation ticks per second (one tick per display frame at 60 Hz)
    pub const TICK_RATE: u64 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions (fixed, in pixels)
    pub const PLAYFIELD_WIDTH: f32 = 480.0;
    pub const PLAYFIELD_HEIGHT: f32 = 640.0;
}

/// Convert a tick count to whole simulated milliseconds
#[inline]
pub fn ticks_to_ms(ticks: u64) -> u64 {
    ticks * 1000 / consts::TICK_RATE
}
