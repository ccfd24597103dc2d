//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (time is counted in ticks)
//! - Seeded RNG only
//! - Stable iteration order (oldest entity first)
//! - No rendering or platform dependencies

pub mod collision;
pub mod particles;
pub mod physics;
pub mod powerup;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{FatalCause, Rect, check_fatal};
pub use powerup::{DeactivationTimers, TimerToken};
pub use spawn::{SpawnOutcome, gap_size};
pub use state::{
    ActivePowerUp, Avatar, GameEvent, GameState, Obstacle, POWER_UPS, Particle, Pickup, PowerUpDef,
    PowerUpKind, PowerUpToken, Rgba, RoundPhase,
};
pub use tick::{Phase, PhaseError, TickInput, TickReport, tick};
