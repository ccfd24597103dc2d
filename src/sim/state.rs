//! Game state and core simulation types
//!
//! One [`GameState`] holds a whole session: the avatar, every live entity, the
//! round counters and the power-up timers. Nothing here is global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::powerup::{DeactivationTimers, TimerToken};
use crate::consts::PLAYFIELD_HEIGHT;
use crate::highscores::BestScore;
use crate::ticks_to_ms;
use crate::tuning::Tuning;

/// Linear RGBA color
pub type Rgba = [f32; 4];

/// Droplet blue, shared by pickups and their collection burst
pub const PICKUP_COLOR: Rgba = [0.26, 0.53, 0.96, 0.8];

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round has been played yet (menu)
    Idle,
    /// Active gameplay
    Playing,
    /// Round over, waiting for the primary action to restart
    Ended,
}

/// The player-controlled bird
#[derive(Debug, Clone)]
pub struct Avatar {
    /// Fixed horizontal position (left edge)
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity in pixels/tick (positive = down)
    pub velocity: f32,
    /// Current edge length
    pub size: f32,
    /// Edge length without any size effect
    pub base_size: f32,
    pub shielded: bool,
    pub shrunk: bool,
    /// Gravity is suspended and the avatar bobs in place
    pub in_grace: bool,
}

impl Avatar {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.avatar_x,
            y: PLAYFIELD_HEIGHT / 2.0,
            velocity: 0.0,
            size: tuning.avatar_size,
            base_size: tuning.avatar_size,
            shielded: false,
            shrunk: false,
            in_grace: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::square(Vec2::new(self.x, self.y), self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }
}

/// A gate: solid above `top`, solid below `bottom`, passable in between
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    /// Left edge
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    /// Opening height as spawned; `bottom - top` may differ by rounding
    pub gap: f32,
    pub width: f32,
    /// Already scored as passed
    pub counted: bool,
}

impl Obstacle {
    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, self.width, self.top)
    }

    pub fn bottom_rect(&self) -> Rect {
        Rect::new(self.x, self.bottom, self.width, PLAYFIELD_HEIGHT - self.bottom)
    }

    /// Fully scrolled past the left edge
    pub fn is_off_screen(&self) -> bool {
        self.x < -self.width
    }
}

/// A bonus droplet: counts toward a side tally, no gameplay effect
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    /// Oscillation phase (radians)
    pub phase: f32,
    pub wobble_speed: f32,
    pub wobble_amount: f32,
    pub collected: bool,
}

impl Pickup {
    pub fn bounds(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    /// Extra vertical offset applied only when drawing
    pub fn wobble_offset(&self) -> f32 {
        self.phase.sin() * self.wobble_amount
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.x < -self.size
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Suppresses every fatal outcome
    Shield,
    /// Multiplies score increments
    DoubleScore,
    /// Shrinks the avatar
    Shrink,
    /// Slows all scrolling
    SlowTime,
}

/// Immutable description of a power-up
#[derive(Debug, PartialEq)]
pub struct PowerUpDef {
    pub kind: PowerUpKind,
    pub duration_ms: u64,
    pub color: Rgba,
    pub accent: Rgba,
    pub icon: char,
}

/// Every power-up the game knows about
pub static POWER_UPS: [PowerUpDef; 4] = [
    PowerUpDef {
        kind: PowerUpKind::Shield,
        duration_ms: 5000,
        color: [0.26, 0.53, 0.96, 1.0],
        accent: [0.10, 0.34, 0.77, 1.0],
        icon: '⚡',
    },
    PowerUpDef {
        kind: PowerUpKind::DoubleScore,
        duration_ms: 5000,
        color: [0.96, 0.78, 0.26, 1.0],
        accent: [0.77, 0.55, 0.10, 1.0],
        icon: '×',
    },
    PowerUpDef {
        kind: PowerUpKind::Shrink,
        duration_ms: 4000,
        color: [0.26, 0.96, 0.33, 1.0],
        accent: [0.11, 0.72, 0.17, 1.0],
        icon: '◊',
    },
    PowerUpDef {
        kind: PowerUpKind::SlowTime,
        duration_ms: 3000,
        color: [0.96, 0.26, 0.95, 1.0],
        accent: [0.72, 0.09, 0.71, 1.0],
        icon: '★',
    },
];

impl PowerUpKind {
    pub fn def(self) -> &'static PowerUpDef {
        match self {
            PowerUpKind::Shield => &POWER_UPS[0],
            PowerUpKind::DoubleScore => &POWER_UPS[1],
            PowerUpKind::Shrink => &POWER_UPS[2],
            PowerUpKind::SlowTime => &POWER_UPS[3],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Shield => "shield",
            PowerUpKind::DoubleScore => "double-score",
            PowerUpKind::Shrink => "shrink",
            PowerUpKind::SlowTime => "slow-time",
        }
    }
}

/// A collectible power-up scrolling across the playfield
#[derive(Debug, Clone)]
pub struct PowerUpToken {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub def: &'static PowerUpDef,
    pub collected: bool,
}

impl PowerUpToken {
    pub fn bounds(&self) -> Rect {
        Rect::square(self.pos, self.size)
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.x < -self.size
    }
}

/// The single power-up currently in effect
#[derive(Debug, Clone)]
pub struct ActivePowerUp {
    pub def: &'static PowerUpDef,
    pub started_ms: u64,
    pub expires_ms: u64,
    /// Handle of the scheduled deactivation
    pub token: TimerToken,
}

impl ActivePowerUp {
    /// Fraction of the duration still remaining, 1.0 at activation
    pub fn remaining_fraction(&self, now_ms: u64) -> f32 {
        let left = self.expires_ms.saturating_sub(now_ms) as f32;
        (left / self.def.duration_ms.max(1) as f32).clamp(0.0, 1.0)
    }

    /// Whole seconds left, rounded up (for the HUD)
    pub fn seconds_left(&self, now_ms: u64) -> u64 {
        self.expires_ms.saturating_sub(now_ms).div_ceil(1000)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgba,
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Round lifecycle notifications for the surrounding UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted,
    ScoreChanged { score: u64 },
    PickupCollected { total: u32 },
    PowerUpActivated { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    RoundEnded { score: u64, best: u64, new_best: bool },
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: RoundPhase,
    pub avatar: Avatar,
    /// Live gates, oldest first
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub power_ups: Vec<PowerUpToken>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub active_power_up: Option<ActivePowerUp>,
    pub timers: DeactivationTimers,
    pub score: u64,
    pub best: BestScore,
    /// Distance scrolled this round (pixels, unaffected by slow-time)
    pub distance: f32,
    /// Gates passed this round (drives the gap size)
    pub obstacles_passed: u32,
    pub pickups_collected: u32,
    /// Scales all scrolling; 1.0 unless slowed
    pub speed_modifier: f32,
    /// Scales every score increment; 1 unless doubled
    pub score_multiplier: u64,
    /// Simulation ticks since the round started
    pub round_ticks: u64,
    /// Whole seconds already paid out under time-based scoring
    pub scored_seconds: u64,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new session with the given seed and persisted best score
    pub fn new(seed: u64, best_score: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RoundPhase::Idle,
            avatar: Avatar::new(tuning),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            power_ups: Vec::new(),
            particles: Vec::new(),
            active_power_up: None,
            timers: DeactivationTimers::default(),
            score: 0,
            best: BestScore::new(best_score),
            distance: 0.0,
            obstacles_passed: 0,
            pickups_collected: 0,
            speed_modifier: 1.0,
            score_multiplier: 1,
            round_ticks: 0,
            scored_seconds: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Simulated milliseconds since the round started
    pub fn now_ms(&self) -> u64 {
        ticks_to_ms(self.round_ticks)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Playing
    }

    pub fn best_score(&self) -> u64 {
        self.best.value()
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand queued lifecycle events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Peek at queued events without consuming them
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Reset everything round-scoped and begin playing
    pub fn start_round(&mut self, tuning: &Tuning) {
        super::powerup::clear(self);
        self.avatar = Avatar::new(tuning);
        self.obstacles.clear();
        self.pickups.clear();
        self.power_ups.clear();
        self.particles.clear();
        self.score = 0;
        self.distance = 0.0;
        self.obstacles_passed = 0;
        self.pickups_collected = 0;
        self.speed_modifier = 1.0;
        self.score_multiplier = 1;
        self.round_ticks = 0;
        self.scored_seconds = 0;
        self.phase = RoundPhase::Playing;
        self.push_event(GameEvent::RoundStarted);
        self.push_event(GameEvent::ScoreChanged { score: 0 });
        log::info!("Round started (best {})", self.best.value());
    }
}
