//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. The defaults reproduce the
//! classic feel; hosts may load overrides from JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};

/// How the score accumulates during a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScoringPolicy {
    /// One point per gate the avatar passes
    #[default]
    PassBased,
    /// A fixed number of points per simulated second survived
    TimeBased,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::PassBased => "pass",
            ScoringPolicy::TimeBased => "time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pass" | "pass-based" | "gates" => Some(ScoringPolicy::PassBased),
            "time" | "time-based" | "seconds" => Some(ScoringPolicy::TimeBased),
            _ => None,
        }
    }
}

/// What the loop driver does after a tick phase fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailurePolicy {
    /// Log the fault and run again on the next frame
    #[default]
    KeepRunning,
    /// Stop scheduling frames after this many consecutive faulty ticks
    StopAfter(u32),
}

impl FailurePolicy {
    /// Whether the loop may keep going given the current fault streak
    pub fn allows(&self, consecutive_faults: u32) -> bool {
        match self {
            FailurePolicy::KeepRunning => true,
            FailurePolicy::StopAfter(limit) => consecutive_faults < *limit,
        }
    }
}

/// Spawn rules shared by pickups and power-up tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// Per-tick spawn probability
    pub chance: f32,
    /// Maximum live entities of this kind
    pub max_live: usize,
    /// Entity edge length (pixels)
    pub size: f32,
    /// Minimum horizontal distance to another live entity of the same kind
    pub min_spacing: f32,
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub scoring: ScoringPolicy,
    pub failure_policy: FailurePolicy,

    // === Avatar ===
    pub avatar_x: f32,
    pub avatar_size: f32,
    /// Velocity added every tick (pixels/tick²)
    pub gravity: f32,
    /// Velocity set by the primary action (negative = up)
    pub jump_impulse: f32,
    /// Collision inset so grazes don't count
    pub hitbox_margin: f32,

    // === Grace period ===
    pub grace_distance: f32,
    pub grace_bob_amplitude: f32,
    pub grace_bob_period_ms: f32,

    // === Scrolling ===
    /// Base leftward speed (pixels/tick)
    pub scroll_speed: f32,

    // === Gates ===
    pub obstacle_width: f32,
    pub obstacle_spacing: f32,
    pub obstacle_start_distance: f32,
    pub gap_initial: f32,
    pub gap_floor: f32,
    pub gap_decrease: f32,
    /// Keep-out band above and below every gap
    pub gap_margin: f32,

    // === Collectibles ===
    pub pickup: SpawnRule,
    pub power_up: SpawnRule,
    /// Score required before power-ups appear
    pub power_up_start_score: u64,
    /// Vertical band around candidate spawns
    pub spawn_margin: f32,
    /// Padding around a gate's solid region when placing collectibles
    pub obstacle_padding: f32,
    /// Candidate placements tried per spawn before giving up
    pub spawn_attempts: u32,

    // === Power-up effects ===
    pub shrink_factor: f32,
    pub slow_time_factor: f32,
    pub double_score_multiplier: u64,

    // === Time-based scoring ===
    pub points_per_second: u64,

    // === Cosmetics ===
    pub pickup_burst: usize,
    pub activation_burst: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::PassBased,
            failure_policy: FailurePolicy::KeepRunning,

            avatar_x: 120.0,
            avatar_size: 50.0,
            gravity: 0.35,
            jump_impulse: -7.0,
            hitbox_margin: 10.0,

            grace_distance: 50.0,
            grace_bob_amplitude: 15.0,
            grace_bob_period_ms: 300.0,

            scroll_speed: 3.0,

            obstacle_width: 70.0,
            obstacle_spacing: 250.0,
            obstacle_start_distance: 100.0,
            gap_initial: 200.0,
            gap_floor: 160.0,
            gap_decrease: 2.0,
            gap_margin: 80.0,

            pickup: SpawnRule {
                chance: 0.01,
                max_live: 3,
                size: 25.0,
                min_spacing: 60.0,
            },
            power_up: SpawnRule {
                chance: 0.002,
                max_live: 1,
                size: 30.0,
                min_spacing: 120.0,
            },
            power_up_start_score: 5,
            spawn_margin: 50.0,
            obstacle_padding: 30.0,
            spawn_attempts: 100,

            shrink_factor: 0.6,
            slow_time_factor: 0.5,
            double_score_multiplier: 2,

            points_per_second: 1,

            pickup_burst: 8,
            activation_burst: 20,
        }
    }
}

/// Problems with a tuning table
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// JSON could not be parsed
    Parse(String),
    /// A field holds a value the simulation cannot run with
    OutOfRange { field: &'static str, reason: &'static str },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid tuning json: {msg}"),
            Self::OutOfRange { field, reason } => write!(f, "tuning field `{field}` {reason}"),
        }
    }
}

impl std::error::Error for TuningError {}

impl Tuning {
    /// Parse a (possibly partial) JSON table; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject tables that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        let range = |field, reason| Err(TuningError::OutOfRange { field, reason });

        if !(self.avatar_size > 0.0) {
            return range("avatar_size", "must be positive");
        }
        if self.hitbox_margin < 0.0 || self.hitbox_margin * 2.0 >= self.avatar_size {
            return range("hitbox_margin", "must be in [0, avatar_size / 2)");
        }
        if !(self.scroll_speed > 0.0) {
            return range("scroll_speed", "must be positive");
        }
        if !(self.gap_floor > 0.0) || self.gap_floor > self.gap_initial {
            return range("gap_floor", "must be positive and at most gap_initial");
        }
        if self.gap_decrease < 0.0 {
            return range("gap_decrease", "must not be negative");
        }
        if self.gap_initial + 2.0 * self.gap_margin >= PLAYFIELD_HEIGHT {
            return range("gap_margin", "leaves no room for the initial gap");
        }
        if self.obstacle_spacing >= PLAYFIELD_WIDTH || self.obstacle_spacing <= 0.0 {
            return range("obstacle_spacing", "must be in (0, playfield width)");
        }
        for (field, rule) in [("pickup", &self.pickup), ("power_up", &self.power_up)] {
            if !(0.0..=1.0).contains(&rule.chance) {
                return range(field, "spawn chance must be in [0, 1]");
            }
            if !(rule.size > 0.0) {
                return range(field, "size must be positive");
            }
        }
        if self.spawn_margin * 2.0 >= PLAYFIELD_HEIGHT {
            return range("spawn_margin", "leaves no vertical room");
        }
        if self.spawn_attempts == 0 {
            return range("spawn_attempts", "must be at least 1");
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor <= 1.0) {
            return range("shrink_factor", "must be in (0, 1]");
        }
        if !(self.slow_time_factor > 0.0 && self.slow_time_factor <= 1.0) {
            return range("slow_time_factor", "must be in (0, 1]");
        }
        Ok(())
    }
}
