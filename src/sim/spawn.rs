//! Spawning of gates, pickups and power-up tokens
//!
//! Gates appear at a fixed horizontal spacing once the round has scrolled past
//! a start distance, with a gap that shrinks as more gates are passed.
//! Collectibles are best-effort: a few random candidates are tried and if none
//! fits, nothing spawns this tick.

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Obstacle, POWER_UPS, Pickup, PowerUpToken};
use super::tick::PhaseError;
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::tuning::{SpawnRule, Tuning};

/// Gap height after `passed` gates: shrinks linearly down to the floor
pub fn gap_size(tuning: &Tuning, passed: u32) -> f32 {
    (tuning.gap_initial - tuning.gap_decrease * passed as f32).max(tuning.gap_floor)
}

/// Add a gate if one is due. Returns its id.
pub fn maybe_spawn_obstacle(state: &mut GameState, tuning: &Tuning) -> Option<u32> {
    if state.distance <= tuning.obstacle_start_distance {
        return None;
    }
    let due = state
        .obstacles
        .last()
        .is_none_or(|newest| newest.x < PLAYFIELD_WIDTH - tuning.obstacle_spacing);
    if !due {
        return None;
    }

    let gap = gap_size(tuning, state.obstacles_passed);
    let min_top = tuning.gap_margin;
    let max_top = PLAYFIELD_HEIGHT - gap - tuning.gap_margin;
    let top = if max_top > min_top {
        state.rng().random_range(min_top..max_top)
    } else {
        min_top
    };

    let id = state.next_entity_id();
    state.obstacles.push(Obstacle {
        id,
        x: PLAYFIELD_WIDTH,
        top,
        bottom: top + gap,
        gap,
        width: tuning.obstacle_width,
        counted: false,
    });
    Some(id)
}

/// Where a collectible landed and how many candidates it took
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    pub attempts: u32,
}

/// Result of one spawn opportunity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    /// The per-tick roll failed (or spawning is gated off)
    NotRolled,
    /// Already at the concurrency cap
    Capped,
    /// Every candidate was rejected
    NoRoom,
    Placed { id: u32, attempts: u32 },
}

/// Would a collectible at `candidate` sit in this gate's solid region?
fn blocked_by_obstacle(candidate: Vec2, size: f32, obstacle: &Obstacle, padding: f32) -> bool {
    let column_start = obstacle.x - padding;
    let column_end = obstacle.x + obstacle.width + padding;
    let same_column = candidate.x < column_end && candidate.x + size > column_start;
    same_column && (candidate.y < obstacle.top + padding || candidate.y > obstacle.bottom - padding)
}

/// Try up to `tuning.spawn_attempts` random spots along the right edge
pub fn find_placement<R: Rng>(
    rng: &mut R,
    obstacles: &[Obstacle],
    occupied_x: &[f32],
    rule: &SpawnRule,
    tuning: &Tuning,
) -> Option<Placement> {
    let x = PLAYFIELD_WIDTH;
    let (lo, hi) = (tuning.spawn_margin, PLAYFIELD_HEIGHT - tuning.spawn_margin);

    for attempt in 1..=tuning.spawn_attempts {
        let candidate = Vec2::new(x, rng.random_range(lo..hi));
        let crowded = occupied_x.iter().any(|&ox| (ox - candidate.x).abs() < rule.min_spacing);
        let blocked = obstacles
            .iter()
            .any(|o| blocked_by_obstacle(candidate, rule.size, o, tuning.obstacle_padding));
        if !crowded && !blocked {
            return Some(Placement {
                pos: candidate,
                attempts: attempt,
            });
        }
    }
    None
}

/// One pickup spawn opportunity
pub fn try_spawn_pickup(state: &mut GameState, tuning: &Tuning) -> SpawnOutcome {
    let rule = &tuning.pickup;
    if state.rng().random::<f32>() >= rule.chance {
        return SpawnOutcome::NotRolled;
    }
    if state.pickups.len() >= rule.max_live {
        return SpawnOutcome::Capped;
    }

    let occupied: Vec<f32> = state.pickups.iter().map(|p| p.pos.x).collect();
    let Some(placement) = find_placement(&mut state.rng, &state.obstacles, &occupied, rule, tuning)
    else {
        return SpawnOutcome::NoRoom;
    };

    let rng = state.rng();
    let wobble_speed = rng.random_range(0.01..0.03);
    let wobble_amount = rng.random_range(3.0..8.0);
    let id = state.next_entity_id();
    state.pickups.push(Pickup {
        id,
        pos: placement.pos,
        size: rule.size,
        phase: 0.0,
        wobble_speed,
        wobble_amount,
        collected: false,
    });
    SpawnOutcome::Placed {
        id,
        attempts: placement.attempts,
    }
}

/// One power-up spawn opportunity.
///
/// Tokens only appear once the score reaches `power_up_start_score`, and never
/// while a power-up is already running.
pub fn try_spawn_power_up(state: &mut GameState, tuning: &Tuning) -> SpawnOutcome {
    if state.score < tuning.power_up_start_score {
        return SpawnOutcome::NotRolled;
    }
    let rule = &tuning.power_up;
    if state.rng().random::<f32>() >= rule.chance || state.active_power_up.is_some() {
        return SpawnOutcome::NotRolled;
    }
    if state.power_ups.len() >= rule.max_live {
        return SpawnOutcome::Capped;
    }

    let def = &POWER_UPS[state.rng().random_range(0..POWER_UPS.len())];
    let occupied: Vec<f32> = state.power_ups.iter().map(|t| t.pos.x).collect();
    let Some(placement) = find_placement(&mut state.rng, &state.obstacles, &occupied, rule, tuning)
    else {
        return SpawnOutcome::NoRoom;
    };

    let id = state.next_entity_id();
    state.power_ups.push(PowerUpToken {
        id,
        pos: placement.pos,
        size: rule.size,
        def,
        collected: false,
    });
    SpawnOutcome::Placed {
        id,
        attempts: placement.attempts,
    }
}

/// Spawn phase: gates first, then collectibles
pub fn spawn_phase(state: &mut GameState, tuning: &Tuning) -> Result<(), PhaseError> {
    maybe_spawn_obstacle(state, tuning);

    if try_spawn_pickup(state, tuning) == SpawnOutcome::NoRoom {
        log::debug!("No room for a pickup this tick");
    }
    match try_spawn_power_up(state, tuning) {
        SpawnOutcome::NoRoom => log::debug!("No room for a power-up this tick"),
        SpawnOutcome::Placed { id, attempts } => {
            log::debug!("Power-up {} placed after {} attempt(s)", id, attempts)
        }
        _ => {}
    }
    Ok(())
}
