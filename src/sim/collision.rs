//! Collision detection for axis-aligned boxes
//!
//! Everything in the playfield is a box: the avatar, both solid halves of a
//! gate, pickups and power-up tokens. Fatal checks use an inset avatar box so
//! that grazing a gate edge doesn't end the round.

use glam::Vec2;

use super::particles;
use super::physics::scroll_delta;
use super::scoring;
use super::state::{Avatar, GameEvent, GameState, Obstacle, PICKUP_COLOR};
use super::tick::PhaseError;
use crate::consts::PLAYFIELD_HEIGHT;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Square box of side `size` at `pos`
    pub fn square(pos: Vec2, size: f32) -> Self {
        Self {
            min: pos,
            size: Vec2::splat(size),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Shrink every edge inward by `margin`
    pub fn inset(&self, margin: f32) -> Self {
        let size = (self.size - Vec2::splat(2.0 * margin)).max(Vec2::ZERO);
        Self {
            min: self.min + Vec2::splat(margin),
            size,
        }
    }

    /// Strict overlap: boxes that only touch along an edge do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCause {
    /// Hit the solid part of a gate
    Obstacle { id: u32 },
    /// Left the playfield through the top
    Ceiling,
    /// Left the playfield through the bottom
    Floor,
    /// The host cut the round short
    Abandoned,
}

/// Does the (inset) avatar hit this gate's solid region?
pub fn hits_obstacle(avatar: &Avatar, obstacle: &Obstacle, hitbox_margin: f32) -> bool {
    let hitbox = avatar.bounds().inset(hitbox_margin);
    hitbox.overlaps(&obstacle.top_rect()) || hitbox.overlaps(&obstacle.bottom_rect())
}

/// Vertical bounds check: the avatar's box must stay inside the playfield
pub fn out_of_bounds(avatar: &Avatar) -> Option<FatalCause> {
    if avatar.y < 0.0 {
        Some(FatalCause::Ceiling)
    } else if avatar.y > PLAYFIELD_HEIGHT - avatar.size {
        Some(FatalCause::Floor)
    } else {
        None
    }
}

/// Full fatal check for one gate plus the playfield bounds.
///
/// A shielded avatar never dies, whatever its position.
pub fn check_fatal(avatar: &Avatar, obstacle: Option<&Obstacle>, hitbox_margin: f32) -> Option<FatalCause> {
    if avatar.shielded {
        return None;
    }
    if let Some(obstacle) = obstacle
        && hits_obstacle(avatar, obstacle, hitbox_margin)
    {
        return Some(FatalCause::Obstacle { id: obstacle.id });
    }
    out_of_bounds(avatar)
}

/// Obstacle phase: scroll gates, retire the ones that left, score passes and
/// run the fatal checks.
///
/// Gates are visited oldest first. The first fatal hit ends the round and no
/// further gates are examined.
pub fn update_obstacles(state: &mut GameState, tuning: &Tuning) -> Result<(), PhaseError> {
    scoring::accrue_time_score(state, tuning);

    let dx = scroll_delta(state, tuning);
    for obstacle in &mut state.obstacles {
        obstacle.x -= dx;
    }
    state.obstacles.retain(|o| !o.is_off_screen());

    for i in 0..state.obstacles.len() {
        let obstacle = &state.obstacles[i];
        if !obstacle.x.is_finite() || !(obstacle.bottom > obstacle.top) {
            return Err(PhaseError::DegenerateObstacle {
                id: obstacle.id,
                top: obstacle.top,
                bottom: obstacle.bottom,
            });
        }

        if !obstacle.counted && obstacle.x < state.avatar.x {
            scoring::obstacle_passed(state, i, tuning);
        }

        if let Some(cause) = check_fatal(&state.avatar, Some(&state.obstacles[i]), tuning.hitbox_margin) {
            scoring::end_round(state, cause);
            return Ok(());
        }
    }

    if let Some(cause) = check_fatal(&state.avatar, None, tuning.hitbox_margin) {
        scoring::end_round(state, cause);
    }
    Ok(())
}

/// Pickup phase: scroll and wobble droplets, then collect whatever the
/// avatar's full box overlaps.
pub fn update_pickups(state: &mut GameState, tuning: &Tuning, settings: &Settings) -> Result<(), PhaseError> {
    let dx = scroll_delta(state, tuning);
    for pickup in &mut state.pickups {
        pickup.pos.x -= dx;
        pickup.phase += pickup.wobble_speed;
        pickup.pos.y += pickup.phase.sin() * 0.5;
        if !pickup.pos.is_finite() {
            return Err(PhaseError::NonFiniteEntity { id: pickup.id });
        }
    }
    state.pickups.retain(|p| !p.is_off_screen());

    let hitbox = state.avatar.bounds();
    let mut collected = Vec::new();
    state.pickups.retain_mut(|p| {
        if !p.collected && hitbox.overlaps(&p.bounds()) {
            p.collected = true;
            collected.push(p.bounds().center());
            false
        } else {
            true
        }
    });

    for origin in collected {
        state.pickups_collected += 1;
        particles::burst(state, origin, tuning.pickup_burst, PICKUP_COLOR, settings);
        state.push_event(GameEvent::PickupCollected {
            total: state.pickups_collected,
        });
        log::debug!("Droplet collected ({} this round)", state.pickups_collected);
    }
    Ok(())
}
