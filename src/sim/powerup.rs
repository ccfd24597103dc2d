//! Power-up lifecycle
//!
//! At most one power-up is active. Activating another first reverses the
//! current one. Expiry is a scheduled deactivation in simulation time, keyed by
//! a [`TimerToken`]; cancelled or superseded tokens never fire.

use super::collision::Rect;
use super::particles;
use super::physics::scroll_delta;
use super::state::{ActivePowerUp, GameEvent, GameState, PowerUpDef, PowerUpKind};
use super::tick::PhaseError;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Handle to a scheduled deactivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A pending "turn this effect off" event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledDeactivation {
    pub token: TimerToken,
    pub kind: PowerUpKind,
    pub due_ms: u64,
}

/// Pending deactivations, in scheduling order
#[derive(Debug, Clone, Default)]
pub struct DeactivationTimers {
    next_token: u64,
    pending: Vec<ScheduledDeactivation>,
}

impl DeactivationTimers {
    pub fn schedule(&mut self, kind: PowerUpKind, due_ms: u64) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending.push(ScheduledDeactivation { token, kind, due_ms });
        token
    }

    /// Returns false if the token already fired or was cancelled
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.token != token);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|t| t.token == token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer due at or before `now_ms`
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ScheduledDeactivation> {
        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|t| t.due_ms <= now_ms);
        self.pending = rest;
        due
    }
}

fn apply_effect(state: &mut GameState, kind: PowerUpKind, tuning: &Tuning) {
    match kind {
        PowerUpKind::Shield => state.avatar.shielded = true,
        PowerUpKind::DoubleScore => state.score_multiplier = tuning.double_score_multiplier,
        PowerUpKind::Shrink => {
            state.avatar.shrunk = true;
            state.avatar.size = state.avatar.base_size * tuning.shrink_factor;
        }
        PowerUpKind::SlowTime => state.speed_modifier = tuning.slow_time_factor,
    }
}

fn revert_effect(state: &mut GameState, kind: PowerUpKind) {
    match kind {
        PowerUpKind::Shield => state.avatar.shielded = false,
        PowerUpKind::DoubleScore => state.score_multiplier = 1,
        PowerUpKind::Shrink => {
            state.avatar.shrunk = false;
            state.avatar.size = state.avatar.base_size;
        }
        PowerUpKind::SlowTime => state.speed_modifier = 1.0,
    }
}

/// Start `def`, fully reversing whatever was active before
pub fn activate(state: &mut GameState, def: &'static PowerUpDef, tuning: &Tuning, settings: &Settings) {
    if let Some(current) = &state.active_power_up {
        let kind = current.def.kind;
        log::debug!("{} superseded by {}", kind.as_str(), def.kind.as_str());
        deactivate(state, kind);
    }

    apply_effect(state, def.kind, tuning);
    let now = state.now_ms();
    let expires_ms = now + def.duration_ms;
    let token = state.timers.schedule(def.kind, expires_ms);
    state.active_power_up = Some(ActivePowerUp {
        def,
        started_ms: now,
        expires_ms,
        token,
    });

    let center = state.avatar.center();
    particles::burst(state, center, tuning.activation_burst, def.color, settings);
    state.push_event(GameEvent::PowerUpActivated { kind: def.kind });
    log::debug!("{} active until {}ms", def.kind.as_str(), expires_ms);
}

/// Turn off `kind` if it is the active power-up.
///
/// Returns whether anything changed; calling it for an inactive kind is a
/// no-op.
pub fn deactivate(state: &mut GameState, kind: PowerUpKind) -> bool {
    let Some(active) = state.active_power_up.take_if(|a| a.def.kind == kind) else {
        return false;
    };
    state.timers.cancel(active.token);
    revert_effect(state, kind);
    true
}

/// Fire due deactivations, ignoring stale tokens
pub fn poll(state: &mut GameState) {
    let now = state.now_ms();
    for timer in state.timers.take_due(now) {
        let live = state
            .active_power_up
            .as_ref()
            .is_some_and(|a| a.token == timer.token);
        if !live {
            log::debug!("Ignoring stale {} timer", timer.kind.as_str());
            continue;
        }
        deactivate(state, timer.kind);
        state.push_event(GameEvent::PowerUpExpired { kind: timer.kind });
        log::debug!("{} expired at {}ms", timer.kind.as_str(), now);
    }
}

/// Drop any active effect and every pending timer (round start/end)
pub fn clear(state: &mut GameState) {
    if let Some(kind) = state.active_power_up.as_ref().map(|a| a.def.kind) {
        deactivate(state, kind);
    }
    state.timers.cancel_all();
}

/// Power-up phase: expire timers, scroll tokens, collect on contact
pub fn update_power_ups(state: &mut GameState, tuning: &Tuning, settings: &Settings) -> Result<(), PhaseError> {
    poll(state);

    let dx = scroll_delta(state, tuning);
    for token in &mut state.power_ups {
        token.pos.x -= dx;
        if !token.pos.is_finite() {
            return Err(PhaseError::NonFiniteEntity { id: token.id });
        }
    }
    state.power_ups.retain(|t| !t.is_off_screen());

    let avatar_box: Rect = state.avatar.bounds();
    let hit = state
        .power_ups
        .iter()
        .position(|t| !t.collected && avatar_box.overlaps(&t.bounds()));
    if let Some(index) = hit {
        let mut token = state.power_ups.remove(index);
        token.collected = true;
        activate(state, token.def, tuning, settings);
    }
    Ok(())
}
