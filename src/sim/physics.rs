//! Avatar motion and playfield scrolling

use super::state::GameState;
use super::tick::{PhaseError, TickInput};
use crate::consts::PLAYFIELD_HEIGHT;
use crate::tuning::Tuning;

/// Vertical position during the grace period: a gentle bob around mid-screen
pub fn grace_bob_y(time_ms: u64, tuning: &Tuning) -> f32 {
    let t = time_ms as f32 / tuning.grace_bob_period_ms;
    PLAYFIELD_HEIGHT / 2.0 + t.sin() * tuning.grace_bob_amplitude
}

/// Physics phase.
///
/// The primary action sets the velocity to the jump impulse and ends the grace
/// period. Out of grace, gravity accumulates into velocity and velocity into
/// position. Distance always advances at the base scroll speed.
pub fn step(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> Result<(), PhaseError> {
    let now = state.now_ms();
    let avatar = &mut state.avatar;

    if input.flap {
        avatar.velocity = tuning.jump_impulse;
        avatar.in_grace = false;
    }

    if avatar.in_grace {
        avatar.y = grace_bob_y(now, tuning);
    } else {
        avatar.velocity += tuning.gravity;
        avatar.y += avatar.velocity;
    }

    if !avatar.y.is_finite() || !avatar.velocity.is_finite() {
        return Err(PhaseError::NonFiniteAvatar {
            y: avatar.y,
            velocity: avatar.velocity,
        });
    }

    state.distance += tuning.scroll_speed;
    if state.avatar.in_grace && state.distance > tuning.grace_distance {
        state.avatar.in_grace = false;
    }
    Ok(())
}

/// Leftward displacement of every scrolling entity this tick
#[inline]
pub fn scroll_delta(state: &GameState, tuning: &Tuning) -> f32 {
    tuning.scroll_speed * state.speed_modifier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(1, 0, tuning);
        state.start_round(tuning);
        state
    }

    #[test]
    fn test_velocity_after_three_ticks() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        state.avatar.in_grace = false;
        state.avatar.velocity = -7.0;

        for _ in 0..3 {
            step(&mut state, &TickInput::default(), &tuning).unwrap();
        }
        assert!((state.avatar.velocity - (-5.95)).abs() < 1e-4);
    }

    #[test]
    fn test_flap_sets_impulse_then_gravity() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        let y0 = state.avatar.y;
        let flap = TickInput {
            flap: true,
            ..Default::default()
        };

        step(&mut state, &flap, &tuning).unwrap();
        assert!(!state.avatar.in_grace);
        assert!((state.avatar.velocity - (-6.65)).abs() < 1e-4);
        assert!(state.avatar.y < y0);
    }

    #[test]
    fn test_grace_bobs_without_falling() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);

        for _ in 0..10 {
            step(&mut state, &TickInput::default(), &tuning).unwrap();
            state.round_ticks += 1;
            assert_eq!(state.avatar.velocity, 0.0);
            let offset = (state.avatar.y - PLAYFIELD_HEIGHT / 2.0).abs();
            assert!(offset <= tuning.grace_bob_amplitude + 1e-3);
        }
    }

    #[test]
    fn test_grace_ends_after_distance() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        // 3px per tick: past 50px on the 17th tick
        for _ in 0..16 {
            step(&mut state, &TickInput::default(), &tuning).unwrap();
        }
        assert!(state.avatar.in_grace);
        step(&mut state, &TickInput::default(), &tuning).unwrap();
        assert!(!state.avatar.in_grace);
    }

    #[test]
    fn test_non_finite_avatar_is_reported() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        state.avatar.in_grace = false;
        state.avatar.velocity = f32::NAN;
        assert!(matches!(
            step(&mut state, &TickInput::default(), &tuning),
            Err(PhaseError::NonFiniteAvatar { .. })
        ));
    }

    #[test]
    fn test_scroll_delta_follows_modifier() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        assert_eq!(scroll_delta(&state, &tuning), 3.0);
        state.speed_modifier = 0.5;
        assert_eq!(scroll_delta(&state, &tuning), 1.5);
    }
}
