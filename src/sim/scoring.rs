//! Score accrual and round termination
//!
//! Two scoring laws exist and a round uses exactly one of them:
//! - pass-based: a point per gate, paid the tick the gate's left edge slips
//!   behind the avatar
//! - time-based: a fixed number of points per simulated second
//!
//! Either way the active score multiplier scales every payout.

use super::collision::FatalCause;
use super::powerup;
use super::state::{GameEvent, GameState, RoundPhase};
use crate::tuning::{ScoringPolicy, Tuning};

/// Add `base * multiplier` to the score. Returns the points awarded.
pub fn add_points(state: &mut GameState, base: u64) -> u64 {
    let points = base * state.score_multiplier;
    if points > 0 {
        state.score += points;
        state.push_event(GameEvent::ScoreChanged { score: state.score });
    }
    points
}

/// Mark gate `index` as passed. Difficulty advances under both policies,
/// but only pass-based scoring pays for it.
pub fn obstacle_passed(state: &mut GameState, index: usize, tuning: &Tuning) {
    let Some(obstacle) = state.obstacles.get_mut(index) else {
        return;
    };
    if obstacle.counted {
        return;
    }
    obstacle.counted = true;
    state.obstacles_passed += 1;
    if tuning.scoring == ScoringPolicy::PassBased {
        add_points(state, 1);
    }
}

/// Pay out every whole simulated second not yet paid (time-based only)
pub fn accrue_time_score(state: &mut GameState, tuning: &Tuning) {
    if tuning.scoring != ScoringPolicy::TimeBased {
        return;
    }
    let elapsed_seconds = state.now_ms() / 1000;
    while state.scored_seconds < elapsed_seconds {
        state.scored_seconds += 1;
        add_points(state, tuning.points_per_second);
    }
}

/// Terminal transition: stop the round and settle the best score
pub fn end_round(state: &mut GameState, cause: FatalCause) {
    if state.phase != RoundPhase::Playing {
        return;
    }
    powerup::clear(state);
    state.phase = RoundPhase::Ended;
    let new_best = state.best.record(state.score);
    state.push_event(GameEvent::RoundEnded {
        score: state.score,
        best: state.best.value(),
        new_best,
    });
    log::info!(
        "Round over ({:?}): score {}, {} gates, {} droplets",
        cause,
        state.score,
        state.obstacles_passed,
        state.pickups_collected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Obstacle, PowerUpKind};

    fn playing(tuning: &Tuning, best: u64) -> GameState {
        let mut state = GameState::new(1, best, tuning);
        state.start_round(tuning);
        state.drain_events();
        state
    }

    fn gate(id: u32) -> Obstacle {
        Obstacle {
            id,
            x: 100.0,
            top: 200.0,
            bottom: 400.0,
            gap: 200.0,
            width: 70.0,
            counted: false,
        }
    }

    #[test]
    fn test_pass_based_counts_once() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 0);
        state.obstacles.push(gate(1));

        obstacle_passed(&mut state, 0, &tuning);
        obstacle_passed(&mut state, 0, &tuning);

        assert_eq!(state.score, 1);
        assert_eq!(state.obstacles_passed, 1);
        assert!(state.obstacles[0].counted);
        assert_eq!(state.drain_events(), vec![GameEvent::ScoreChanged { score: 1 }]);
    }

    #[test]
    fn test_double_score_doubles_pass() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 0);
        state.score_multiplier = 2;
        state.obstacles.push(gate(1));
        obstacle_passed(&mut state, 0, &tuning);
        assert_eq!(state.score, 2);
    }

    #[test]
    fn test_time_based_ignores_gates_but_tracks_difficulty() {
        let tuning = Tuning {
            scoring: ScoringPolicy::TimeBased,
            ..Tuning::default()
        };
        let mut state = playing(&tuning, 0);
        state.obstacles.push(gate(1));
        obstacle_passed(&mut state, 0, &tuning);
        assert_eq!(state.score, 0);
        assert_eq!(state.obstacles_passed, 1);
    }

    #[test]
    fn test_time_based_pays_per_second() {
        let tuning = Tuning {
            scoring: ScoringPolicy::TimeBased,
            points_per_second: 3,
            ..Tuning::default()
        };
        let mut state = playing(&tuning, 0);

        state.round_ticks = 59;
        accrue_time_score(&mut state, &tuning);
        assert_eq!(state.score, 0);

        state.round_ticks = 60;
        accrue_time_score(&mut state, &tuning);
        assert_eq!(state.score, 3);

        // A doubled stretch, with a skipped frame covering two seconds
        state.score_multiplier = 2;
        state.round_ticks = 180;
        accrue_time_score(&mut state, &tuning);
        assert_eq!(state.score, 3 + 6 + 6);
        assert_eq!(state.scored_seconds, 3);
    }

    #[test]
    fn test_pass_policy_ignores_clock() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 0);
        state.round_ticks = 600;
        accrue_time_score(&mut state, &tuning);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_end_round_records_strictly_greater() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 5);
        state.score = 5;
        end_round(&mut state, FatalCause::Floor);
        assert_eq!(state.phase, RoundPhase::Ended);
        assert_eq!(state.best_score(), 5);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::RoundEnded {
                score: 5,
                best: 5,
                new_best: false
            }]
        );

        state.start_round(&tuning);
        state.drain_events();
        state.score = 6;
        end_round(&mut state, FatalCause::Ceiling);
        assert_eq!(state.best_score(), 6);
    }

    #[test]
    fn test_end_round_is_terminal_once() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 0);
        end_round(&mut state, FatalCause::Floor);
        end_round(&mut state, FatalCause::Floor);
        let ended = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::RoundEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_end_round_cancels_power_up() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning, 0);
        powerup::activate(
            &mut state,
            PowerUpKind::Shield.def(),
            &tuning,
            &crate::Settings::default(),
        );
        end_round(&mut state, FatalCause::Floor);
        assert!(state.active_power_up.is_none());
        assert!(state.timers.is_empty());
        assert!(!state.avatar.shielded);
    }
}
