//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. A tick runs a
//! fixed sequence of phases; each returns its own result so one bad phase is
//! contained to the tick it happened in.

use std::fmt;

use super::collision;
use super::particles;
use super::physics;
use super::powerup;
use super::spawn;
use super::state::GameState;
use crate::consts::PLAYFIELD_HEIGHT;
use crate::renderer::RenderError;
use crate::settings::Settings;
use crate::tuning::{FailurePolicy, Tuning};

/// How far below the gap's center the autopilot aims its center
const AUTOPILOT_AIM_OFFSET: f32 = 30.0;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Primary action (click/tap/space)
    pub flap: bool,
    /// Demo mode - the game flaps on its own
    pub autopilot: bool,
}

/// Per-frame phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Physics,
    Spawn,
    Obstacles,
    Pickups,
    PowerUps,
    Particles,
    /// Runs once per frame, outside [`tick`]
    Render,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Physics => "physics",
            Phase::Spawn => "spawn",
            Phase::Obstacles => "obstacles",
            Phase::Pickups => "pickups",
            Phase::PowerUps => "power-ups",
            Phase::Particles => "particles",
            Phase::Render => "render",
        }
    }
}

/// A phase could not complete
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseError {
    NonFiniteAvatar { y: f32, velocity: f32 },
    NonFiniteEntity { id: u32 },
    /// Gate with an empty or inverted gap
    DegenerateObstacle { id: u32, top: f32, bottom: f32 },
    Render(RenderError),
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteAvatar { y, velocity } => {
                write!(f, "avatar left the number line (y={y}, velocity={velocity})")
            }
            Self::NonFiniteEntity { id } => write!(f, "entity {id} has a non-finite position"),
            Self::DegenerateObstacle { id, top, bottom } => {
                write!(f, "gate {id} has no gap (top={top}, bottom={bottom})")
            }
            Self::Render(e) => write!(f, "render failed: {e}"),
        }
    }
}

impl std::error::Error for PhaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for PhaseError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Round tick this report covers
    pub tick: u64,
    /// Phases that ran to completion, in order
    pub completed: Vec<Phase>,
    /// First failure, after which the rest of the tick was skipped
    pub fault: Option<(Phase, PhaseError)>,
    /// The round ended during this tick
    pub round_ended: bool,
}

impl TickReport {
    fn idle(tick: u64) -> Self {
        Self {
            tick,
            completed: Vec::new(),
            fault: None,
            round_ended: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
    }

    /// Whether frames should keep being scheduled. `consecutive_faults`
    /// counts this tick if it faulted.
    pub fn should_continue(&self, policy: FailurePolicy, consecutive_faults: u32) -> bool {
        self.is_clean() || policy.allows(consecutive_faults)
    }
}

type PhaseFn = fn(&mut GameState, &TickInput, &Tuning, &Settings) -> Result<(), PhaseError>;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning, settings: &Settings) -> TickReport {
    if !state.is_playing() {
        return TickReport::idle(state.round_ticks);
    }

    let mut input = input.clone();
    if input.autopilot && autopilot_wants_flap(state) {
        input.flap = true;
    }

    state.round_ticks += 1;
    let mut report = TickReport::idle(state.round_ticks);

    let phases: [(Phase, PhaseFn); 6] = [
        (Phase::Physics, |s, i, t, _| physics::step(s, i, t)),
        (Phase::Spawn, |s, _, t, _| spawn::spawn_phase(s, t)),
        (Phase::Obstacles, |s, _, t, _| collision::update_obstacles(s, t)),
        (Phase::Pickups, |s, _, t, c| collision::update_pickups(s, t, c)),
        (Phase::PowerUps, |s, _, t, c| powerup::update_power_ups(s, t, c)),
        (Phase::Particles, |s, _, _, _| particles::update(s)),
    ];

    for (phase, run) in phases {
        if let Err(err) = run(state, &input, tuning, settings) {
            log::warn!(
                "Tick {}: {} phase failed, skipping the rest of the tick: {}",
                state.round_ticks,
                phase.as_str(),
                err
            );
            report.fault = Some((phase, err));
            break;
        }
        report.completed.push(phase);
        if !state.is_playing() {
            report.round_ended = true;
            break;
        }
    }

    report
}

/// Demo mode: flap once the avatar sinks below the aim line of the next gate
fn autopilot_wants_flap(state: &GameState) -> bool {
    let avatar = &state.avatar;
    let aim = state
        .obstacles
        .iter()
        .find(|o| o.x + o.width > avatar.x)
        .map(|o| (o.top + o.bottom) / 2.0 + AUTOPILOT_AIM_OFFSET)
        .unwrap_or(PLAYFIELD_HEIGHT / 2.0);
    avatar.center().y > aim && avatar.velocity >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameEvent, Obstacle, PowerUpKind, RoundPhase};
    use glam::Vec2;
    use proptest::prelude::*;

    /// Tuning with nothing spawning, so rounds are fully scripted
    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.obstacle_start_distance = 1.0e9;
        tuning.pickup.chance = 0.0;
        tuning.power_up.chance = 0.0;
        tuning
    }

    fn playing(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(11, 0, tuning);
        state.start_round(tuning);
        state.drain_events();
        state
    }

    const ALL_TICK_PHASES: [Phase; 6] = [
        Phase::Physics,
        Phase::Spawn,
        Phase::Obstacles,
        Phase::Pickups,
        Phase::PowerUps,
        Phase::Particles,
    ];

    #[test]
    fn test_tick_is_noop_when_not_playing() {
        let tuning = Tuning::default();
        let settings = Settings::default();
        let mut state = GameState::new(1, 0, &tuning);
        let report = tick(&mut state, &TickInput::default(), &tuning, &settings);
        assert!(report.completed.is_empty());
        assert_eq!(state.round_ticks, 0);
        assert_eq!(state.distance, 0.0);
    }

    #[test]
    fn test_clean_tick_runs_every_phase() {
        let tuning = Tuning::default();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        let report = tick(&mut state, &TickInput::default(), &tuning, &settings);
        assert!(report.is_clean());
        assert_eq!(report.tick, 1);
        assert_eq!(report.completed, ALL_TICK_PHASES.to_vec());
        assert_eq!(state.distance, tuning.scroll_speed);
    }

    #[test]
    fn test_fault_skips_remaining_phases() {
        let tuning = quiet_tuning();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        state.pickups.push(crate::sim::state::Pickup {
            id: 99,
            pos: Vec2::new(f32::NAN, 100.0),
            size: 25.0,
            phase: 0.0,
            wobble_speed: 0.1,
            wobble_amount: 3.0,
            collected: false,
        });
        crate::sim::particles::burst(&mut state, Vec2::new(200.0, 200.0), 1, [1.0; 4], &settings);

        let report = tick(&mut state, &TickInput::default(), &tuning, &settings);

        assert_eq!(
            report.completed,
            vec![Phase::Physics, Phase::Spawn, Phase::Obstacles]
        );
        assert!(matches!(
            report.fault,
            Some((Phase::Pickups, PhaseError::NonFiniteEntity { id: 99 }))
        ));
        // Physics stays applied, particles never ran
        assert_eq!(state.distance, tuning.scroll_speed);
        assert_eq!(state.particles[0].life, 1.0);
        assert!(state.is_playing());
    }

    #[test]
    fn test_round_end_stops_tick() {
        let tuning = quiet_tuning();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        state.avatar.in_grace = false;
        state.avatar.y = PLAYFIELD_HEIGHT;

        let report = tick(&mut state, &TickInput::default(), &tuning, &settings);
        assert!(report.round_ended);
        assert_eq!(
            report.completed,
            vec![Phase::Physics, Phase::Spawn, Phase::Obstacles]
        );
        assert_eq!(state.phase, RoundPhase::Ended);

        let after = tick(&mut state, &TickInput::default(), &tuning, &settings);
        assert!(after.completed.is_empty());
    }

    #[test]
    fn test_shield_survives_ceiling_until_expiry() {
        let tuning = quiet_tuning();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        powerup::activate(&mut state, PowerUpKind::Shield.def(), &tuning, &settings);
        state.avatar.in_grace = false;
        state.avatar.y = -5.0;

        // Keep climbing so the avatar never re-enters the playfield
        let climb = TickInput {
            flap: true,
            ..Default::default()
        };
        let mut last = None;
        for _ in 0..400 {
            let report = tick(&mut state, &climb, &tuning, &settings);
            if report.round_ended {
                last = Some(report.tick);
                break;
            }
        }

        // 5000ms shield expires in the power-up phase of tick 300; the next
        // bounds check is fatal
        assert_eq!(last, Some(301));
        let events = state.drain_events();
        let expired = events
            .iter()
            .position(|e| *e == GameEvent::PowerUpExpired { kind: PowerUpKind::Shield });
        let ended = events
            .iter()
            .position(|e| matches!(e, GameEvent::RoundEnded { .. }));
        assert!(expired.is_some());
        assert!(expired < ended);
    }

    #[test]
    fn test_autopilot_flaps_below_aim() {
        let tuning = quiet_tuning();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        state.avatar.in_grace = false;
        state.avatar.y = 400.0;
        state.avatar.velocity = 1.0;
        let demo = TickInput {
            autopilot: true,
            ..Default::default()
        };

        tick(&mut state, &demo, &tuning, &settings);
        assert!((state.avatar.velocity - (tuning.jump_impulse + tuning.gravity)).abs() < 1e-4);

        // Rising: leave it alone
        tick(&mut state, &demo, &tuning, &settings);
        assert!(state.avatar.velocity > tuning.jump_impulse + tuning.gravity);
    }

    #[test]
    fn test_autopilot_aims_for_next_gate() {
        let tuning = quiet_tuning();
        let mut state = playing(&tuning);
        state.avatar.in_grace = false;
        state.avatar.velocity = 0.5;
        state.obstacles.push(Obstacle {
            id: 1,
            x: 300.0,
            top: 400.0,
            bottom: 560.0,
            gap: 160.0,
            width: 70.0,
            counted: false,
        });
        // Center 345 sits above the 510 aim line
        state.avatar.y = 320.0;
        assert!(!autopilot_wants_flap(&state));
        state.avatar.y = 500.0;
        assert!(autopilot_wants_flap(&state));
    }

    #[test]
    fn test_should_continue_follows_policy() {
        let tuning = quiet_tuning();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        let clean = tick(&mut state, &TickInput::default(), &tuning, &settings);
        assert!(clean.should_continue(FailurePolicy::StopAfter(1), 0));

        let faulty = TickReport {
            tick: 2,
            completed: vec![Phase::Physics],
            fault: Some((Phase::Spawn, PhaseError::NonFiniteEntity { id: 1 })),
            round_ended: false,
        };
        assert!(faulty.should_continue(FailurePolicy::KeepRunning, 50));
        assert!(faulty.should_continue(FailurePolicy::StopAfter(2), 1));
        assert!(!faulty.should_continue(FailurePolicy::StopAfter(2), 2));
    }

    #[test]
    fn test_phase_error_display() {
        let e = PhaseError::DegenerateObstacle {
            id: 4,
            top: 300.0,
            bottom: 200.0,
        };
        assert_eq!(e.to_string(), "gate 4 has no gap (top=300, bottom=200)");
    }

    proptest! {
        #[test]
        fn prop_shield_prevents_any_death(
            y in -400.0f32..1000.0,
            velocity in -10.0f32..10.0,
            top in 50.0f32..400.0,
            gap in 160.0f32..200.0,
        ) {
            let tuning = quiet_tuning();
            let settings = Settings::default();
            let mut state = playing(&tuning);
            powerup::activate(&mut state, PowerUpKind::Shield.def(), &tuning, &settings);
            state.avatar.in_grace = false;
            state.avatar.y = y;
            state.avatar.velocity = velocity;
            state.obstacles.push(Obstacle {
                id: 1,
                x: state.avatar.x,
                top,
                bottom: top + gap,
                gap,
                width: 70.0,
                counted: false,
            });

            let report = tick(&mut state, &TickInput::default(), &tuning, &settings);
            prop_assert!(!report.round_ended);
            prop_assert!(state.is_playing());
        }
    }
}
