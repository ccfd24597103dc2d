//! Frame-driven host
//!
//! [`Game`] owns one session and its collaborators (tuning, settings, score
//! store) and turns display frames into fixed simulation ticks. The host
//! calls [`Game::frame`] from its animation-frame callback and schedules the
//! next one only while it returns [`FrameControl::Continue`].

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{ScoreStore, load_best_or_zero};
use crate::renderer::{RenderSurface, render};
use crate::settings::Settings;
use crate::sim::collision::FatalCause;
use crate::sim::scoring;
use crate::sim::state::{GameEvent, GameState};
use crate::sim::tick::{Phase, PhaseError, TickInput, TickReport, tick};
use crate::tuning::Tuning;

/// Whether the host should request another animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Stop,
}

pub struct Game {
    state: GameState,
    tuning: Tuning,
    settings: Settings,
    store: Box<dyn ScoreStore>,
    accumulator: f32,
    last_time_ms: Option<f64>,
    /// Input for the next tick; the flap is consumed by it
    input: TickInput,
    /// A frame loop is scheduled
    running: bool,
    consecutive_faults: u32,
    consecutive_render_faults: u32,
    last_fault: Option<(Phase, PhaseError)>,
    /// Best score the store is known to hold
    persisted_best: u64,
}

impl Game {
    /// Create a session, reading the best score from `store`
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, store: Box<dyn ScoreStore>) -> Self {
        let best = load_best_or_zero(store.as_ref());
        log::info!(
            "Session created (seed {}, {} scoring, best {})",
            seed,
            tuning.scoring.as_str(),
            best
        );
        Self {
            state: GameState::new(seed, best, &tuning),
            input: TickInput {
                flap: false,
                autopilot: settings.autopilot,
            },
            tuning,
            settings,
            store,
            accumulator: 0.0,
            last_time_ms: None,
            running: false,
            consecutive_faults: 0,
            consecutive_render_faults: 0,
            last_fault: None,
            persisted_best: best,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.input.autopilot = settings.autopilot;
        self.settings = settings;
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.input.autopilot = on;
        self.settings.autopilot = on;
        log::info!("Autopilot: {}", on);
    }

    pub fn autopilot(&self) -> bool {
        self.input.autopilot
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Most recent tick or render fault, if any
    pub fn last_fault(&self) -> Option<&(Phase, PhaseError)> {
        self.last_fault.as_ref()
    }

    /// Click/tap/space: start a round when none is running, otherwise flap.
    ///
    /// Returns true when the frame loop was idle and the host must schedule a
    /// frame.
    pub fn primary_action(&mut self) -> bool {
        if self.state.is_playing() {
            self.input.flap = true;
            false
        } else {
            self.start_round();
            true
        }
    }

    /// Reset the session for a new round and arm the frame loop
    pub fn start_round(&mut self) {
        self.state.start_round(&self.tuning);
        self.accumulator = 0.0;
        self.last_time_ms = None;
        self.input.flap = false;
        self.consecutive_faults = 0;
        self.consecutive_render_faults = 0;
        self.running = true;
    }

    /// End a round that is still in progress, settling its score like a
    /// crash would. Returns false when no round was running.
    pub fn abandon_round(&mut self) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        scoring::end_round(&mut self.state, FatalCause::Abandoned);
        self.persist_best();
        self.running = false;
        true
    }

    /// Advance exactly one fixed tick
    pub fn step(&mut self) -> TickReport {
        let report = tick(&mut self.state, &self.input, &self.tuning, &self.settings);
        self.input.flap = false;

        match &report.fault {
            Some(fault) => {
                self.consecutive_faults += 1;
                self.last_fault = Some(fault.clone());
            }
            None => self.consecutive_faults = 0,
        }
        if report.round_ended {
            self.persist_best();
        }
        report
    }

    /// One display frame: run the ticks that fit into the elapsed time, then
    /// draw.
    pub fn frame(&mut self, now_ms: f64, surface: &mut dyn RenderSurface) -> FrameControl {
        let dt = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_time_ms = Some(now_ms);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut healthy = true;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let report = self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
            if !report.should_continue(self.tuning.failure_policy, self.consecutive_faults) {
                healthy = false;
                break;
            }
            if !self.state.is_playing() {
                break;
            }
        }
        // Time the substep cap could not absorb is dropped
        self.accumulator = self.accumulator.min(SIM_DT);

        match render(&self.state, &self.settings, surface) {
            Ok(_) => self.consecutive_render_faults = 0,
            Err(e) => {
                self.consecutive_render_faults += 1;
                log::warn!("Render phase failed: {}", e);
                self.last_fault = Some((Phase::Render, PhaseError::Render(e)));
                if !self.tuning.failure_policy.allows(self.consecutive_render_faults) {
                    healthy = false;
                }
            }
        }

        if !healthy {
            log::warn!(
                "Stopping the frame loop ({} tick faults, {} render faults in a row)",
                self.consecutive_faults,
                self.consecutive_render_faults
            );
            self.running = false;
            return FrameControl::Stop;
        }
        if !self.state.is_playing() {
            self.running = false;
            return FrameControl::Stop;
        }
        FrameControl::Continue
    }

    /// Lifecycle events since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    fn persist_best(&mut self) {
        let best = self.state.best_score();
        if best <= self.persisted_best {
            return;
        }
        match self.store.save_best(best) {
            Ok(()) => self.persisted_best = best,
            Err(e) => log::warn!("Could not save best score {}: {}", best, e),
        }
    }
}
