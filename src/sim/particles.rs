//! Cosmetic particle bursts

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Particle, Rgba};
use super::tick::PhaseError;
use crate::settings::Settings;

/// Life lost per tick
const LIFE_DECAY: f32 = 0.02;
/// Size lost per tick
const SIZE_DECAY: f32 = 0.1;
const MIN_SIZE: f32 = 0.5;
/// Max initial speed per axis (pixels/tick)
const BURST_SPREAD: f32 = 4.0;

/// Spray `count` particles from `origin`, respecting the particle cap
pub fn burst(state: &mut GameState, origin: Vec2, count: usize, color: Rgba, settings: &Settings) {
    let room = settings.max_particles().saturating_sub(state.particles.len());
    for _ in 0..count.min(room) {
        let rng = state.rng();
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * BURST_SPREAD,
            (rng.random::<f32>() - 0.5) * BURST_SPREAD,
        );
        let size = rng.random_range(2.0..5.0);
        state.particles.push(Particle {
            pos: origin,
            vel,
            color,
            life: 1.0,
            size,
        });
    }
}

/// Particle phase: drift, fade, shrink, drop the dead
pub fn update(state: &mut GameState) -> Result<(), PhaseError> {
    for particle in &mut state.particles {
        particle.pos += particle.vel;
        particle.life -= LIFE_DECAY;
        particle.size = (particle.size - SIZE_DECAY).max(MIN_SIZE);
    }
    state.particles.retain(|p| p.life > 0.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;
    use crate::tuning::Tuning;

    #[test]
    fn test_burst_respects_cap() {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, 0, &tuning);
        let settings = Settings::from_preset(QualityPreset::Low);
        let cap = settings.max_particles();

        burst(&mut state, Vec2::ZERO, cap + 25, [1.0; 4], &settings);
        assert_eq!(state.particles.len(), cap);
        burst(&mut state, Vec2::ZERO, 5, [1.0; 4], &settings);
        assert_eq!(state.particles.len(), cap);
    }

    #[test]
    fn test_disabled_particles_spawn_nothing() {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, 0, &tuning);
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        burst(&mut state, Vec2::ZERO, 8, [1.0; 4], &settings);
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_particles_fade_out() {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, 0, &tuning);
        burst(&mut state, Vec2::new(50.0, 50.0), 8, [1.0; 4], &Settings::default());

        update(&mut state).unwrap();
        for p in &state.particles {
            assert!(p.life > 0.0 && p.life < 1.0);
            assert!(p.size >= MIN_SIZE);
        }

        // life hits zero after 50 ticks
        for _ in 0..60 {
            update(&mut state).unwrap();
        }
        assert!(state.particles.is_empty());
    }
}
