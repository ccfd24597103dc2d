//! Draw command generation for every kind of entity plus the HUD

use glam::Vec2;

use super::{DrawCommand, Sprite, TextAlign};
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::highscores::format_best;
use crate::settings::Settings;
use crate::sim::collision::Rect;
use crate::sim::state::{
    ActivePowerUp, Avatar, GameState, Obstacle, PICKUP_COLOR, Particle, Pickup, PowerUpToken, Rgba,
    RoundPhase,
};

const BACKGROUND: Rgba = [0.10, 0.10, 0.10, 1.0];
const PIPE: Rgba = [0.176, 0.176, 0.176, 1.0];
const PIPE_CAP: Rgba = [0.239, 0.239, 0.239, 1.0];
const PIPE_HIGHLIGHT: Rgba = [1.0, 1.0, 1.0, 0.1];
const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
const SHIELD: Rgba = [0.26, 0.53, 0.96, 1.0];
const SHIELD_FILL: Rgba = [0.26, 0.53, 0.96, 0.2];
const SHRINK_GLOW: Rgba = [0.26, 0.96, 0.33, 1.0];
const SLOW_RING: Rgba = [0.96, 0.26, 0.95, 0.5];
const PANEL: Rgba = [0.0, 0.0, 0.0, 0.7];

/// Cap overhang on each side of a pipe
const CAP_OVERHANG: f32 = 5.0;
const CAP_HEIGHT: f32 = 30.0;
/// Max avatar tilt (radians)
const MAX_TILT: f32 = 0.5;

/// Build the full frame, back to front
pub fn frame(state: &GameState, settings: &Settings) -> Vec<DrawCommand> {
    let glow = settings.quality.glow_enabled();
    let mut out = vec![DrawCommand::Clear { color: BACKGROUND }];

    for obstacle in &state.obstacles {
        out.extend(gate(obstacle));
    }
    for pickup in state.pickups.iter().filter(|p| !p.collected) {
        out.push(droplet(pickup, glow));
    }
    for token in state.power_ups.iter().filter(|t| !t.collected) {
        out.extend(power_up_token(token, glow));
    }
    out.extend(avatar(&state.avatar, state.speed_modifier, state.now_ms(), glow));
    out.extend(state.particles.iter().map(particle));

    if settings.show_hud {
        out.extend(hud(state));
    }
    out.extend(overlay(state));
    out
}

/// Pipe pair with end caps and a highlight stripe
pub fn gate(obstacle: &Obstacle) -> Vec<DrawCommand> {
    let Obstacle {
        x, top, bottom, width, ..
    } = *obstacle;
    let lower = PLAYFIELD_HEIGHT - bottom;
    let rect = |rect: Rect, color: Rgba| DrawCommand::Rect { rect, color };

    vec![
        rect(Rect::new(x, 0.0, width, top), PIPE),
        rect(
            Rect::new(x - CAP_OVERHANG, top - CAP_HEIGHT, width + 2.0 * CAP_OVERHANG, CAP_HEIGHT),
            PIPE_CAP,
        ),
        rect(Rect::new(x, bottom, width, lower), PIPE),
        rect(
            Rect::new(x - CAP_OVERHANG, bottom, width + 2.0 * CAP_OVERHANG, CAP_HEIGHT),
            PIPE_CAP,
        ),
        rect(Rect::new(x + 10.0, 0.0, 5.0, top), PIPE_HIGHLIGHT),
        rect(Rect::new(x + 10.0, bottom, 5.0, lower), PIPE_HIGHLIGHT),
    ]
}

/// Nose-up when rising, nose-down when falling
pub fn avatar_tilt(velocity: f32) -> f32 {
    (velocity * 0.05).clamp(-MAX_TILT, MAX_TILT)
}

/// The avatar plus whatever effect overlays are active
pub fn avatar(avatar: &Avatar, speed_modifier: f32, now_ms: u64, glow: bool) -> Vec<DrawCommand> {
    let center = avatar.center();
    let mut out = Vec::with_capacity(4);

    if avatar.shielded {
        let radius = avatar.size / 1.5;
        out.push(DrawCommand::Circle {
            center,
            radius,
            color: SHIELD_FILL,
            glow: false,
        });
        // Marching dashes
        out.push(DrawCommand::Ring {
            center,
            radius,
            width: 2.0,
            color: SHIELD,
            dash_offset: Some(-(now_ms as f32) / 50.0),
        });
    }

    out.push(DrawCommand::Sprite {
        sprite: Sprite::Avatar,
        center,
        size: avatar.size,
        rotation: avatar_tilt(avatar.velocity),
        glow: (avatar.shrunk && glow).then_some(SHRINK_GLOW),
    });

    if speed_modifier < 1.0 {
        out.push(DrawCommand::Ring {
            center,
            radius: avatar.size / 1.2,
            width: 2.0,
            color: SLOW_RING,
            dash_offset: None,
        });
    }
    out
}

pub fn droplet(pickup: &Pickup, glow: bool) -> DrawCommand {
    let center = pickup.bounds().center() + Vec2::new(0.0, pickup.wobble_offset());
    DrawCommand::Sprite {
        sprite: Sprite::Droplet,
        center,
        size: pickup.size,
        rotation: 0.0,
        glow: glow.then_some(PICKUP_COLOR),
    }
}

/// Halo, colored core and icon
pub fn power_up_token(token: &PowerUpToken, glow: bool) -> Vec<DrawCommand> {
    let center = token.bounds().center();
    let [r, g, b, _] = token.def.color;
    vec![
        DrawCommand::Circle {
            center,
            radius: token.size,
            color: [r, g, b, 0.35],
            glow,
        },
        DrawCommand::Circle {
            center,
            radius: token.size / 2.0,
            color: token.def.accent,
            glow: false,
        },
        DrawCommand::Text {
            text: token.def.icon.to_string(),
            pos: center,
            size: 20.0,
            color: WHITE,
            align: TextAlign::Center,
        },
    ]
}

pub fn particle(particle: &Particle) -> DrawCommand {
    let [r, g, b, a] = particle.color;
    DrawCommand::Circle {
        center: particle.pos,
        radius: particle.size.max(0.1),
        color: [r, g, b, a * particle.life.clamp(0.0, 1.0)],
        glow: false,
    }
}

/// Score, droplet tally and the active power-up panel
pub fn hud(state: &GameState) -> Vec<DrawCommand> {
    let mut out = vec![
        DrawCommand::Text {
            text: state.score.to_string(),
            pos: Vec2::new(PLAYFIELD_WIDTH / 2.0, 50.0),
            size: 48.0,
            color: WHITE,
            align: TextAlign::Center,
        },
        DrawCommand::Text {
            text: format!("💧 {}", state.pickups_collected),
            pos: Vec2::new(PLAYFIELD_WIDTH - 10.0, 24.0),
            size: 24.0,
            color: [0.26, 0.53, 0.96, 1.0],
            align: TextAlign::Right,
        },
    ];
    if let Some(active) = &state.active_power_up {
        out.extend(power_up_panel(active, state.now_ms()));
    }
    out
}

/// Countdown panel for the active power-up
pub fn power_up_panel(active: &ActivePowerUp, now_ms: u64) -> Vec<DrawCommand> {
    let (x, y, width, height) = (10.0, 40.0, 150.0, 40.0);
    let bar_width = (width - 20.0) * active.remaining_fraction(now_ms);
    vec![
        DrawCommand::Rect {
            rect: Rect::new(x, y, width, height),
            color: PANEL,
        },
        DrawCommand::Rect {
            rect: Rect::new(x + 10.0, y + height - 8.0, bar_width, 4.0),
            color: active.def.color,
        },
        DrawCommand::Text {
            text: format!("{} {}s", active.def.icon, active.seconds_left(now_ms)),
            pos: Vec2::new(x + 20.0, y + height / 2.0),
            size: 18.0,
            color: WHITE,
            align: TextAlign::Left,
        },
    ]
}

/// Start prompt and game-over card
fn overlay(state: &GameState) -> Vec<DrawCommand> {
    let mid = PLAYFIELD_WIDTH / 2.0;
    let line = |text: String, y: f32, size: f32| DrawCommand::Text {
        text,
        pos: Vec2::new(mid, y),
        size,
        color: WHITE,
        align: TextAlign::Center,
    };
    match state.phase {
        RoundPhase::Playing => Vec::new(),
        RoundPhase::Idle => vec![
            line("Flappy Gates".to_string(), 220.0, 40.0),
            line("Press Space or Tap to Start".to_string(), 420.0, 20.0),
            line(format_best(state.best_score()), 450.0, 18.0),
        ],
        RoundPhase::Ended => vec![
            DrawCommand::Rect {
                rect: Rect::new(0.0, 0.0, PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
                color: [0.0, 0.0, 0.0, 0.5],
            },
            line("Game Over".to_string(), 240.0, 40.0),
            line(format!("Score: {}", state.score), 290.0, 24.0),
            line(format_best(state.best_score()), 320.0, 24.0),
            line("Press Space or Tap to Restart".to_string(), 380.0, 20.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use crate::sim::powerup;
    use crate::sim::state::PowerUpKind;

    fn playing(tuning: &Tuning) -> GameState {
        let mut state = GameState::new(5, 3, tuning);
        state.start_round(tuning);
        state
    }

    #[test]
    fn test_gate_caps_sit_on_gap_edges() {
        let obstacle = Obstacle {
            id: 1,
            x: 200.0,
            top: 150.0,
            bottom: 350.0,
            gap: 200.0,
            width: 70.0,
            counted: false,
        };
        let commands = gate(&obstacle);
        assert_eq!(commands.len(), 6);
        assert_eq!(
            commands[1],
            DrawCommand::Rect {
                rect: Rect::new(195.0, 120.0, 80.0, 30.0),
                color: PIPE_CAP
            }
        );
        assert_eq!(
            commands[2],
            DrawCommand::Rect {
                rect: Rect::new(200.0, 350.0, 70.0, PLAYFIELD_HEIGHT - 350.0),
                color: PIPE
            }
        );
    }

    #[test]
    fn test_tilt_is_clamped() {
        assert_eq!(avatar_tilt(20.0), 0.5);
        assert_eq!(avatar_tilt(-20.0), -0.5);
        assert!((avatar_tilt(-7.0) - (-0.35)).abs() < 1e-6);
    }

    #[test]
    fn test_effect_overlays() {
        let tuning = Tuning::default();
        let mut body = Avatar::new(&tuning);
        assert_eq!(avatar(&body, 1.0, 0, true).len(), 1);

        body.shielded = true;
        let shielded = avatar(&body, 1.0, 500, true);
        assert!(shielded.iter().any(|c| matches!(
            c,
            DrawCommand::Ring {
                dash_offset: Some(_),
                ..
            }
        )));

        body.shielded = false;
        body.shrunk = true;
        let slowed = avatar(&body, 0.5, 0, true);
        assert_eq!(slowed.len(), 2);
        match &slowed[0] {
            DrawCommand::Sprite { glow, .. } => assert_eq!(*glow, Some(SHRINK_GLOW)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(slowed[1], DrawCommand::Ring { dash_offset: None, .. }));
    }

    #[test]
    fn test_panel_bar_tracks_remaining_time() {
        let tuning = Tuning::default();
        let settings = Settings::default();
        let mut state = playing(&tuning);
        powerup::activate(&mut state, PowerUpKind::DoubleScore.def(), &tuning, &settings);
        // Halfway through a 5s effect
        state.round_ticks = 150;
        let active = state.active_power_up.clone().unwrap();
        let panel = power_up_panel(&active, state.now_ms());
        match &panel[1] {
            DrawCommand::Rect { rect, .. } => assert!((rect.size.x - 65.0).abs() < 1e-3),
            other => panic!("unexpected {other:?}"),
        }
        match &panel[2] {
            DrawCommand::Text { text, .. } => assert_eq!(text, "× 3s"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_hud_can_be_hidden() {
        let tuning = Tuning::default();
        let state = playing(&tuning);
        let shown = frame(&state, &Settings::default());
        let hidden = frame(
            &state,
            &Settings {
                show_hud: false,
                ..Settings::default()
            },
        );
        assert_eq!(shown.len(), hidden.len() + 2);
    }

    #[test]
    fn test_game_over_card_shows_best() {
        let tuning = Tuning::default();
        let mut state = playing(&tuning);
        state.phase = RoundPhase::Ended;
        let texts: Vec<String> = frame(&state, &Settings::default())
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert!(texts.iter().any(|t| t == "Game Over"));
        assert!(texts.iter().any(|t| t == "Best Score: 3"));
    }

    #[test]
    fn test_particles_fade_with_life() {
        let p = Particle {
            pos: Vec2::new(1.0, 2.0),
            vel: Vec2::ZERO,
            color: [1.0, 0.0, 0.0, 0.8],
            life: 0.5,
            size: 0.0,
        };
        match particle(&p) {
            DrawCommand::Circle { radius, color, .. } => {
                assert_eq!(radius, 0.1);
                assert!((color[3] - 0.4).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
