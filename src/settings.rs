//! Presentation settings and preferences
//!
//! Persisted separately from the best score in LocalStorage. Nothing here
//! changes gameplay; balance lives in [`crate::tuning`].

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Next preset in the Low, Medium, High cycle
    pub fn next(&self) -> Self {
        match self {
            QualityPreset::Low => QualityPreset::Medium,
            QualityPreset::Medium => QualityPreset::High,
            QualityPreset::High => QualityPreset::Low,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 150,
            QualityPreset::High => 400,
        }
    }

    /// Whether pickups get their glow halo
    pub fn glow_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle bursts on pickups and power-ups
    pub particles: bool,
    /// Score, droplet tally and power-up timer overlay
    pub show_hud: bool,
    /// Let the autopilot fly; remembered between sessions
    pub autopilot: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            show_hud: true,
            autopilot: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Decode stored settings, falling back to defaults on bad JSON
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                log::info!(
                    "Restored settings: {} quality, particles {}, HUD {}, autopilot {}",
                    settings.quality.as_str(),
                    settings.particles,
                    settings.show_hud,
                    settings.autopilot
                );
                settings
            }
            Err(e) => {
                log::warn!("Discarding stored settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "flappy_gates_settings";

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    /// Load settings from LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match Self::storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten()) {
            Some(json) => Self::from_json(&json),
            None => {
                log::info!("No stored settings, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, settings not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) if storage.set_item(Self::STORAGE_KEY, &json).is_ok() => {
                log::debug!("Settings saved ({} quality)", self.quality.as_str());
            }
            _ => log::warn!("Could not save settings"),
        }
    }

    /// Headless builds keep nothing between runs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_particle_cap_follows_toggle() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.max_particles(), 400);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "quality": "Low" }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(settings.particles);
        assert!(settings.show_hud);
        assert!(!settings.autopilot);
    }

    #[test]
    fn test_quality_cycles_through_presets() {
        let start = QualityPreset::Low;
        assert_eq!(start.next(), QualityPreset::Medium);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_stored_autopilot_is_restored() {
        let stored = Settings {
            autopilot: true,
            quality: QualityPreset::High,
            ..Settings::default()
        };
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(Settings::from_json(&json), stored);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
    }
}
