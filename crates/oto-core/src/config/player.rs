//! Player configuration

use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::engine::{validate_gain, validate_speed};
use crate::types::{DEFAULT_NUM_DECKS, MAX_DECKS};

/// Settings for the player binary, stored as YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub audio: AudioConfig,
    /// Number of decks (1..=8)
    pub num_decks: usize,
    /// Gain applied to every deck at startup
    pub initial_gain: f32,
    /// Speed ratio applied to every deck at startup
    pub initial_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            num_decks: DEFAULT_NUM_DECKS,
            initial_gain: 1.0,
            initial_speed: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Replace out-of-range values with defaults, logging each fix
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(1..=MAX_DECKS).contains(&self.num_decks) {
            log::warn!(
                "num_decks {} outside 1..={}, using {}",
                self.num_decks,
                MAX_DECKS,
                defaults.num_decks
            );
            self.num_decks = defaults.num_decks;
        }
        if let Err(e) = validate_gain(self.initial_gain) {
            log::warn!("initial_gain: {}, using {}", e, defaults.initial_gain);
            self.initial_gain = defaults.initial_gain;
        }
        if let Err(e) = validate_speed(self.initial_speed) {
            log::warn!("initial_speed: {}, using {}", e, defaults.initial_speed);
            self.initial_speed = defaults.initial_speed;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferSize;

    #[test]
    fn test_yaml_fields_override_defaults() {
        let yaml = "num_decks: 2\naudio:\n  buffer_size: !Fixed 256\n";
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_decks, 2);
        assert_eq!(config.audio.buffer_size, BufferSize::Fixed(256));
        assert_eq!(config.initial_gain, 1.0);
    }

    #[test]
    fn test_sanitized_replaces_invalid_values() {
        let config = PlayerConfig {
            num_decks: 0,
            initial_gain: 3.0,
            initial_speed: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config, PlayerConfig::default());

        let valid = PlayerConfig {
            num_decks: 8,
            initial_gain: 0.5,
            initial_speed: 2.0,
            ..Default::default()
        };
        assert_eq!(valid.clone().sanitized(), valid);
    }
}
