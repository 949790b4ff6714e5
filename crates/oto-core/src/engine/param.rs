//! Control parameter validation
//!
//! Invalid parameters are never fatal: the operation is skipped, the previous
//! value is kept and a warning is logged. The validators are shared by the
//! deck setters (audio thread) and the session controller (control thread) so
//! both sides agree on what is accepted.

use thiserror::Error;

use crate::types::{MAX_DECKS, MAX_SPEED_RATIO};

/// A rejected control parameter
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ParamError {
    #[error("gain {0} outside [0, 1]")]
    GainOutOfRange(f32),

    #[error("speed ratio {0} outside (0, {max}]", max = MAX_SPEED_RATIO)]
    SpeedOutOfRange(f64),

    #[error("relative position {0} outside [0, 1]")]
    PositionOutOfRange(f64),

    #[error("no deck {0} (session has {1})")]
    UnknownDeck(usize, usize),
}

/// Accept gains in `[0, 1]`
pub fn validate_gain(gain: f32) -> Result<f32, ParamError> {
    if (0.0..=1.0).contains(&gain) {
        Ok(gain)
    } else {
        Err(ParamError::GainOutOfRange(gain))
    }
}

/// Accept speed ratios in `(0, MAX_SPEED_RATIO]`
pub fn validate_speed(ratio: f64) -> Result<f64, ParamError> {
    if ratio > 0.0 && ratio <= MAX_SPEED_RATIO {
        Ok(ratio)
    } else {
        Err(ParamError::SpeedOutOfRange(ratio))
    }
}

/// Accept relative positions in `[0, 1]`
pub fn validate_relative_position(position: f64) -> Result<f64, ParamError> {
    if (0.0..=1.0).contains(&position) {
        Ok(position)
    } else {
        Err(ParamError::PositionOutOfRange(position))
    }
}

/// Accept deck indices below `num_decks` (never more than `MAX_DECKS`)
pub fn validate_deck(index: usize, num_decks: usize) -> Result<usize, ParamError> {
    if index < num_decks.min(MAX_DECKS) {
        Ok(index)
    } else {
        Err(ParamError::UnknownDeck(index, num_decks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_bounds_are_inclusive() {
        assert_eq!(validate_gain(0.0), Ok(0.0));
        assert_eq!(validate_gain(1.0), Ok(1.0));
        assert!(validate_gain(-0.01).is_err());
        assert!(validate_gain(1.01).is_err());
        assert!(validate_gain(f32::NAN).is_err());
    }

    #[test]
    fn test_speed_excludes_zero_includes_max() {
        assert!(validate_speed(0.0).is_err());
        assert!(validate_speed(-1.0).is_err());
        assert_eq!(validate_speed(MAX_SPEED_RATIO), Ok(MAX_SPEED_RATIO));
        assert!(validate_speed(MAX_SPEED_RATIO + 0.5).is_err());
        assert!(validate_speed(f64::NAN).is_err());
        assert!(validate_speed(f64::INFINITY).is_err());
    }

    #[test]
    fn test_position_and_deck() {
        assert_eq!(validate_relative_position(0.5), Ok(0.5));
        assert!(validate_relative_position(1.5).is_err());
        assert_eq!(validate_deck(2, 3), Ok(2));
        assert_eq!(validate_deck(3, 3), Err(ParamError::UnknownDeck(3, 3)));
    }
}
