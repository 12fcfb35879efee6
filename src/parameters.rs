//! Tunable mobility and infection parameters.
//!
//! Every agent carries its own copy of [`AgentParameters`]. External controls change a value
//! for the whole population at once through `Population::set_parameter`, naming the value with a
//! [`Parameter`]. Names are the snake case spelling of the variants (`"infect_range"`, ...).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::ContagionError;

/// Largest per-tick step an agent can be created with; each agent draws its
/// speed uniformly from `[0, MAX_WALK_SPEED]` unless configured otherwise.
pub const MAX_WALK_SPEED: f64 = 1.0;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Half-side of the square searched for transmission
    InfectRange,
    /// Chance, per tick and per neighbor, of transmitting
    InfectProbability,
    /// Largest displacement of a freely chosen destination
    WalkRange,
    /// Distance covered per tick on each axis
    WalkSpeed,
    /// Rest periods are drawn from `[0, stop_duration)` whole ticks
    StopDuration,
    /// Chance of heading to a popular place rather than a random destination
    PopularPlaceProbability,
}

impl Parameter {
    /// Checks `value` against the domain of this parameter.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidParameterValue` for non-finite or
    /// negative values, for probabilities above one, and for walk ranges so
    /// large that the resampling span `[-range, range + 1]` overflows.
    pub fn validate(self, value: f64) -> Result<f64, ContagionError> {
        let in_domain = match self {
            Parameter::InfectProbability | Parameter::PopularPlaceProbability => {
                (0.0..=1.0).contains(&value)
            }
            Parameter::WalkRange => value >= 0.0 && (2.0 * value + 1.0).is_finite(),
            _ => value.is_finite() && value >= 0.0,
        };
        if in_domain {
            Ok(value)
        } else {
            Err(ContagionError::InvalidParameterValue {
                parameter: self,
                value,
            })
        }
    }
}

/// Per-agent parameters shared by the whole population at creation time.
/// Walk speed is not included: it is drawn per agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParameters {
    pub infect_range: f64,
    pub infect_probability: f64,
    pub walk_range: f64,
    pub stop_duration: f64,
    pub popular_place_probability: f64,
}

impl AgentParameters {
    /// # Errors
    ///
    /// Returns the first value rejected by [`Parameter::validate`].
    pub fn validate(&self) -> Result<(), ContagionError> {
        Parameter::InfectRange.validate(self.infect_range)?;
        Parameter::InfectProbability.validate(self.infect_probability)?;
        Parameter::WalkRange.validate(self.walk_range)?;
        Parameter::StopDuration.validate(self.stop_duration)?;
        Parameter::PopularPlaceProbability.validate(self.popular_place_probability)?;
        Ok(())
    }
}

impl Default for AgentParameters {
    fn default() -> Self {
        AgentParameters {
            infect_range: 2.0,
            infect_probability: 0.01,
            walk_range: 5.0,
            stop_duration: 25.0,
            popular_place_probability: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_round_trip() {
        for parameter in Parameter::iter() {
            let name: &'static str = parameter.into();
            assert_eq!(Parameter::from_str(name).unwrap(), parameter);
        }
        assert_eq!(
            Parameter::from_str("popular_place_probability").unwrap(),
            Parameter::PopularPlaceProbability
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(Parameter::from_str("walk_duration").is_err());
    }

    #[test]
    fn probabilities_are_capped() {
        assert!(Parameter::InfectProbability.validate(1.0).is_ok());
        assert!(Parameter::InfectProbability.validate(1.5).is_err());
        assert!(Parameter::PopularPlaceProbability.validate(-0.1).is_err());
        assert!(Parameter::InfectProbability.validate(f64::NAN).is_err());
    }

    #[test]
    fn distances_must_be_non_negative() {
        assert!(Parameter::WalkRange.validate(0.0).is_ok());
        assert!(Parameter::WalkSpeed.validate(-1.0).is_err());
        assert!(Parameter::InfectRange.validate(f64::INFINITY).is_err());
    }

    #[test]
    fn walk_range_span_must_be_finite() {
        assert!(Parameter::WalkRange.validate(1.0e300).is_ok());
        let error = Parameter::WalkRange.validate(1.0e308).unwrap_err();
        assert!(matches!(
            error,
            ContagionError::InvalidParameterValue {
                parameter: Parameter::WalkRange,
                ..
            }
        ));
        assert!(Parameter::WalkRange.validate(f64::NAN).is_err());
        // Only walk ranges are sampled over a doubled span
        assert!(Parameter::InfectRange.validate(1.0e308).is_ok());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(AgentParameters::default().validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let parameters: AgentParameters =
            serde_json::from_str(r#"{ "infect_range": 4.0 }"#).unwrap();
        assert!((parameters.infect_range - 4.0).abs() < f64::EPSILON);
        assert!((parameters.walk_range - 5.0).abs() < f64::EPSILON);
    }
}
