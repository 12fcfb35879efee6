use std::fmt::{self, Debug, Display};
use std::io;

use crate::parameters::Parameter;

/// Provides `ContagionError` and maps other errors to
/// convert to a `ContagionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ContagionError {
    /// An axis of the region has `min >= max` or a non-finite endpoint.
    InvalidBounds { axis: char, min: f64, max: f64 },
    /// A population must contain at least one agent.
    InvalidCount(usize),
    /// The name does not match any tunable agent parameter.
    UnknownParameter(String),
    /// The value is outside the accepted domain of the parameter.
    InvalidParameterValue { parameter: Parameter, value: f64 },
    /// Configuration value outside the accepted domain (cell size, fractions, placements).
    InvalidConfig(String),
    /// The spatial index already holds the key.
    DuplicateInsert(String),
    /// The spatial index does not hold the key.
    NotFound(String),
    IoError(io::Error),
    JsonError(serde_json::Error),
}

impl From<io::Error> for ContagionError {
    fn from(error: io::Error) -> Self {
        ContagionError::IoError(error)
    }
}

impl From<serde_json::Error> for ContagionError {
    fn from(error: serde_json::Error) -> Self {
        ContagionError::JsonError(error)
    }
}

impl std::error::Error for ContagionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContagionError::IoError(error) => Some(error),
            ContagionError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ContagionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContagionError::InvalidBounds { axis, min, max } => {
                write!(f, "invalid bounds on {axis} axis: min {min} must be below max {max}")
            }
            ContagionError::InvalidCount(count) => {
                write!(f, "invalid agent count {count}: at least one agent is required")
            }
            ContagionError::UnknownParameter(name) => write!(f, "unknown parameter '{name}'"),
            ContagionError::InvalidParameterValue { parameter, value } => {
                write!(f, "invalid value {value} for parameter '{parameter}'")
            }
            ContagionError::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
            ContagionError::DuplicateInsert(key) => {
                write!(f, "{key} is already present in the spatial index")
            }
            ContagionError::NotFound(key) => write!(f, "{key} is not present in the spatial index"),
            ContagionError::IoError(error) => write!(f, "I/O error: {error}"),
            ContagionError::JsonError(error) => write!(f, "JSON error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let error = ContagionError::InvalidParameterValue {
            parameter: Parameter::InfectProbability,
            value: 2.0,
        };
        assert_eq!(
            error.to_string(),
            "invalid value 2 for parameter 'infect_probability'"
        );
    }

    #[test]
    fn io_errors_keep_their_source() {
        let error: ContagionError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(std::error::Error::source(&error).is_some());
    }
}
