//! Error types for physlab.
//!
//! This module provides error types for parameter updates, scene building,
//! controller transitions and preset loading.

use std::fmt;

/// Errors raised by the parameter store.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Value outside the parameter's range while clamping is disabled.
    OutOfRange {
        name: String,
        value: f32,
        min: f32,
        max: f32,
    },
    /// No parameter with this name.
    UnknownParameter(String),
    /// Value is not one of the parameter's enumerated options.
    NotAnOption { name: String, value: i32 },
    /// A numeric value was given to an enumerated parameter or vice versa.
    KindMismatch { name: String },
    /// Two parameters share a name.
    DuplicateParameter(String),
    /// Bounds are empty, inverted or have a non-positive step.
    InvalidBounds { name: String },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::OutOfRange { name, value, min, max } => write!(
                f,
                "Value {} for '{}' is outside [{}, {}]",
                value, name, min, max
            ),
            ParamError::UnknownParameter(name) => write!(f, "Unknown parameter '{}'", name),
            ParamError::NotAnOption { name, value } => {
                write!(f, "{} is not a valid option for '{}'", value, name)
            }
            ParamError::KindMismatch { name } => {
                write!(f, "Value kind does not match parameter '{}'", name)
            }
            ParamError::DuplicateParameter(name) => {
                write!(f, "Parameter '{}' is declared twice", name)
            }
            ParamError::InvalidBounds { name } => write!(f, "Invalid bounds for '{}'", name),
        }
    }
}

impl std::error::Error for ParamError {}

/// Errors that can occur while building a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Derived geometry is unusable (zero-height incline, flat triangle, ...).
    DegenerateGeometry(String),
    /// A constraint refers to a body index that is not in the blueprint.
    InvalidReference { index: usize, len: usize },
    /// The builder read a parameter that failed.
    Param(ParamError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::DegenerateGeometry(msg) => write!(f, "Degenerate geometry: {}", msg),
            SceneError::InvalidReference { index, len } => write!(
                f,
                "Constraint refers to body {} but the blueprint has {} entities",
                index, len
            ),
            SceneError::Param(e) => write!(f, "Parameter error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Param(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamError> for SceneError {
    fn from(e: ParamError) -> Self {
        SceneError::Param(e)
    }
}

/// A controller transition that is not legal from the current state.
///
/// Never fatal: the controller is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateError {
    pub action: &'static str,
    pub state: crate::clock::ClockState,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot {} while {:?}", self.action, self.state)
    }
}

impl std::error::Error for StateError {}

/// Errors that can occur when saving or loading a parameter preset.
#[derive(Debug)]
pub enum PresetError {
    /// Failed to read or write the preset file.
    Io(std::io::Error),
    /// The file is not a valid preset document.
    Json(serde_json::Error),
    /// The preset was saved for a different scene.
    SceneMismatch { expected: String, found: String },
    /// A stored value was rejected by the parameter store.
    Param(ParamError),
    /// The scene could not be rebuilt with the loaded values.
    Scene(SceneError),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::Io(e) => write!(f, "Failed to access preset file: {}", e),
            PresetError::Json(e) => write!(f, "Invalid preset: {}", e),
            PresetError::SceneMismatch { expected, found } => write!(
                f,
                "Preset is for scene '{}', not '{}'",
                found, expected
            ),
            PresetError::Param(e) => write!(f, "Preset value rejected: {}", e),
            PresetError::Scene(e) => write!(f, "Preset could not be applied: {}", e),
        }
    }
}

impl std::error::Error for PresetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresetError::Io(e) => Some(e),
            PresetError::Json(e) => Some(e),
            PresetError::Param(e) => Some(e),
            PresetError::Scene(e) => Some(e),
            PresetError::SceneMismatch { .. } => None,
        }
    }
}

impl From<std::io::Error> for PresetError {
    fn from(e: std::io::Error) -> Self {
        PresetError::Io(e)
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(e: serde_json::Error) -> Self {
        PresetError::Json(e)
    }
}

impl From<ParamError> for PresetError {
    fn from(e: ParamError) -> Self {
        PresetError::Param(e)
    }
}

impl From<SceneError> for PresetError {
    fn from(e: SceneError) -> Self {
        PresetError::Scene(e)
    }
}
