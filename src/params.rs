//! Named simulation parameters.
//!
//! A [`ParameterStore`] holds every tweakable value of a scene (velocity,
//! stiffness, angle, ...) together with its valid range. It is created once
//! per scene and survives every rebuild; builders only ever see an immutable
//! [`ParamSnapshot`] of it.
//!
//! # Example
//!
//! ```ignore
//! let mut store = ParameterStore::from_parameters(vec![
//!     Parameter::range("plane_angle", "Incline Angle (degrees)", 30.0, 10.0, 60.0, 1.0),
//!     Parameter::options("num_springs", "Number of Springs", 2, &[("1 Spring", 1), ("2 Springs", 2)]),
//! ])?;
//!
//! // Out-of-range values are clamped by default
//! assert_eq!(store.set("plane_angle", 90.0)?, ParamValue::Number(60.0));
//! ```

use crate::error::ParamError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A parameter value: either a number or one of an enumerated option set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Number(f32),
    Choice(i32),
}

impl ParamValue {
    /// Numeric view of the value.
    pub fn as_f32(&self) -> f32 {
        match self {
            ParamValue::Number(v) => *v,
            ParamValue::Choice(v) => *v as f32,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v as f32)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Choice(v)
    }
}

/// One labeled entry of an enumerated parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamOption {
    pub label: String,
    pub value: i32,
}

/// Valid values of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Bounds {
    /// Continuous range; `step` is the widget granularity.
    Range { min: f32, max: f32, step: f32 },
    /// Fixed set of labeled options.
    Options(Vec<ParamOption>),
}

impl Bounds {
    /// Whether `value` is admissible without clamping.
    pub fn contains(&self, value: ParamValue) -> bool {
        match (self, value) {
            (Bounds::Range { min, max, .. }, v) => {
                let v = v.as_f32();
                v >= *min && v <= *max
            }
            (Bounds::Options(options), ParamValue::Choice(v)) => {
                options.iter().any(|o| o.value == v)
            }
            (Bounds::Options(_), ParamValue::Number(_)) => false,
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            Bounds::Range { min, max, step } => {
                min.is_finite() && max.is_finite() && min <= max && *step > 0.0
            }
            Bounds::Options(options) => !options.is_empty(),
        }
    }
}

/// How the controller reacts when a parameter changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Rebuild the scene and pause (geometry, masses, initial velocities).
    #[default]
    Rebuild,
    /// Store only; read by per-tick hooks while the scene keeps running.
    Live,
}

/// What to do with a value outside a range parameter's bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClampPolicy {
    /// Silently clamp to the nearest bound, as a slider would.
    #[default]
    Clamp,
    /// Fail with [`ParamError::OutOfRange`].
    Reject,
}

/// A named parameter with its current value and bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    label: String,
    value: ParamValue,
    default: ParamValue,
    bounds: Bounds,
    update: UpdateMode,
}

impl Parameter {
    /// A continuous parameter. The default is clamped into `[min, max]`.
    pub fn range(name: &str, label: &str, default: f32, min: f32, max: f32, step: f32) -> Self {
        let default = ParamValue::Number(default.max(min).min(max));
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: default,
            default,
            bounds: Bounds::Range { min, max, step },
            update: UpdateMode::Rebuild,
        }
    }

    /// An enumerated parameter with `(label, value)` options.
    pub fn options(name: &str, label: &str, default: i32, options: &[(&str, i32)]) -> Self {
        let default = ParamValue::Choice(default);
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value: default,
            default,
            bounds: Bounds::Options(
                options
                    .iter()
                    .map(|(label, value)| ParamOption {
                        label: label.to_string(),
                        value: *value,
                    })
                    .collect(),
            ),
            update: UpdateMode::Rebuild,
        }
    }

    /// Mark the parameter as live: changes skip the rebuild.
    pub fn live(mut self) -> Self {
        self.update = UpdateMode::Live;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable label shown next to the widget.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> ParamValue {
        self.value
    }

    pub fn default_value(&self) -> ParamValue {
        self.default
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update
    }

    /// Coerce `value` into this parameter's bounds according to `policy`.
    fn admit(&self, value: ParamValue, policy: ClampPolicy) -> Result<ParamValue, ParamError> {
        match &self.bounds {
            Bounds::Range { min, max, .. } => {
                let v = value.as_f32();
                if v.is_nan() {
                    return Err(self.out_of_range(v, *min, *max));
                }
                if v >= *min && v <= *max {
                    return Ok(ParamValue::Number(v));
                }
                match policy {
                    ClampPolicy::Clamp => {
                        let clamped = v.max(*min).min(*max);
                        debug!(param = %self.name, requested = v, clamped, "clamped parameter");
                        Ok(ParamValue::Number(clamped))
                    }
                    ClampPolicy::Reject => Err(self.out_of_range(v, *min, *max)),
                }
            }
            Bounds::Options(options) => {
                let choice = match value {
                    ParamValue::Choice(c) => c,
                    ParamValue::Number(v) if v.fract() == 0.0 && v.is_finite() => v as i32,
                    ParamValue::Number(_) => {
                        return Err(ParamError::KindMismatch {
                            name: self.name.clone(),
                        })
                    }
                };
                if options.iter().any(|o| o.value == choice) {
                    Ok(ParamValue::Choice(choice))
                } else {
                    Err(ParamError::NotAnOption {
                        name: self.name.clone(),
                        value: choice,
                    })
                }
            }
        }
    }

    fn out_of_range(&self, value: f32, min: f32, max: f32) -> ParamError {
        ParamError::OutOfRange {
            name: self.name.clone(),
            value,
            min,
            max,
        }
    }
}

/// Ordered collection of parameters with lookup by name.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    /// Declaration order, which is also the control panel order.
    params: Vec<Parameter>,
    /// Quick lookup by name.
    indices: HashMap<String, usize>,
    policy: ClampPolicy,
}

impl ParameterStore {
    /// Create an empty store that clamps out-of-range values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of parameter declarations.
    pub fn from_parameters(params: Vec<Parameter>) -> Result<Self, ParamError> {
        let mut store = Self::new();
        for param in params {
            store.insert(param)?;
        }
        Ok(store)
    }

    /// Add a parameter. Names must be unique and bounds well formed.
    pub fn insert(&mut self, param: Parameter) -> Result<(), ParamError> {
        if self.indices.contains_key(&param.name) {
            return Err(ParamError::DuplicateParameter(param.name));
        }
        if !param.bounds.is_valid() || !param.bounds.contains(param.default) {
            return Err(ParamError::InvalidBounds { name: param.name });
        }
        self.indices.insert(param.name.clone(), self.params.len());
        self.params.push(param);
        Ok(())
    }

    pub fn policy(&self) -> ClampPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ClampPolicy) {
        self.policy = policy;
    }

    /// Current value of a parameter.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.parameter(name).map(|p| p.value)
    }

    /// Full parameter declaration.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.indices.get(name).map(|&idx| &self.params[idx])
    }

    /// Write a value, returning what was actually stored.
    ///
    /// Range values are clamped unless the policy is [`ClampPolicy::Reject`].
    /// Enumerated values must be one of the declared options.
    pub fn set<V: Into<ParamValue>>(&mut self, name: &str, value: V) -> Result<ParamValue, ParamError> {
        let idx = *self
            .indices
            .get(name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        let param = &mut self.params[idx];
        let admitted = param.admit(value.into(), self.policy)?;
        param.value = admitted;
        Ok(admitted)
    }

    /// Restore every parameter to its declared default.
    pub fn reset_defaults(&mut self) {
        for param in &mut self.params {
            param.value = param.default;
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Immutable copy of the current values for a scene builder.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: self
                .params
                .iter()
                .map(|p| (p.name.clone(), p.value))
                .collect(),
        }
    }
}

/// Values of every parameter at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSnapshot {
    values: HashMap<String, ParamValue>,
}

impl ParamSnapshot {
    pub fn get(&self, name: &str) -> Result<ParamValue, ParamError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))
    }

    /// Numeric value of a parameter.
    pub fn get_f32(&self, name: &str) -> Result<f32, ParamError> {
        self.get(name).map(|v| v.as_f32())
    }

    /// Selected option of an enumerated parameter.
    pub fn get_choice(&self, name: &str) -> Result<i32, ParamError> {
        match self.get(name)? {
            ParamValue::Choice(c) => Ok(c),
            ParamValue::Number(_) => Err(ParamError::KindMismatch {
                name: name.to_string(),
            }),
        }
    }

    /// An angle parameter stored in degrees, converted to radians.
    pub fn get_radians(&self, name: &str) -> Result<f32, ParamError> {
        self.get_f32(name).map(crate::geometry::to_radians)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        ParameterStore::from_parameters(vec![
            Parameter::range("angle", "Angle", 30.0, 10.0, 60.0, 1.0),
            Parameter::options(
                "springs",
                "Springs",
                2,
                &[("1 Spring", 1), ("2 Springs", 2), ("3 Springs", 3)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_clamps_by_default() {
        let mut store = store();
        assert_eq!(store.set("angle", 90.0).unwrap(), ParamValue::Number(60.0));
        assert_eq!(store.set("angle", -5.0).unwrap(), ParamValue::Number(10.0));
        assert_eq!(store.get("angle"), Some(ParamValue::Number(10.0)));
    }

    #[test]
    fn test_reject_policy() {
        let mut store = store();
        store.set_policy(ClampPolicy::Reject);
        let err = store.set("angle", 61.0).unwrap_err();
        assert!(matches!(err, ParamError::OutOfRange { .. }));
        assert_eq!(store.get("angle"), Some(ParamValue::Number(30.0)));
    }

    #[test]
    fn test_nan_never_stored() {
        let mut store = store();
        assert!(store.set("angle", f32::NAN).is_err());
        assert_eq!(store.set("angle", f32::INFINITY).unwrap(), ParamValue::Number(60.0));
    }

    #[test]
    fn test_options() {
        let mut store = store();
        assert_eq!(store.set("springs", 3).unwrap(), ParamValue::Choice(3));
        assert_eq!(store.set("springs", 1.0).unwrap(), ParamValue::Choice(1));
        assert!(matches!(
            store.set("springs", 4),
            Err(ParamError::NotAnOption { value: 4, .. })
        ));
        assert!(matches!(
            store.set("springs", 1.5),
            Err(ParamError::KindMismatch { .. })
        ));
        assert_eq!(store.get("springs"), Some(ParamValue::Choice(1)));
    }

    #[test]
    fn test_unknown_and_duplicate() {
        let mut store = store();
        assert!(matches!(
            store.set("nope", 1.0),
            Err(ParamError::UnknownParameter(_))
        ));
        let dup = store.insert(Parameter::range("angle", "Angle", 1.0, 0.0, 2.0, 0.1));
        assert!(matches!(dup, Err(ParamError::DuplicateParameter(_))));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut store = ParameterStore::new();
        assert!(store
            .insert(Parameter::range("x", "X", 0.0, 1.0, 0.0, 0.1))
            .is_err());
        assert!(store
            .insert(Parameter::range("y", "Y", 0.0, 0.0, 1.0, 0.0))
            .is_err());
        assert!(store.insert(Parameter::options("z", "Z", 0, &[])).is_err());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = store();
        let snap = store.snapshot();
        store.set("angle", 45.0).unwrap();
        assert_eq!(snap.get_f32("angle").unwrap(), 30.0);
        assert_eq!(snap.get_choice("springs").unwrap(), 2);
        assert!((snap.get_radians("angle").unwrap() - std::f32::consts::FRAC_PI_6).abs() < 1e-6);
    }

    #[test]
    fn test_reset_defaults_and_order() {
        let mut store = store();
        store.set("angle", 50.0).unwrap();
        store.reset_defaults();
        assert_eq!(store.get("angle"), Some(ParamValue::Number(30.0)));
        let names: Vec<_> = store.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["angle", "springs"]);
    }
}
