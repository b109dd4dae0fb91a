//! Saved parameter values.
//!
//! A preset is the value of every parameter of one scene, stored as JSON so
//! an interesting configuration can be shared and reloaded.
//!
//! ```json
//! {
//!   "scene": "Vertical Bounce",
//!   "values": { "elasticity": { "Number": 0.95 }, "y_velocity": { "Number": -12.0 } }
//! }
//! ```

use crate::error::PresetError;
use crate::params::{ParamValue, ParameterStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parameter values captured from a scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamPreset {
    /// Name of the scene the values belong to.
    pub scene: String,
    /// Values by parameter name.
    pub values: BTreeMap<String, ParamValue>,
}

impl ParamPreset {
    /// Capture the current values of `store`.
    pub fn capture(scene: &str, store: &ParameterStore) -> Self {
        Self {
            scene: scene.to_string(),
            values: store
                .iter()
                .map(|p| (p.name().to_string(), p.value()))
                .collect(),
        }
    }

    /// Write every value into a copy of `store`, leaving `store` untouched
    /// if any value is rejected.
    pub fn applied_to(&self, store: &ParameterStore) -> Result<ParameterStore, PresetError> {
        let mut updated = store.clone();
        for (name, value) in &self.values {
            updated.set(name, *value)?;
        }
        Ok(updated)
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the preset to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!(scene = %self.scene, path = %path.display(), "saved preset");
        Ok(())
    }

    /// Load a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let preset = Self::from_json(&fs::read_to_string(path)?)?;
        info!(scene = %preset.scene, path = %path.display(), "loaded preset");
        Ok(preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamError;
    use crate::params::Parameter;

    fn store() -> ParameterStore {
        ParameterStore::from_parameters(vec![
            Parameter::range("y_velocity", "Vertical Velocity", -8.0, -20.0, 0.0, 0.1),
            Parameter::range("elasticity", "Elasticity", 0.8, 0.0, 1.0, 0.05),
        ])
        .unwrap()
    }

    #[test]
    fn test_capture_and_parse() {
        let preset = ParamPreset::capture("Vertical Bounce", &store());
        let parsed = ParamPreset::from_json(&preset.to_json().unwrap()).unwrap();
        assert_eq!(parsed, preset);
        assert_eq!(parsed.values["y_velocity"], ParamValue::Number(-8.0));
    }

    #[test]
    fn test_applied_to_is_atomic() {
        let store = store();
        let mut preset = ParamPreset::capture("Vertical Bounce", &store);
        preset.values.insert("elasticity".into(), ParamValue::Number(0.5));
        preset.values.insert("missing".into(), ParamValue::Number(1.0));
        let result = preset.applied_to(&store);
        assert!(matches!(
            result,
            Err(PresetError::Param(ParamError::UnknownParameter(_)))
        ));
        assert_eq!(store.get("elasticity"), Some(ParamValue::Number(0.8)));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("physlab-preset-{}.json", std::process::id()));
        let preset = ParamPreset::capture("Vertical Bounce", &store());
        preset.save(&path).unwrap();
        let loaded = ParamPreset::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, preset);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(ParamPreset::from_json("{"), Err(PresetError::Json(_))));
    }
}
