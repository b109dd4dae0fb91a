//! Control panel binding.
//!
//! One [`Control`] per parameter, each mirroring the parameter's bounds. The
//! panel does not observe the store: after any programmatic change the owner
//! must call [`ControlPanel::resynchronize`] to pull the stored values back
//! into the widgets.

use crate::error::ParamError;
use crate::params::{Bounds, ParamOption, ParamValue, ParameterStore, UpdateMode};

/// Widget kind and its declared range.
#[derive(Clone, Debug, PartialEq)]
pub enum Widget {
    Slider { min: f32, max: f32, step: f32 },
    Dropdown { options: Vec<ParamOption> },
}

/// A value the user picked, ready for
/// [`SceneController::apply_parameter_change`](crate::SceneController::apply_parameter_change).
#[derive(Clone, Debug, PartialEq)]
pub struct ParamChange {
    pub name: String,
    pub value: ParamValue,
}

/// A widget bound to one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    name: String,
    label: String,
    widget: Widget,
    update: UpdateMode,
    displayed: ParamValue,
}

impl Control {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update
    }

    /// Value currently shown by the widget.
    pub fn displayed(&self) -> ParamValue {
        self.displayed
    }

    /// Coerce a raw widget value the way the widget itself would.
    fn coerce(&self, raw: ParamValue) -> Result<ParamValue, ParamError> {
        match &self.widget {
            Widget::Slider { min, max, step } => {
                let v = raw.as_f32();
                if !v.is_finite() {
                    return Err(ParamError::OutOfRange {
                        name: self.name.clone(),
                        value: v,
                        min: *min,
                        max: *max,
                    });
                }
                let v = v.clamp(*min, *max);
                let snapped = min + ((v - min) / step).round() * step;
                Ok(ParamValue::Number(snapped.clamp(*min, *max)))
            }
            Widget::Dropdown { options } => {
                let choice = match raw {
                    ParamValue::Choice(c) => c,
                    ParamValue::Number(v) if v.is_finite() && v.fract() == 0.0 => v as i32,
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
}

/// Ordered set of controls for one scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlPanel {
    controls: Vec<Control>,
}

impl ControlPanel {
    /// One control per parameter, in store order, showing current values.
    pub fn bind(store: &ParameterStore) -> Self {
        let controls = store
            .iter()
            .map(|param| Control {
                name: param.name().to_string(),
                label: param.label().to_string(),
                widget: match param.bounds() {
                    Bounds::Range { min, max, step } => Widget::Slider {
                        min: *min,
                        max: *max,
                        step: *step,
                    },
                    Bounds::Options(options) => Widget::Dropdown {
                        options: options.clone(),
                    },
                },
                update: param.update_mode(),
                displayed: param.value(),
            })
            .collect();
        Self { controls }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Simulate the user moving a widget to `raw`.
    ///
    /// Sliders snap to their step inside `[min, max]`; dropdowns only accept
    /// declared options. The widget shows the coerced value immediately and
    /// the returned change is what the controller should apply.
    pub fn interact<V: Into<ParamValue>>(&mut self, name: &str, raw: V) -> Result<ParamChange, ParamError> {
        let control = self
            .controls
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        let value = control.coerce(raw.into())?;
        control.displayed = value;
        Ok(ParamChange {
            name: name.to_string(),
            value,
        })
    }

    /// Push every stored value back into its widget.
    pub fn resynchronize(&mut self, store: &ParameterStore) {
        for control in &mut self.controls {
            if let Some(value) = store.get(&control.name) {
                control.displayed = value;
            }
        }
    }

    /// Whether every widget shows exactly what the store holds.
    pub fn is_synchronized(&self, store: &ParameterStore) -> bool {
        self.controls
            .iter()
            .all(|c| store.get(&c.name) == Some(c.displayed))
    }
}

/// Draw the panel with egui sliders and combo boxes.
///
/// Returns the changes the user made this frame; the caller forwards them to
/// the controller.
#[cfg(feature = "egui")]
pub fn render_control_panel(ui: &mut egui::Ui, panel: &mut ControlPanel) -> Vec<ParamChange> {
    let mut requested = Vec::new();

    for control in &panel.controls {
        match &control.widget {
            Widget::Slider { min, max, step } => {
                let mut value = control.displayed.as_f32();
                let response = ui.add(
                    egui::Slider::new(&mut value, *min..=*max)
                        .step_by(*step as f64)
                        .text(control.label.as_str()),
                );
                if response.changed() {
                    requested.push((control.name.clone(), ParamValue::Number(value)));
                }
            }
            Widget::Dropdown { options } => {
                let current = match control.displayed {
                    ParamValue::Choice(c) => options.iter().position(|o| o.value == c),
                    ParamValue::Number(_) => None,
                };
                let mut idx = current.unwrap_or(0);
                let changed = ui
                    .horizontal(|ui| {
                        ui.label(control.label.as_str());
                        egui::ComboBox::from_id_salt(&control.name)
                            .selected_text(options.get(idx).map_or("", |o| o.label.as_str()))
                            .show_index(ui, &mut idx, options.len(), |i| options[i].label.clone())
                            .changed()
                    })
                    .inner;
                if changed {
                    if let Some(option) = options.get(idx) {
                        requested.push((control.name.clone(), ParamValue::Choice(option.value)));
                    }
                }
            }
        }
    }

    requested
        .into_iter()
        .filter_map(|(name, value)| panel.interact(&name, value).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;

    fn store() -> ParameterStore {
        ParameterStore::from_parameters(vec![
            Parameter::range("elasticity", "Elasticity", 0.8, 0.0, 1.0, 0.05),
            Parameter::options(
                "num_springs",
                "Number of Springs",
                2,
                &[("1 Spring", 1), ("2 Springs", 2), ("3 Springs", 3)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_bind_mirrors_bounds() {
        let store = store();
        let panel = ControlPanel::bind(&store);
        assert_eq!(panel.len(), 2);
        assert_eq!(
            panel.controls()[0].widget(),
            &Widget::Slider {
                min: 0.0,
                max: 1.0,
                step: 0.05
            }
        );
        match panel.controls()[1].widget() {
            Widget::Dropdown { options } => assert_eq!(options.len(), 3),
            other => panic!("expected dropdown, got {:?}", other),
        }
        assert!(panel.is_synchronized(&store));
    }

    #[test]
    fn test_slider_snaps_to_step() {
        let mut panel = ControlPanel::bind(&store());
        let change = panel.interact("elasticity", 0.63).unwrap();
        match change.value {
            ParamValue::Number(v) => assert!((v - 0.65).abs() < 1e-5),
            other => panic!("expected number, got {:?}", other),
        }
        let change = panel.interact("elasticity", 7.0).unwrap();
        assert_eq!(change.value, ParamValue::Number(1.0));
    }

    #[test]
    fn test_dropdown_rejects_unknown_option() {
        let mut panel = ControlPanel::bind(&store());
        assert!(panel.interact("num_springs", 3).is_ok());
        assert!(matches!(
            panel.interact("num_springs", 4),
            Err(ParamError::NotAnOption { value: 4, .. })
        ));
        assert_eq!(panel.control("num_springs").unwrap().displayed(), ParamValue::Choice(3));
    }

    #[test]
    fn test_resynchronize_after_programmatic_set() {
        let mut store = store();
        let mut panel = ControlPanel::bind(&store);
        store.set("elasticity", 0.25).unwrap();
        assert!(!panel.is_synchronized(&store));
        panel.resynchronize(&store);
        assert!(panel.is_synchronized(&store));
        assert_eq!(panel.control("elasticity").unwrap().displayed(), ParamValue::Number(0.25));
    }
}
