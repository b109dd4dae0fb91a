//! On-screen readouts.
//!
//! Per-tick hooks write named values here; the host reads them whenever it
//! redraws. Nothing is pushed to the UI.

use std::fmt;

/// One line of the readout panel.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub label: String,
    pub value: f32,
    pub unit: &'static str,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}: {:.2}", self.label, self.value)
        } else {
            write!(f, "{}: {:.2} {}", self.label, self.value, self.unit)
        }
    }
}

/// Ordered set of readings, keyed by label.
#[derive(Clone, Debug, Default)]
pub struct Telemetry {
    readings: Vec<Reading>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a reading. First insertion fixes its position.
    pub fn set(&mut self, label: &str, value: f32, unit: &'static str) {
        if let Some(r) = self.readings.iter_mut().find(|r| r.label == label) {
            r.value = value;
            r.unit = unit;
        } else {
            self.readings.push(Reading {
                label: label.to_string(),
                value,
                unit,
            });
        }
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.readings.iter().find(|r| r.label == label).map(|r| r.value)
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_order() {
        let mut t = Telemetry::new();
        t.set("Current Velocity", 5.0, "m/s");
        t.set("Distance Traveled", 0.0, "m");
        t.set("Current Velocity", 6.0, "m/s");
        assert_eq!(t.readings().len(), 2);
        assert_eq!(t.readings()[0].label, "Current Velocity");
        assert_eq!(t.get("Current Velocity"), Some(6.0));
        assert_eq!(t.readings()[0].to_string(), "Current Velocity: 6.00 m/s");
    }
}
