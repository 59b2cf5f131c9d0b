use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::model::Position;

/// A bus in the distribution network.
///
/// Nodes are the endpoints every `from_element` / `to_element` /
/// `connecting_element` reference resolves to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    /// Soft-deletion marker; dropped entities are skipped by all consumers.
    pub drop: bool,
    /// Ordered phase set present at this bus.
    pub phases: Vec<Phase>,
    /// Nominal line-to-line voltage in volts.
    pub nominal_voltage: Option<f64>,
    /// Geographic positions (long, lat, elevation).
    pub positions: Vec<Position>,
    /// Marks the bus where a feeder attaches to its substation.
    pub is_substation_connection: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the phase list.
    pub fn with_phases(mut self, phases: &[Phase]) -> Self {
        self.phases = phases.to_vec();
        self
    }

    /// Set the nominal voltage in volts.
    pub fn with_nominal_voltage(mut self, volts: f64) -> Self {
        self.nominal_voltage = Some(volts);
        self
    }

    /// Append a geographic position.
    pub fn with_position(mut self, long: f64, lat: f64, elevation: f64) -> Self {
        self.positions.push(Position {
            long,
            lat,
            elevation,
        });
        self
    }
}
