use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::model::ConnectionType;
use crate::phase::Phase;

/// Per-phase bank of a capacitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseCapacitor {
    pub phase: Option<Phase>,
    /// Reactive power in vars.
    pub var: Option<f64>,
    /// Switched bank flag.
    pub switch: bool,
    /// Soft-deletion marker.
    pub drop: bool,
}

impl PhaseCapacitor {
    pub fn new(phase: Phase, var: f64) -> Self {
        Self {
            phase: Some(phase),
            var: Some(var),
            ..Self::default()
        }
    }
}

/// A shunt capacitor bank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capacitor {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub connecting_element: Option<String>,
    pub phase_capacitors: Vec<PhaseCapacitor>,
    pub connection_type: Option<ConnectionType>,
    /// Nominal voltage in volts.
    pub nominal_voltage: Option<f64>,
    /// Control mode label (e.g. "voltage", "currentFlow").
    pub mode: Option<String>,
    pub delay: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub pt_phase: Option<Phase>,
    /// Element whose measurement drives the control.
    pub measuring_element: Option<String>,
}

impl Capacitor {
    pub fn new(name: impl Into<String>, connecting_element: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            connecting_element: Some(connecting_element.into()),
            ..Self::default()
        }
    }

    pub fn with_phase_capacitor(mut self, phase: Phase, var: f64) -> Self {
        self.phase_capacitors.push(PhaseCapacitor::new(phase, var));
        self
    }

    /// Ordered phases of the non-dropped banks.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self
            .phase_capacitors
            .iter()
            .filter(|pc| !pc.drop)
            .filter_map(|pc| pc.phase)
            .collect();
        phases.sort();
        phases.dedup();
        phases
    }
}

/// A power source: the substation swing bus (`is_sourcebus`) or a local
/// injector such as PV.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerSource {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub connecting_element: Option<String>,
    /// Nominal line-to-line voltage in volts.
    pub nominal_voltage: Option<f64>,
    /// Source angle in degrees.
    pub phase_angle: Option<f64>,
    /// Rated power in volt-amperes.
    pub rated_power: Option<f64>,
    pub phases: Vec<Phase>,
    pub positive_sequence_impedance: Option<Complex64>,
    pub zero_sequence_impedance: Option<Complex64>,
    pub negative_sequence_impedance: Option<Complex64>,
    /// Distinguishes the swing bus from local injectors.
    pub is_sourcebus: bool,
}

impl PowerSource {
    pub fn new(name: impl Into<String>, connecting_element: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            connecting_element: Some(connecting_element.into()),
            ..Self::default()
        }
    }

    pub fn as_sourcebus(mut self) -> Self {
        self.is_sourcebus = true;
        self
    }

    pub fn with_nominal_voltage(mut self, volts: f64) -> Self {
        self.nominal_voltage = Some(volts);
        self
    }
}
