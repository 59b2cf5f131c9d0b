use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Physical construction of a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Overhead,
    Underground,
    Triplex,
}

/// A single conductor on a line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wire {
    pub phase: Option<Phase>,
    /// Geometric mean radius in meters.
    pub gmr: Option<f64>,
    /// Resistance per meter, ohms.
    pub resistance: Option<f64>,
    /// Conductor diameter in meters.
    pub diameter: Option<f64>,
    /// Rated ampacity in amperes.
    pub ampacity: Option<f64>,
    /// Emergency ampacity in amperes.
    pub emergency_ampacity: Option<f64>,
    /// Horizontal position in the cross-section, meters.
    pub x: Option<f64>,
    /// Vertical position in the cross-section, meters.
    pub y: Option<f64>,
    /// Open switch blade on this conductor.
    pub is_open: bool,
    /// Soft-deletion marker.
    pub drop: bool,
}

impl Wire {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn open(mut self) -> Self {
        self.is_open = true;
        self
    }

    /// True when the wire carries a phase conductor (not neutral, not dropped).
    pub fn is_phase_conductor(&self) -> bool {
        !self.drop && self.phase.map(|p| !p.is_neutral()).unwrap_or(false)
    }
}

/// A series element between two buses: conductor segment, switch, fuse,
/// recloser, or breaker.
///
/// Role flags are not mutually exclusive; a switch modeled with explicit
/// conductor data keeps both its wires and `is_switch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Line {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub from_element: Option<String>,
    pub to_element: Option<String>,
    /// Length in meters.
    pub length: Option<f64>,
    /// Nominal line-to-line voltage in volts.
    pub nominal_voltage: Option<f64>,
    pub line_type: Option<LineType>,
    pub is_switch: bool,
    pub is_fuse: bool,
    pub is_recloser: bool,
    pub is_breaker: bool,
    pub is_substation: bool,
    pub wires: Vec<Wire>,
    /// Per-meter phase impedance matrix, rank = non-dropped non-neutral wires.
    pub impedance_matrix: Option<Vec<Vec<Complex64>>>,
    /// Per-meter phase capacitance matrix, same rank as the impedance matrix.
    pub capacitance_matrix: Option<Vec<Vec<Complex64>>>,
    /// Linecode label carried through from the source format.
    pub nameclass: Option<String>,
}

impl Line {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            from_element: Some(from.into()),
            to_element: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn with_length(mut self, meters: f64) -> Self {
        self.length = Some(meters);
        self
    }

    pub fn with_wires(mut self, phases: &[Phase]) -> Self {
        self.wires = phases.iter().map(|p| Wire::new(*p)).collect();
        self
    }

    pub fn as_switch(mut self) -> Self {
        self.is_switch = true;
        self
    }

    /// Ordered phases of the non-dropped wires, neutral included.
    pub fn wire_phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self
            .wires
            .iter()
            .filter(|w| !w.drop)
            .filter_map(|w| w.phase)
            .collect();
        phases.sort();
        phases.dedup();
        phases
    }

    /// Ordered phases of the non-dropped, non-neutral wires.
    pub fn phase_conductors(&self) -> Vec<Phase> {
        self.wire_phases()
            .into_iter()
            .filter(|p| !p.is_neutral())
            .collect()
    }

    /// True when any non-dropped wire is open.
    pub fn has_open_wire(&self) -> bool {
        self.wires.iter().any(|w| !w.drop && w.is_open)
    }

    /// Impedance-matrix rank must equal the phase-conductor count, and the
    /// capacitance matrix (when present) must match it.
    pub fn matrix_rank_consistent(&self) -> bool {
        let n_phase = self.phase_conductors().len();
        let z_ok = self
            .impedance_matrix
            .as_ref()
            .map(|m| m.len() == n_phase && m.iter().all(|row| row.len() == n_phase))
            .unwrap_or(true);
        let c_ok = self
            .capacitance_matrix
            .as_ref()
            .map(|m| m.len() == n_phase && m.iter().all(|row| row.len() == n_phase))
            .unwrap_or(true);
        z_ok && c_ok
    }
}
