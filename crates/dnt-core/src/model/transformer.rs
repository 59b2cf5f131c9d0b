use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Winding connection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Wye
    Y,
    /// Delta
    D,
    /// Zigzag
    Z,
}

/// Marks a winding as the high side or the low side.
///
/// The discriminants follow the interchange convention (primary = 0,
/// secondary = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoltageType {
    Primary = 0,
    Secondary = 2,
}

/// Per-phase specialization of a winding: one tap position and one set of
/// line-drop-compensator values per phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseWinding {
    pub phase: Option<Phase>,
    pub tap_position: Option<f64>,
    pub compensator_r: Option<f64>,
    pub compensator_x: Option<f64>,
}

impl PhaseWinding {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }
}

/// A transformer winding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Winding {
    pub connection_type: Option<ConnectionType>,
    /// Nominal line-to-line voltage in volts.
    pub nominal_voltage: Option<f64>,
    /// Rated power in volt-amperes.
    pub rated_power: Option<f64>,
    /// Winding resistance in percent.
    pub resistance: Option<f64>,
    pub voltage_type: Option<VoltageType>,
    pub is_grounded: bool,
    pub phase_windings: Vec<PhaseWinding>,
}

impl Winding {
    pub fn new(nominal_voltage: f64, phases: &[Phase]) -> Self {
        Self {
            nominal_voltage: Some(nominal_voltage),
            phase_windings: phases.iter().map(|p| PhaseWinding::new(*p)).collect(),
            ..Self::default()
        }
    }

    pub fn with_rated_power(mut self, volt_amperes: f64) -> Self {
        self.rated_power = Some(volt_amperes);
        self
    }

    pub fn with_voltage_type(mut self, voltage_type: VoltageType) -> Self {
        self.voltage_type = Some(voltage_type);
        self
    }

    /// Ordered, deduplicated phases of this winding.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self.phase_windings.iter().filter_map(|pw| pw.phase).collect();
        phases.sort();
        phases.dedup();
        phases
    }
}

/// A two- or three-winding power transformer between two buses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerTransformer {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub from_element: Option<String>,
    pub to_element: Option<String>,
    /// Single-phase service transformer with a grounded secondary midpoint.
    pub is_center_tap: bool,
    /// Substation transformer; roots a feeder partition.
    pub is_substation: bool,
    /// No-load loss in percent of rated power.
    pub noload_loss: Option<f64>,
    /// Phase displacement in degrees.
    pub phase_shift: Option<f64>,
    /// Load loss in percent of rated power.
    pub loadloss: Option<f64>,
    /// Normal rating in kVA.
    pub normhkva: Option<f64>,
    /// Pairwise winding reactances; length must be C(windings, 2).
    pub reactances: Vec<f64>,
    pub windings: Vec<Winding>,
}

impl PowerTransformer {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            from_element: Some(from.into()),
            to_element: Some(to.into()),
            ..Self::default()
        }
    }

    pub fn with_windings(mut self, windings: Vec<Winding>) -> Self {
        self.windings = windings;
        self
    }

    pub fn as_substation(mut self) -> Self {
        self.is_substation = true;
        self
    }

    pub fn as_center_tap(mut self) -> Self {
        self.is_center_tap = true;
        self
    }

    /// `reactances` must carry one entry per unordered winding pair.
    pub fn reactances_consistent(&self) -> bool {
        let n = self.windings.len();
        self.reactances.is_empty() || self.reactances.len() == n * n.saturating_sub(1) / 2
    }

    /// Non-neutral phases of the first (high-side) winding.
    pub fn primary_phases(&self) -> Vec<Phase> {
        self.windings
            .first()
            .map(|w| w.phases().into_iter().filter(|p| !p.is_neutral()).collect())
            .unwrap_or_default()
    }

    /// The winding marked `Primary`, falling back to the first winding.
    pub fn primary_winding(&self) -> Option<&Winding> {
        self.windings
            .iter()
            .find(|w| w.voltage_type == Some(VoltageType::Primary))
            .or_else(|| self.windings.first())
    }

    /// The smallest defined winding voltage, i.e. the low-side voltage.
    pub fn min_winding_voltage(&self) -> Option<f64> {
        self.windings
            .iter()
            .filter_map(|w| w.nominal_voltage)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }
}

/// A voltage regulator: either standalone between two buses, or a tap
/// control attached to an existing transformer winding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regulator {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub from_element: Option<String>,
    pub to_element: Option<String>,
    pub windings: Vec<Winding>,
    /// Name of the transformer this regulator controls, when not standalone.
    pub connected_transformer: Option<String>,
    /// 1-based winding ordinal on the connected transformer.
    pub connected_winding: Option<usize>,
    pub bandwidth: Option<f64>,
    pub bandcenter: Option<f64>,
    pub highstep: Option<i32>,
    pub lowstep: Option<i32>,
    pub pt_ratio: Option<f64>,
    pub ct_ratio: Option<f64>,
    pub ct_prim: Option<f64>,
    pub pt_phase: Option<Phase>,
    pub setpoint: Option<f64>,
    pub ltc: bool,
    pub delay: Option<f64>,
}

impl Regulator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True for a regulator wired between two buses rather than riding on a
    /// transformer.
    pub fn is_standalone(&self) -> bool {
        self.connected_transformer.is_none()
            && self.from_element.is_some()
            && self.to_element.is_some()
    }
}
