use serde::{Deserialize, Serialize};

use crate::model::{ConnectionType, Position};
use crate::phase::Phase;

/// Load model discriminants, following the interchange convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadModel {
    ConstantPower = 1,
    ConstantImpedance = 2,
    ConstantCurrent = 5,
    Zip = 8,
}

/// Per-phase demand on a load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseLoad {
    pub phase: Option<Phase>,
    /// Active power in watts.
    pub p: Option<f64>,
    /// Reactive power in vars.
    pub q: Option<f64>,
    pub model: Option<LoadModel>,
    /// ZIP fractions for active power; meaningful only when `use_zip`.
    pub ppercentpower: Option<f64>,
    pub ppercentcurrent: Option<f64>,
    pub ppercentimpedance: Option<f64>,
    /// ZIP fractions for reactive power.
    pub qpercentpower: Option<f64>,
    pub qpercentcurrent: Option<f64>,
    pub qpercentimpedance: Option<f64>,
    pub use_zip: bool,
    /// Soft-deletion marker.
    pub drop: bool,
}

impl PhaseLoad {
    pub fn new(phase: Phase, p: f64, q: f64) -> Self {
        Self {
            phase: Some(phase),
            p: Some(p),
            q: Some(q),
            model: Some(LoadModel::ConstantPower),
            ..Self::default()
        }
    }
}

/// A load attached to a bus through `connecting_element`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Load {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    pub connecting_element: Option<String>,
    pub phase_loads: Vec<PhaseLoad>,
    pub connection_type: Option<ConnectionType>,
    /// Nominal voltage in volts.
    pub nominal_voltage: Option<f64>,
    pub num_users: Option<f64>,
    /// Center-tap split fractions; the three must sum to 1.
    pub center_tap_perct_1_n: Option<f64>,
    pub center_tap_perct_n_2: Option<f64>,
    pub center_tap_perct_1_2: Option<f64>,
    /// Filled by the center-tap repair pass.
    pub upstream_transformer_name: Option<String>,
    pub positions: Vec<Position>,
}

impl Load {
    pub fn new(name: impl Into<String>, connecting_element: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            connecting_element: Some(connecting_element.into()),
            ..Self::default()
        }
    }

    pub fn with_phase_load(mut self, phase: Phase, p: f64, q: f64) -> Self {
        self.phase_loads.push(PhaseLoad::new(phase, p, q));
        self
    }

    /// Ordered phases of the non-dropped phase loads.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self
            .phase_loads
            .iter()
            .filter(|pl| !pl.drop)
            .filter_map(|pl| pl.phase)
            .collect();
        phases.sort();
        phases.dedup();
        phases
    }

    /// Aggregate (P, Q) over non-dropped phase loads, in watts/vars.
    pub fn total_pq(&self) -> (f64, f64) {
        self.phase_loads
            .iter()
            .filter(|pl| !pl.drop)
            .fold((0.0, 0.0), |(p, q), pl| {
                (p + pl.p.unwrap_or(0.0), q + pl.q.unwrap_or(0.0))
            })
    }

    /// The three center-tap split fractions must sum to 1 when all present.
    pub fn center_tap_fractions_consistent(&self) -> bool {
        match (
            self.center_tap_perct_1_n,
            self.center_tap_perct_n_2,
            self.center_tap_perct_1_2,
        ) {
            (Some(a), Some(b), Some(c)) => (a + b + c - 1.0).abs() < 1e-6,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pq_skips_dropped() {
        let mut load = Load::new("load_634", "634")
            .with_phase_load(Phase::A, 160_000.0, 110_000.0)
            .with_phase_load(Phase::B, 120_000.0, 90_000.0);
        assert_eq!(load.total_pq(), (280_000.0, 200_000.0));
        load.phase_loads[1].drop = true;
        assert_eq!(load.total_pq(), (160_000.0, 110_000.0));
        assert_eq!(load.phases(), vec![Phase::A]);
    }

    #[test]
    fn test_center_tap_fractions() {
        let mut load = Load::new("ct_load", "tn_1");
        assert!(load.center_tap_fractions_consistent());
        load.center_tap_perct_1_n = Some(0.5);
        load.center_tap_perct_n_2 = Some(0.3);
        load.center_tap_perct_1_2 = Some(0.2);
        assert!(load.center_tap_fractions_consistent());
        load.center_tap_perct_1_2 = Some(0.4);
        assert!(!load.center_tap_fractions_consistent());
    }
}
