use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Descriptive metadata for one feeder: its substation, head transformer,
/// headnode bus, and source impedances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeederMetadata {
    pub name: Option<String>,
    pub substation_name: Option<String>,
    pub feeder_name: Option<String>,
    pub drop: bool,
    /// Nominal voltage in volts.
    pub nominal_voltage: Option<f64>,
    /// The bus directly downstream of the substation transformer.
    pub headnode: Option<String>,
    /// Substation bus name.
    pub substation: Option<String>,
    /// Substation transformer name.
    pub transformer: Option<String>,
    pub positive_sequence_impedance: Option<Complex64>,
    pub zero_sequence_impedance: Option<Complex64>,
    pub negative_sequence_impedance: Option<Complex64>,
}

impl FeederMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_substation(mut self, substation: impl Into<String>) -> Self {
        self.substation = Some(substation.into());
        self
    }
}
