//! Read-only consistency checks over the model and its graph views.
//!
//! Every check builds (or accepts) a network, removes open switches, and
//! answers a boolean plus a structured report naming offending entities.
//! Checks never mutate the store and may run in any order.

mod connectivity;
mod loops;
mod matched_phases;
mod transformer_phase_path;
mod unique_path;

pub use connectivity::check_loads_connected;
pub use loops::check_loops;
pub use matched_phases::check_matched_phases;
pub use transformer_phase_path::check_transformer_phase_path;
pub use unique_path::check_unique_path;

use serde::Serialize;

use dnt_core::{Diagnostics, DntResult, Network, Store};

/// Result of one consistency check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckOutcome {
    /// True when no violation was found.
    pub passed: bool,
    /// Violations and context, one issue per offender.
    pub diagnostics: Diagnostics,
}

impl CheckOutcome {
    pub fn passing() -> Self {
        Self {
            passed: true,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Passed only if no errors were collected.
    pub fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            passed: !diagnostics.has_errors(),
            diagnostics,
        }
    }
}

/// Build the switched network every check runs against: attributes lifted
/// and open switches removed.
pub(crate) fn switched_network(store: &Store, source: &str) -> DntResult<Network> {
    let mut net = Network::new();
    net.build(store, source)?;
    net.set_attributes(store)?;
    net.remove_open_switches(store)?;
    Ok(net)
}
