//! # dnt-algo: Analyses and Repairs for Distribution Network Models
//!
//! Everything here operates on a [`dnt_core::Store`] and the graph views
//! built from it, in three groups:
//!
//! - [`checks`] - read-only consistency checks (loops, connectivity,
//!   unique paths, winding phase agreement, load-to-source phase paths),
//!   each returning a pass/fail plus diagnostics naming the offenders.
//! - [`repairs`] - mutating repair passes behind the [`repairs::Modifier`]
//!   facade: voltage propagation, feeder partitioning, headnode matching,
//!   center-tap re-phasing, transformer orientation and sizing fixes, and
//!   load coordinates.
//! - [`line_params`] - per-length impedance matrices from conductor
//!   geometry via the modified Carson equations and Kron reduction.
//!
//! ## Example
//!
//! ```rust
//! use dnt_algo::checks::check_loops;
//! use dnt_algo::repairs::Modifier;
//! use dnt_algo::test_utils::ieee13_feeder;
//!
//! let mut store = ieee13_feeder();
//! assert!(check_loops(&store, "sourcebus").unwrap().passed);
//!
//! let modifier = Modifier::new("sourcebus");
//! let outcome = modifier.set_nominal_voltages(&mut store).unwrap();
//! assert!(outcome.changed);
//! ```

pub mod checks;
pub mod line_params;
pub mod repairs;
pub mod test_utils;

pub use checks::{
    check_loads_connected, check_loops, check_matched_phases, check_transformer_phase_path,
    check_unique_path, CheckOutcome,
};
pub use line_params::{mutual_impedance, self_impedance, sequence_to_phase, LineParameters};
pub use repairs::{
    center_tap_load_preprocessing, feeder_preprocessing, fix_transformer_phase_path,
    fix_undersized_transformers, set_feeder_headnodes, set_load_coordinates,
    set_nominal_voltages, FeederPartition, Modifier, PassOutcome,
};
