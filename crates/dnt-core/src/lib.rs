//! # dnt-core: Distribution Network Modeling Core
//!
//! Provides the uniform in-memory model for heterogeneous distribution
//! feeder entities and the graph views analyses run over.
//!
//! ## Design Philosophy
//!
//! A model is a [`Store`] of tagged entities ([`Entity`]): buses, lines,
//! transformers, regulators, loads, capacitors, sources, and feeder
//! metadata. Entities reference each other by string name rather than by
//! pointer; the store's name index is rebuilt by [`Store::set_names`] and
//! soft deletion is a `drop` flag every consumer honours.
//!
//! The [`network::Network`] lifts the store into two petgraph views:
//! - an **undirected multigraph** for connectivity and loop analysis, and
//! - a **directed graph** oriented by BFS from a chosen source for
//!   upstream/downstream reasoning.
//!
//! An epoch counter couples the two: any store mutation stales previously
//! built graphs, and graph queries fail with `StaleGraph` until rebuilt.
//!
//! ## Quick Start
//!
//! ```rust
//! use dnt_core::*;
//!
//! let mut store = Store::new();
//! store.add(Node::new("sourcebus").with_nominal_voltage(12470.0));
//! store.add(Node::new("650"));
//! store.add(
//!     Line::new("l_650", "sourcebus", "650")
//!         .with_length(500.0)
//!         .with_wires(&[Phase::A, Phase::B, Phase::C]),
//! );
//! store.set_names().unwrap();
//!
//! let mut net = network::Network::new();
//! net.build(&store, "sourcebus").unwrap();
//! net.set_attributes(&store).unwrap();
//! assert!(net.is_built());
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Typed entity records and the tagged [`Entity`] union
//! - [`store`] - The insertion-ordered container with name index and epoch
//! - [`network`] - Undirected/directed graph views and traversal queries
//! - [`diagnostics`] - Warning/error collection for checks and passes
//! - [`units`] - Centralized length-unit conversions
//!
//! ## Integration with dnt-algo and dnt-io
//!
//! The dnt-algo crate runs consistency checks and repair passes against a
//! store; dnt-io defines the reader/writer contracts format adapters
//! implement.

pub mod diagnostics;
pub mod error;
pub mod model;
pub mod network;
pub mod phase;
pub mod store;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{DntError, DntResult};
pub use model::{
    Capacitor, ConnectionType, Entity, EntityKind, FeederMetadata, Line, LineType, Load,
    LoadModel, Node, PhaseCapacitor, PhaseLoad, PhaseWinding, Position, PowerSource,
    PowerTransformer, Regulator, VoltageType, Winding, Wire,
};
pub use network::{EdgeAttrs, Network};
pub use phase::Phase;
pub use store::Store;
pub use units::LengthUnit;
