//! # dnt-io: Model I/O Contracts & Reference Adapter
//!
//! Defines what a format adapter owes the rest of the toolkit:
//!
//! - [`Reader`] populates a [`dnt_core::Store`] and finishes with
//!   `set_names()`, returning a [`ReadSummary`] of per-kind counts and
//!   diagnostics.
//! - [`Writer`] consumes an indexed store and honours soft deletion:
//!   dropped entities, wires, and phase components never reach the sink.
//! - [`validate_references`] runs after a read and reports dangling
//!   name references.
//!
//! The [`json`] module is the reference adapter: a tagged-entity JSON
//! document used by round-trip tests and as the template new adapters
//! copy. Vendor formats live outside this workspace.
//!
//! ## Quick Start
//!
//! ```rust
//! use dnt_core::{Node, Phase, Line, Store};
//! use dnt_io::{JsonReader, JsonWriter, Reader, Writer};
//!
//! let mut store = Store::new();
//! store.add(Node::new("650"));
//! store.add(Node::new("632"));
//! store.add(Line::new("l1", "650", "632").with_wires(&[Phase::A]));
//! store.set_names().unwrap();
//!
//! let mut buffer = Vec::new();
//! JsonWriter::new(&mut buffer).write(&store).unwrap();
//!
//! let mut restored = Store::new();
//! let summary = JsonReader::new(buffer.as_slice()).read(&mut restored).unwrap();
//! assert_eq!(summary.counts.total(), 3);
//! ```

pub mod contract;
pub mod json;
pub mod validate;

pub use contract::{EntityCounts, ReadSummary, Reader, WriteSummary, Writer};
pub use json::{JsonReader, JsonWriter};
pub use validate::validate_references;

// Unit conversion travels with the I/O surface; adapters should not
// re-derive factors.
pub use dnt_core::units::LengthUnit;
