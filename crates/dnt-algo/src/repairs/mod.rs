//! Mutating repair passes.
//!
//! Every pass follows the same protocol: call `set_names()` on the store,
//! build a network rooted at the configured source, compute a write plan
//! from the graph, then apply it through the store's mutable lookups.
//! Passes never write partial results on error, and any network built
//! before a pass ran is stale afterwards.

mod center_tap;
mod coordinates;
mod feeders;
mod transformers;
mod voltages;

pub use center_tap::center_tap_load_preprocessing;
pub use coordinates::set_load_coordinates;
pub use feeders::{feeder_preprocessing, set_feeder_headnodes};
pub use transformers::{fix_transformer_phase_path, fix_undersized_transformers};
pub use voltages::set_nominal_voltages;

use std::collections::HashSet;

use serde::Serialize;

use dnt_core::{Diagnostics, DntResult, EntityKind, Network, Store};

/// Result of one repair pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassOutcome {
    /// True when the pass wrote anything back.
    pub changed: bool,
    /// Issues encountered while planning or applying.
    pub diagnostics: Diagnostics,
}

/// One feeder partition produced by [`feeder_preprocessing`].
#[derive(Debug, Clone, Serialize)]
pub struct FeederPartition {
    /// The substation transformer rooting this feeder.
    pub transformer: String,
    /// The feeder label written into member entities.
    pub feeder_name: String,
    /// Entity names inside the partition.
    pub members: Vec<String>,
}

/// Bundles the repair passes behind verbs, carrying the source bus and
/// coordinate deltas they share.
#[derive(Debug, Clone)]
pub struct Modifier {
    source: String,
    pub delta_long: f64,
    pub delta_lat: f64,
    pub delta_elev: f64,
    feeder_partitions: Vec<FeederPartition>,
}

impl Modifier {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            delta_long: 0.1,
            delta_lat: 0.1,
            delta_elev: 0.0,
            feeder_partitions: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_nominal_voltages(&self, store: &mut Store) -> DntResult<PassOutcome> {
        voltages::set_nominal_voltages(store, &self.source)
    }

    /// Partition the model into feeders; the partitions stay available
    /// through [`Modifier::feeder_partitions`].
    pub fn feeder_preprocessing(&mut self, store: &mut Store) -> DntResult<PassOutcome> {
        let (outcome, partitions) = feeders::feeder_preprocessing(store, &self.source)?;
        self.feeder_partitions = partitions;
        Ok(outcome)
    }

    pub fn set_feeder_headnodes(&self, store: &mut Store) -> DntResult<PassOutcome> {
        feeders::set_feeder_headnodes(store, &self.source)
    }

    pub fn center_tap_load_preprocessing(&self, store: &mut Store) -> DntResult<PassOutcome> {
        center_tap::center_tap_load_preprocessing(store, &self.source)
    }

    pub fn fix_transformer_phase_path(&self, store: &mut Store) -> DntResult<PassOutcome> {
        transformers::fix_transformer_phase_path(store, &self.source)
    }

    pub fn fix_undersized_transformers(&self, store: &mut Store) -> DntResult<PassOutcome> {
        transformers::fix_undersized_transformers(store, &self.source)
    }

    pub fn set_load_coordinates(&self, store: &mut Store) -> DntResult<PassOutcome> {
        coordinates::set_load_coordinates(store, self.delta_long, self.delta_lat, self.delta_elev)
    }

    /// Partitions from the most recent `feeder_preprocessing` run.
    pub fn feeder_partitions(&self) -> &[FeederPartition] {
        &self.feeder_partitions
    }
}

/// `set_names()` plus a fresh network, the common preamble of every pass.
pub(crate) fn prepared_network(store: &mut Store, source: &str) -> DntResult<Network> {
    store.set_names()?;
    let mut net = Network::new();
    net.build(store, source)?;
    Ok(net)
}

/// Upstream walk from a bus toward the directed root.
#[derive(Debug, Default)]
pub(crate) struct UpstreamWalk {
    /// Line names between the bus and the first transformer (or the root
    /// when no transformer was met).
    pub lines_below: Vec<String>,
    /// Transformers met, nearest first, with the node on their load side.
    pub transformers: Vec<(String, String)>,
}

/// Follow predecessor edges from `bus` to the root, recording lines below
/// the first transformer and every transformer traversed. Stops quietly
/// on a cycle or a dead end.
pub(crate) fn walk_upstream(net: &Network, bus: &str) -> UpstreamWalk {
    let mut walk = UpstreamWalk::default();
    let mut current = bus.to_string();
    let mut guard = HashSet::new();

    while guard.insert(current.clone()) {
        let Some((pred, attrs)) = net.predecessor_edge(&current) else {
            break;
        };
        match attrs.equipment {
            EntityKind::PowerTransformer => {
                walk.transformers.push((attrs.equipment_name, current.clone()));
            }
            EntityKind::Line if walk.transformers.is_empty() => {
                walk.lines_below.push(attrs.equipment_name);
            }
            _ => {}
        }
        current = pred;
    }
    walk
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, Load, Node, Phase, PowerTransformer, Winding};

    #[test]
    fn test_walk_upstream_stops_lines_at_transformer() {
        let mut store = Store::new();
        for name in ["src", "n1", "n2", "n3"] {
            store.add(Node::new(name));
        }
        store.add(
            Line::new("l_hi", "src", "n1")
                .with_length(10.0)
                .with_wires(&[Phase::A]),
        );
        store.add(PowerTransformer::new("t1", "n1", "n2").with_windings(vec![
            Winding::new(7200.0, &[Phase::A]),
            Winding::new(240.0, &[Phase::A]),
        ]));
        store.add(
            Line::new("l_lo", "n2", "n3")
                .with_length(10.0)
                .with_wires(&[Phase::A]),
        );
        store.add(Load::new("ld", "n3").with_phase_load(Phase::A, 1000.0, 0.0));
        store.set_names().unwrap();

        let mut net = Network::new();
        net.build(&store, "src").unwrap();

        let walk = walk_upstream(&net, "n3");
        assert_eq!(walk.lines_below, vec!["l_lo".to_string()]);
        assert_eq!(
            walk.transformers,
            vec![("t1".to_string(), "n2".to_string())]
        );
    }

    #[test]
    fn test_modifier_defaults() {
        let modifier = Modifier::new("sourcebus");
        assert_eq!(modifier.source(), "sourcebus");
        assert_eq!(modifier.delta_long, 0.1);
        assert_eq!(modifier.delta_lat, 0.1);
        assert_eq!(modifier.delta_elev, 0.0);
        assert!(modifier.feeder_partitions().is_empty());
    }
}
