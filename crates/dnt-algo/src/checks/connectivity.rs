//! Every load must be energized by exactly one source.

use std::collections::HashSet;

use petgraph::visit::Bfs;

use dnt_core::{Diagnostics, DntResult, Store};

use super::{switched_network, CheckOutcome};

/// Compute the reachable node set of every power source over the switched
/// undirected view, then require each load's connecting element to fall in
/// exactly one of them. Zero sets means a dead load; two or more means the
/// model parallels its sources.
pub fn check_loads_connected(store: &Store, source: &str) -> DntResult<CheckOutcome> {
    let net = switched_network(store, source)?;
    let mut diag = Diagnostics::new();

    let sources: Vec<(String, String)> = store
        .sources()
        .filter(|s| !s.drop)
        .filter_map(|s| Some((s.name.clone()?, s.connecting_element.clone()?)))
        .collect();

    if sources.is_empty() {
        diag.add_error("connectivity", "model has no power source");
        return Ok(CheckOutcome::from_diagnostics(diag));
    }

    let g = net.undirected();
    let mut reachable: Vec<(String, HashSet<String>)> = Vec::with_capacity(sources.len());
    for (name, bus) in &sources {
        let mut set = HashSet::new();
        match net.node_index(bus) {
            Some(start) => {
                let mut bfs = Bfs::new(g, start);
                while let Some(idx) = bfs.next(g) {
                    set.insert(g[idx].clone());
                }
            }
            None => diag.add_error_with_entity(
                "connectivity",
                &format!("source connecting element '{bus}' is not in the graph"),
                name,
            ),
        }
        reachable.push((name.clone(), set));
    }

    for load in store.loads().filter(|l| !l.drop) {
        let Some(load_name) = load.name.as_deref() else {
            continue;
        };
        let Some(bus) = load.connecting_element.as_deref() else {
            diag.add_error_with_entity("connectivity", "load has no connecting element", load_name);
            continue;
        };
        let feeding: Vec<&str> = reachable
            .iter()
            .filter(|(_, set)| set.contains(bus))
            .map(|(name, _)| name.as_str())
            .collect();
        match feeding.len() {
            0 => diag.add_error_with_entity(
                "connectivity",
                &format!("load at '{bus}' is not reachable from any source"),
                load_name,
            ),
            1 => {}
            _ => diag.add_error_with_entity(
                "connectivity",
                &format!("load at '{bus}' is fed by multiple sources: {}", feeding.join(", ")),
                load_name,
            ),
        }
    }

    Ok(CheckOutcome::from_diagnostics(diag))
}
