//! Radial service: exactly one simple path from the source to each load.

use petgraph::algo::all_simple_paths;
use petgraph::graph::NodeIndex;

use dnt_core::{Diagnostics, DntResult, Store};

use super::{switched_network, CheckOutcome};

/// Enumerate simple paths from `source` to every non-dropped load over
/// the switched undirected view, stopping at two. Zero paths means the
/// load is cut off; two or more means a loop feeds it from both sides.
pub fn check_unique_path(store: &Store, source: &str) -> DntResult<CheckOutcome> {
    let net = switched_network(store, source)?;
    let mut diag = Diagnostics::new();
    let g = net.undirected();

    let Some(start) = net.node_index(source) else {
        diag.add_error("topology", &format!("source '{source}' is not in the graph"));
        return Ok(CheckOutcome::from_diagnostics(diag));
    };

    for load in store.loads().filter(|l| !l.drop) {
        let Some(load_name) = load.name.as_deref() else {
            continue;
        };
        let Some(target) = net.node_index(load_name) else {
            diag.add_error_with_entity("topology", "load is not in the graph", load_name);
            continue;
        };
        let paths = count_paths(g, start, target, 2);
        match paths {
            0 => diag.add_error_with_entity(
                "topology",
                &format!("no path from '{source}' to load"),
                load_name,
            ),
            1 => {}
            _ => diag.add_error_with_entity(
                "topology",
                &format!("multiple paths from '{source}' to load"),
                load_name,
            ),
        }
    }

    Ok(CheckOutcome::from_diagnostics(diag))
}

fn count_paths(
    g: &petgraph::Graph<String, dnt_core::EdgeAttrs, petgraph::Undirected>,
    from: NodeIndex,
    to: NodeIndex,
    cap: usize,
) -> usize {
    all_simple_paths::<Vec<NodeIndex>, _>(g, from, to, 0, None)
        .take(cap)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, Load, Node, Phase};

    fn radial_store() -> Store {
        let mut store = Store::new();
        for name in ["sourcebus", "n1", "n2"] {
            store.add(Node::new(name));
        }
        store.add(
            Line::new("l1", "sourcebus", "n1")
                .with_length(100.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.add(
            Line::new("l2", "n1", "n2")
                .with_length(100.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.add(Load::new("load_2", "n2").with_phase_load(Phase::A, 1000.0, 0.0));
        store
    }

    #[test]
    fn test_radial_passes() {
        let mut store = radial_store();
        store.set_names().unwrap();
        let outcome = check_unique_path(&store, "sourcebus").unwrap();
        assert!(outcome.passed, "{}", outcome.diagnostics);
    }

    #[test]
    fn test_parallel_feed_fails() {
        let mut store = radial_store();
        // Second route sourcebus -> n2 closes a loop around the load
        store.add(
            Line::new("l3", "sourcebus", "n2")
                .with_length(100.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.set_names().unwrap();
        let outcome = check_unique_path(&store, "sourcebus").unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.diagnostics.error_count(), 1);
    }

    #[test]
    fn test_severed_load_fails() {
        let mut store = radial_store();
        store.add(Load::new("load_x", "orphan"));
        store.add(Node::new("orphan"));
        store.set_names().unwrap();
        let outcome = check_unique_path(&store, "sourcebus").unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn test_open_switch_breaks_loop() {
        let mut store = radial_store();
        let mut tie = Line::new("tie", "sourcebus", "n2")
            .with_wires(&[Phase::A, Phase::B, Phase::C])
            .as_switch();
        for wire in &mut tie.wires {
            wire.is_open = true;
        }
        store.add(tie);
        store.set_names().unwrap();
        let outcome = check_unique_path(&store, "sourcebus").unwrap();
        assert!(outcome.passed, "{}", outcome.diagnostics);
    }
}
