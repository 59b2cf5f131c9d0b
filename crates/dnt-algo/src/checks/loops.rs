//! Loop detection: the network of closed segments must be a forest.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use dnt_core::{Diagnostics, DntResult, Network, Store};

use super::{switched_network, CheckOutcome};

/// Fail if any cycle survives once open switches are removed. Each cycle
/// is reported as the node sequence that closes it.
pub fn check_loops(store: &Store, source: &str) -> DntResult<CheckOutcome> {
    let net = switched_network(store, source)?;
    let cycles = find_cycles(&net);

    let mut diag = Diagnostics::new();
    for cycle in &cycles {
        diag.add_error("topology", &format!("loop detected: {}", cycle.join(" -> ")));
    }
    Ok(CheckOutcome::from_diagnostics(diag))
}

/// One fundamental cycle per non-tree edge of a BFS spanning forest,
/// as closed node-name sequences. Deterministic: roots and neighbors are
/// taken in name order.
fn find_cycles(net: &Network) -> Vec<Vec<String>> {
    let g = net.undirected();
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut tree_edges: HashSet<EdgeIndex> = HashSet::new();

    let mut roots: Vec<NodeIndex> = g.node_indices().collect();
    roots.sort_by(|a, b| g[*a].cmp(&g[*b]));

    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            let mut edges: Vec<_> = g.edges(node).collect();
            edges.sort_by(|a, b| {
                g[other_end(a, node)]
                    .cmp(&g[other_end(b, node)])
                    .then(a.id().cmp(&b.id()))
            });
            for edge in edges {
                let next = other_end(&edge, node);
                if visited.insert(next) {
                    parent.insert(next, node);
                    tree_edges.insert(edge.id());
                    queue.push_back(next);
                }
            }
        }
    }

    // Every edge outside the forest closes exactly one cycle: both
    // endpoint-to-root chains up to their lowest common ancestor.
    let chain = |mut node: NodeIndex| -> Vec<NodeIndex> {
        let mut c = vec![node];
        while let Some(&p) = parent.get(&node) {
            c.push(p);
            node = p;
        }
        c
    };

    let mut cycles = Vec::new();
    for edge in g.edge_references() {
        if tree_edges.contains(&edge.id()) {
            continue;
        }
        let (u, v) = (edge.source(), edge.target());
        if u == v {
            cycles.push(vec![g[u].clone(), g[u].clone()]);
            continue;
        }
        let cu = chain(u);
        let cv = chain(v);
        let depth_in_cu: HashMap<NodeIndex, usize> =
            cu.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let Some((i, j)) = cv
            .iter()
            .enumerate()
            .find_map(|(j, n)| depth_in_cu.get(n).map(|&i| (i, j)))
        else {
            continue;
        };
        let mut path: Vec<String> = cu[..=i].iter().map(|&n| g[n].clone()).collect();
        path.extend(cv[..j].iter().rev().map(|&n| g[n].clone()));
        path.push(g[u].clone());
        cycles.push(path);
    }

    cycles.sort();
    cycles.dedup();
    cycles
}

fn other_end<E: EdgeRef<NodeId = NodeIndex>>(edge: &E, node: NodeIndex) -> NodeIndex {
    if edge.source() == node {
        edge.target()
    } else {
        edge.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, Node, Phase};

    fn line(name: &str, from: &str, to: &str) -> Line {
        Line::new(name, from, to)
            .with_length(10.0)
            .with_wires(&[Phase::A, Phase::B, Phase::C])
    }

    #[test]
    fn test_radial_network_has_no_loops() {
        let mut store = Store::new();
        for name in ["src", "a", "b"] {
            store.add(Node::new(name));
        }
        store.add(line("l1", "src", "a"));
        store.add(line("l2", "a", "b"));
        store.set_names().unwrap();
        assert!(check_loops(&store, "src").unwrap().passed);
    }

    #[test]
    fn test_triangle_reports_one_cycle() {
        let mut store = Store::new();
        for name in ["src", "a", "b"] {
            store.add(Node::new(name));
        }
        store.add(line("l1", "src", "a"));
        store.add(line("l2", "a", "b"));
        store.add(line("l3", "b", "src"));
        store.set_names().unwrap();

        let outcome = check_loops(&store, "src").unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.diagnostics.error_count(), 1);
        let report = outcome.diagnostics.to_string();
        for node in ["src", "a", "b"] {
            assert!(report.contains(node), "{report}");
        }
    }

    #[test]
    fn test_parallel_edges_form_a_loop() {
        let mut store = Store::new();
        store.add(Node::new("src"));
        store.add(Node::new("a"));
        store.add(line("l1", "src", "a"));
        store.add(line("l2", "src", "a"));
        store.set_names().unwrap();

        let outcome = check_loops(&store, "src").unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.diagnostics.error_count(), 1);
    }
}
