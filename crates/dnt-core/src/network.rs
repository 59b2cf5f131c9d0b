//! Graph views over a populated store.
//!
//! The network lifts the entity collection into two petgraph views: an
//! undirected multigraph for connectivity and a directed graph oriented by
//! breadth-first traversal from a user-chosen source for
//! upstream/downstream reasoning. Shunt entities (loads, capacitors,
//! sources) appear as leaf nodes linked to their connecting element by a
//! degenerate edge.
//!
//! Views are rebuilt from the store on demand. The network records the
//! store epoch at build time; queries after a store mutation fail with
//! [`DntError::StaleGraph`] until the caller rebuilds.
//!
//! Traversals are deterministic: neighbor order is lexicographic by node
//! name, so `bfs_order` produces the same edge sequence across runs.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction, Undirected};

use crate::diagnostics::Diagnostics;
use crate::error::{DntError, DntResult};
use crate::model::{Entity, EntityKind, Line, PowerTransformer, Regulator};
use crate::phase::Phase;
use crate::store::Store;

/// Equipment attributes lifted onto a graph edge.
///
/// `build` populates the identity fields; the extended fields stay at
/// their defaults ("unset") until [`Network::set_attributes`] runs.
#[derive(Debug, Clone)]
pub struct EdgeAttrs {
    /// Entity kind of the underlying equipment.
    pub equipment: EntityKind,
    /// Name of the underlying entity.
    pub equipment_name: String,
    /// Length in meters; 0 for transformers, regulators, and shunt links.
    pub length: f64,
    pub is_switch: bool,
    pub is_fuse: bool,
    pub is_recloser: bool,
    pub is_breaker: bool,
    pub is_substation: bool,
    /// Any non-dropped wire open.
    pub is_open: bool,
    /// Non-dropped wire phases for lines.
    pub phases: Vec<Phase>,
    /// Per-winding phase sets for transformers.
    pub winding_phases: Vec<Vec<Phase>>,
    pub nominal_voltage: Option<f64>,
}

impl EdgeAttrs {
    fn new(equipment: EntityKind, equipment_name: &str, length: f64) -> Self {
        Self {
            equipment,
            equipment_name: equipment_name.to_string(),
            length,
            is_switch: false,
            is_fuse: false,
            is_recloser: false,
            is_breaker: false,
            is_substation: false,
            is_open: false,
            phases: Vec::new(),
            winding_phases: Vec::new(),
            nominal_voltage: None,
        }
    }

    fn lift_line(&mut self, line: &Line) {
        self.is_switch = line.is_switch;
        self.is_fuse = line.is_fuse;
        self.is_recloser = line.is_recloser;
        self.is_breaker = line.is_breaker;
        self.is_substation = line.is_substation;
        self.is_open = line.has_open_wire();
        self.phases = line.wire_phases();
        self.nominal_voltage = line.nominal_voltage;
    }

    fn lift_transformer(&mut self, tx: &PowerTransformer) {
        self.is_substation = tx.is_substation;
        self.winding_phases = tx.windings.iter().map(|w| w.phases()).collect();
        self.nominal_voltage = tx.windings.first().and_then(|w| w.nominal_voltage);
    }

    fn lift_regulator(&mut self, reg: &Regulator) {
        self.winding_phases = reg.windings.iter().map(|w| w.phases()).collect();
        self.nominal_voltage = reg.windings.first().and_then(|w| w.nominal_voltage);
    }
}

/// The two graph views plus bookkeeping.
#[derive(Debug, Default)]
pub struct Network {
    un: Graph<String, EdgeAttrs, Undirected>,
    di: Graph<String, EdgeAttrs, Directed>,
    un_idx: HashMap<String, NodeIndex>,
    di_idx: HashMap<String, NodeIndex>,
    source: String,
    is_built: bool,
    attrs_set: bool,
    build_epoch: u64,
    bfs_edges: Vec<(String, String)>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `build` has completed.
    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// The source node this network is rooted at.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The undirected connectivity view.
    pub fn undirected(&self) -> &Graph<String, EdgeAttrs, Undirected> {
        &self.un
    }

    /// The directed view rooted at the source.
    pub fn directed(&self) -> &Graph<String, EdgeAttrs, Directed> {
        &self.di
    }

    /// Node index in the undirected view.
    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.un_idx.get(name).copied()
    }

    /// Node index in the directed view.
    pub fn directed_index(&self, name: &str) -> Option<NodeIndex> {
        self.di_idx.get(name).copied()
    }

    fn ensure_fresh(&self, store: &Store) -> DntResult<()> {
        if !self.is_built {
            return Err(DntError::Network("network has not been built".into()));
        }
        if store.epoch() != self.build_epoch {
            return Err(DntError::StaleGraph {
                build_epoch: self.build_epoch,
                store_epoch: store.epoch(),
            });
        }
        Ok(())
    }

    fn ensure_un_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.un_idx.get(name) {
            return idx;
        }
        let idx = self.un.add_node(name.to_string());
        self.un_idx.insert(name.to_string(), idx);
        idx
    }

    /// Populate both views from the store. Idempotent: an already-built
    /// network is rebuilt from scratch.
    pub fn build(&mut self, store: &Store, source: &str) -> DntResult<()> {
        self.un = Graph::new_undirected();
        self.di = Graph::new();
        self.un_idx.clear();
        self.di_idx.clear();
        self.attrs_set = false;

        for entity in store.iter() {
            if entity.is_dropped() {
                continue;
            }
            match entity {
                Entity::Node(node) => {
                    if let Some(name) = node.name.as_deref() {
                        self.ensure_un_node(name);
                    }
                }
                Entity::Line(line) => {
                    if let (Some(name), Some(from), Some(to)) = (
                        line.name.as_deref(),
                        line.from_element.as_deref(),
                        line.to_element.as_deref(),
                    ) {
                        let a = self.ensure_un_node(from);
                        let b = self.ensure_un_node(to);
                        let attrs =
                            EdgeAttrs::new(EntityKind::Line, name, line.length.unwrap_or(0.0));
                        self.un.add_edge(a, b, attrs);
                    }
                }
                Entity::PowerTransformer(tx) => {
                    if let (Some(name), Some(from), Some(to)) = (
                        tx.name.as_deref(),
                        tx.from_element.as_deref(),
                        tx.to_element.as_deref(),
                    ) {
                        let a = self.ensure_un_node(from);
                        let b = self.ensure_un_node(to);
                        let attrs = EdgeAttrs::new(EntityKind::PowerTransformer, name, 0.0);
                        self.un.add_edge(a, b, attrs);
                    }
                }
                Entity::Regulator(reg) => {
                    // Regulators riding on a transformer add no edge of
                    // their own; the transformer already connects the buses.
                    if reg.is_standalone() {
                        if let (Some(name), Some(from), Some(to)) = (
                            reg.name.as_deref(),
                            reg.from_element.as_deref(),
                            reg.to_element.as_deref(),
                        ) {
                            let a = self.ensure_un_node(from);
                            let b = self.ensure_un_node(to);
                            let attrs = EdgeAttrs::new(EntityKind::Regulator, name, 0.0);
                            self.un.add_edge(a, b, attrs);
                        }
                    }
                }
                Entity::Load(_) | Entity::Capacitor(_) | Entity::PowerSource(_) => {
                    if let (Some(name), Some(connecting)) = (
                        entity.name(),
                        entity.connected_nodes().first().copied(),
                    ) {
                        let shunt = self.ensure_un_node(name);
                        let bus = self.ensure_un_node(connecting);
                        let attrs = EdgeAttrs::new(entity.kind(), name, 0.0);
                        self.un.add_edge(shunt, bus, attrs);
                    }
                }
                Entity::FeederMetadata(_) => {}
            }
        }

        let source_idx = *self
            .un_idx
            .get(source)
            .ok_or_else(|| DntError::NotFound(source.to_string()))?;

        let (bfs_edges, order) = self.bfs_from(source_idx);
        self.bfs_edges = bfs_edges;

        // Orient every undirected edge by BFS discovery order; edges in
        // components unreachable from the source keep their stored
        // direction.
        for name in self.un.node_weights() {
            let idx = self.di.add_node(name.clone());
            self.di_idx.insert(name.clone(), idx);
        }
        for edge in self.un.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            let (from, to) = match (order.get(&a), order.get(&b)) {
                (Some(oa), Some(ob)) if ob < oa => (b, a),
                _ => (a, b),
            };
            let from_idx = self.di_idx[&self.un[from]];
            let to_idx = self.di_idx[&self.un[to]];
            self.di.add_edge(from_idx, to_idx, edge.weight().clone());
        }

        self.source = source.to_string();
        self.build_epoch = store.epoch();
        self.is_built = true;
        Ok(())
    }

    /// BFS over the undirected view with lexicographic neighbor order.
    /// Returns the tree-edge list in visit order and the discovery order
    /// of each reached node.
    fn bfs_from(&self, start: NodeIndex) -> (Vec<(String, String)>, HashMap<NodeIndex, usize>) {
        let mut order: HashMap<NodeIndex, usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut queue = VecDeque::new();

        order.insert(start, 0);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            let mut neighbors: Vec<NodeIndex> = self.un.neighbors(node).collect();
            neighbors.sort_by(|a, b| self.un[*a].cmp(&self.un[*b]));
            neighbors.dedup();
            for neighbor in neighbors {
                if !order.contains_key(&neighbor) {
                    order.insert(neighbor, order.len());
                    edges.push((self.un[node].clone(), self.un[neighbor].clone()));
                    queue.push_back(neighbor);
                }
            }
        }

        (edges, order)
    }

    /// The canonical oriented edge list used to build the directed view.
    pub fn bfs_order(&self, source: &str) -> DntResult<Vec<(String, String)>> {
        if !self.is_built {
            return Err(DntError::Network("network has not been built".into()));
        }
        if source == self.source {
            return Ok(self.bfs_edges.clone());
        }
        let start = *self
            .un_idx
            .get(source)
            .ok_or_else(|| DntError::NotFound(source.to_string()))?;
        Ok(self.bfs_from(start).0)
    }

    /// Lift the full equipment attribute set onto the edges of both views.
    pub fn set_attributes(&mut self, store: &Store) -> DntResult<()> {
        self.ensure_fresh(store)?;

        let mut lift = |attrs: &mut EdgeAttrs| -> DntResult<()> {
            match store.get(&attrs.equipment_name)? {
                Entity::Line(line) => attrs.lift_line(line),
                Entity::PowerTransformer(tx) => attrs.lift_transformer(tx),
                Entity::Regulator(reg) => attrs.lift_regulator(reg),
                // Shunt link edges keep their identity attributes only.
                _ => {}
            }
            Ok(())
        };

        for i in self.un.edge_indices().collect::<Vec<_>>() {
            lift(&mut self.un[i])?;
        }
        for i in self.di.edge_indices().collect::<Vec<_>>() {
            lift(&mut self.di[i])?;
        }

        self.attrs_set = true;
        Ok(())
    }

    /// Whether `set_attributes` has run since the last build.
    pub fn attrs_set(&self) -> bool {
        self.attrs_set
    }

    /// Remove from both views every edge backed by a switch line with an
    /// open wire. Only the graph is mutated; the store is untouched.
    pub fn remove_open_switches(&mut self, store: &Store) -> DntResult<()> {
        self.ensure_fresh(store)?;

        let open_switches: HashSet<String> = store
            .lines()
            .filter(|l| !l.drop && l.is_switch && l.has_open_wire())
            .filter_map(|l| l.name.clone())
            .collect();

        if open_switches.is_empty() {
            return Ok(());
        }

        // Edge indices shift on removal, so re-scan after each one.
        loop {
            let found = self
                .un
                .edge_indices()
                .find(|&i| open_switches.contains(&self.un[i].equipment_name));
            match found {
                Some(i) => {
                    self.un.remove_edge(i);
                }
                None => break,
            }
        }
        loop {
            let found = self
                .di
                .edge_indices()
                .find(|&i| open_switches.contains(&self.di[i].equipment_name));
            match found {
                Some(i) => {
                    self.di.remove_edge(i);
                }
                None => break,
            }
        }

        Ok(())
    }

    /// Walk predecessors in the directed view from `node` until an edge
    /// backed by a PowerTransformer is found. Returns its name, or `None`
    /// when the walk reaches the root first.
    pub fn get_upstream_transformer(
        &self,
        store: &Store,
        node: &str,
    ) -> DntResult<Option<String>> {
        self.ensure_fresh(store)?;
        let mut current = *self
            .di_idx
            .get(node)
            .ok_or_else(|| DntError::NotFound(node.to_string()))?;
        let mut seen = HashSet::new();

        loop {
            if !seen.insert(current) {
                return Ok(None); // cycle guard
            }
            let mut incoming: Vec<_> = self
                .di
                .edges_directed(current, Direction::Incoming)
                .collect();
            if incoming.is_empty() {
                return Ok(None);
            }
            incoming.sort_by(|a, b| self.di[a.source()].cmp(&self.di[b.source()]));
            let edge = incoming[0];
            if edge.weight().equipment == EntityKind::PowerTransformer {
                return Ok(Some(edge.weight().equipment_name.clone()));
            }
            current = edge.source();
        }
    }

    /// Every entity name reachable downstream of `source` in the directed
    /// view: store entities named by visited nodes plus the equipment on
    /// traversed edges. Depth-first, successors in lexicographic order.
    ///
    /// When the undirected view is disconnected, only the component
    /// containing `source` is returned and a warning is recorded.
    pub fn get_all_elements_downstream(
        &self,
        store: &Store,
        source: &str,
        diag: &mut Diagnostics,
    ) -> DntResult<Vec<String>> {
        self.ensure_fresh(store)?;
        let start = *self
            .di_idx
            .get(source)
            .ok_or_else(|| DntError::NotFound(source.to_string()))?;

        if connected_components(&self.un) > 1 {
            diag.add_warning(
                "topology",
                &format!(
                    "graph is disconnected; downstream walk from '{source}' covers only its component"
                ),
            );
        }

        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut seen_names = HashSet::new();
        let mut stack = vec![start];

        let mut push_name = |name: &str,
                             result: &mut Vec<String>,
                             seen: &mut HashSet<String>| {
            if store.contains(name) && seen.insert(name.to_string()) {
                result.push(name.to_string());
            }
        };

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            push_name(&self.di[node], &mut result, &mut seen_names);

            let mut out: Vec<_> = self.di.edges_directed(node, Direction::Outgoing).collect();
            out.sort_by(|a, b| self.di[b.target()].cmp(&self.di[a.target()]));
            for edge in out {
                push_name(&edge.weight().equipment_name, &mut result, &mut seen_names);
                stack.push(edge.target());
            }
        }

        Ok(result)
    }

    /// Direct successors of `node` in the directed view, lexicographic.
    pub fn successors(&self, node: &str) -> DntResult<Vec<String>> {
        let idx = *self
            .di_idx
            .get(node)
            .ok_or_else(|| DntError::NotFound(node.to_string()))?;
        let mut names: Vec<String> = self
            .di
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.di[n].clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// The single upstream predecessor of `node` and the edge between
    /// them, when one exists (lexicographically first under loops).
    pub fn predecessor_edge(&self, node: &str) -> Option<(String, EdgeAttrs)> {
        let idx = *self.di_idx.get(node)?;
        let mut incoming: Vec<_> = self.di.edges_directed(idx, Direction::Incoming).collect();
        if incoming.is_empty() {
            return None;
        }
        incoming.sort_by(|a, b| self.di[a.source()].cmp(&self.di[b.source()]));
        let edge = incoming[0];
        Some((self.di[edge.source()].clone(), edge.weight().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Load, Node, PowerTransformer, Winding};

    fn small_store() -> Store {
        let mut store = Store::new();
        store.add(Node::new("sourcebus"));
        store.add(Node::new("650"));
        store.add(Node::new("632"));
        store.add(Node::new("633"));
        store.add(
            PowerTransformer::new("sub_xfmr", "sourcebus", "650")
                .with_windings(vec![
                    Winding::new(115_000.0, &[Phase::A, Phase::B, Phase::C]),
                    Winding::new(4_160.0, &[Phase::A, Phase::B, Phase::C]),
                ])
                .as_substation(),
        );
        store.add(
            Line::new("l_650_632", "650", "632")
                .with_length(610.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C, Phase::N]),
        );
        store.add(
            Line::new("l_632_633", "632", "633")
                .with_length(150.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.add(Load::new("load_633", "633").with_phase_load(Phase::A, 100.0, 50.0));
        store.set_names().unwrap();
        store
    }

    #[test]
    fn test_build_and_counts() {
        let store = small_store();
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();

        // 4 buses + 1 shunt node
        assert_eq!(net.undirected().node_count(), 5);
        // transformer + 2 lines + 1 shunt link
        assert_eq!(net.undirected().edge_count(), 4);
        assert_eq!(net.directed().edge_count(), 4);
        assert!(net.is_built());
    }

    #[test]
    fn test_unknown_source() {
        let store = small_store();
        let mut net = Network::new();
        assert!(matches!(
            net.build(&store, "nope"),
            Err(DntError::NotFound(_))
        ));
    }

    #[test]
    fn test_bfs_order_deterministic() {
        let store = small_store();
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();
        let a = net.bfs_order("sourcebus").unwrap();
        let b = net.bfs_order("sourcebus").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], ("sourcebus".to_string(), "650".to_string()));
    }

    #[test]
    fn test_stale_graph() {
        let mut store = small_store();
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();

        store.add(Node::new("extra"));
        assert!(matches!(
            net.set_attributes(&store),
            Err(DntError::StaleGraph { .. })
        ));
    }

    #[test]
    fn test_upstream_transformer() {
        let store = small_store();
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();
        net.set_attributes(&store).unwrap();

        let tx = net.get_upstream_transformer(&store, "633").unwrap();
        assert_eq!(tx.as_deref(), Some("sub_xfmr"));

        let none = net.get_upstream_transformer(&store, "sourcebus").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_downstream_elements() {
        let store = small_store();
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();
        net.set_attributes(&store).unwrap();

        let mut diag = Diagnostics::new();
        let elements = net
            .get_all_elements_downstream(&store, "650", &mut diag)
            .unwrap();
        assert!(elements.contains(&"l_650_632".to_string()));
        assert!(elements.contains(&"633".to_string()));
        assert!(elements.contains(&"load_633".to_string()));
        assert!(!elements.contains(&"sub_xfmr".to_string()));
        assert!(!diag.has_warnings());
    }

    #[test]
    fn test_remove_open_switches() {
        let mut store = small_store();
        // Make l_632_633 an open switch
        {
            let entity = store.get_mut("l_632_633").unwrap();
            if let Entity::Line(line) = entity {
                line.is_switch = true;
                line.wires[0].is_open = true;
            }
        }
        let mut net = Network::new();
        net.build(&store, "sourcebus").unwrap();
        let before = net.undirected().edge_count();
        net.remove_open_switches(&store).unwrap();
        assert_eq!(net.undirected().edge_count(), before - 1);
        assert_eq!(net.directed().edge_count(), before - 1);
    }
}
