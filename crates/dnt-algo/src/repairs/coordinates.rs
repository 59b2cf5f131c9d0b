//! Fill missing load coordinates from the connecting node.

use dnt_core::{Diagnostics, DntResult, Entity, Position, Store};

use super::PassOutcome;

/// Loads with no positions inherit their connecting node's positions,
/// nudged by the given deltas so markers do not stack on the bus. Loads
/// whose connecting element is missing or not a node are reported and
/// skipped. No graph is needed.
pub fn set_load_coordinates(
    store: &mut Store,
    delta_long: f64,
    delta_lat: f64,
    delta_elev: f64,
) -> DntResult<PassOutcome> {
    store.set_names()?;
    let mut diag = Diagnostics::new();

    let mut plans: Vec<(String, Vec<Position>)> = Vec::new();
    for load in store.loads().filter(|l| !l.drop && l.positions.is_empty()) {
        let Some(name) = load.name.as_deref() else {
            continue;
        };
        let Some(bus) = load.connecting_element.as_deref() else {
            diag.add_warning_with_entity("position", "load has no connecting element", name);
            continue;
        };
        match store.get_node(bus) {
            Ok(node) if !node.positions.is_empty() => {
                let positions = node
                    .positions
                    .iter()
                    .map(|p| Position {
                        long: p.long + delta_long,
                        lat: p.lat + delta_lat,
                        elevation: p.elevation + delta_elev,
                    })
                    .collect();
                plans.push((name.to_string(), positions));
            }
            Ok(_) => {}
            Err(_) => diag.add_warning_with_entity(
                "position",
                &format!("connecting element '{bus}' is not a node"),
                name,
            ),
        }
    }

    let mut changed = false;
    for (name, positions) in plans {
        if let Entity::Load(load) = store.get_mut(&name)? {
            load.positions = positions;
            changed = true;
        }
    }

    Ok(PassOutcome {
        changed,
        diagnostics: diag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Load, Node, Phase};

    #[test]
    fn test_positions_inherited_with_offset() {
        let mut store = Store::new();
        let mut node = Node::new("n1");
        node.positions.push(Position {
            long: -105.2,
            lat: 39.7,
            elevation: 1600.0,
        });
        store.add(node);
        store.add(Load::new("ld", "n1").with_phase_load(Phase::A, 1000.0, 0.0));

        let outcome = set_load_coordinates(&mut store, 0.1, 0.1, 0.0).unwrap();
        assert!(outcome.changed);

        let load = store.loads().next().unwrap();
        assert_eq!(load.positions.len(), 1);
        assert!((load.positions[0].long - -105.1).abs() < 1e-9);
        assert!((load.positions[0].lat - 39.8).abs() < 1e-9);
        assert!((load.positions[0].elevation - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_existing_positions_kept() {
        let mut store = Store::new();
        let mut node = Node::new("n1");
        node.positions.push(Position::default());
        store.add(node);
        let mut load = Load::new("ld", "n1");
        load.positions.push(Position {
            long: 1.0,
            lat: 2.0,
            elevation: 3.0,
        });
        store.add(load);

        let outcome = set_load_coordinates(&mut store, 0.1, 0.1, 0.0).unwrap();
        assert!(!outcome.changed);
        assert_eq!(store.loads().next().unwrap().positions[0].long, 1.0);
    }

    #[test]
    fn test_dangling_connecting_element_warns() {
        let mut store = Store::new();
        store.add(Load::new("ld", "ghost").with_phase_load(Phase::A, 100.0, 0.0));
        let outcome = set_load_coordinates(&mut store, 0.1, 0.1, 0.0).unwrap();
        assert!(!outcome.changed);
        assert!(outcome.diagnostics.has_warnings());
    }
}
