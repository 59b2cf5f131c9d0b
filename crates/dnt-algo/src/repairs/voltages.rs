//! Nominal-voltage propagation from the source bus.

use std::collections::HashMap;

use dnt_core::{Diagnostics, DntError, DntResult, Entity, EntityKind, Store};

use super::{prepared_network, PassOutcome};

/// Propagate the source voltage through the directed view. Crossing a
/// transformer edge switches to that transformer's lowest winding
/// voltage; every other edge carries the predecessor's voltage through.
/// Lines without a voltage then inherit from their `from_element`.
pub fn set_nominal_voltages(store: &mut Store, source: &str) -> DntResult<PassOutcome> {
    let net = prepared_network(store, source)?;
    let mut diag = Diagnostics::new();

    let Some(v0) = source_voltage(store, source) else {
        return Err(DntError::Validation(format!(
            "no nominal voltage known at source '{source}'"
        )));
    };

    // BFS tree edges come back in discovery order, so the predecessor's
    // voltage is always settled before its children are visited.
    let mut volts: HashMap<String, f64> = HashMap::new();
    volts.insert(source.to_string(), v0);

    let di = net.directed();
    for (u, v) in net.bfs_order(source)? {
        let Some(&uv) = volts.get(&u) else {
            continue;
        };
        let (Some(ui), Some(vi)) = (net.directed_index(&u), net.directed_index(&v)) else {
            continue;
        };
        let Some(edge) = di.find_edge(ui, vi).or_else(|| di.find_edge(vi, ui)) else {
            continue;
        };
        let attrs = &di[edge];
        let voltage = if attrs.equipment == EntityKind::PowerTransformer {
            match store.get_transformer(&attrs.equipment_name)?.min_winding_voltage() {
                Some(low) => low,
                None => {
                    diag.add_warning_with_entity(
                        "voltage",
                        "transformer has no winding voltage; carrying through",
                        &attrs.equipment_name,
                    );
                    uv
                }
            }
        } else {
            uv
        };
        volts.insert(v, voltage);
    }

    // Write-back: node voltages first, then lines inheriting from their
    // from_element.
    let mut changed = false;
    let node_updates: Vec<(String, f64)> = store
        .nodes()
        .filter(|n| !n.drop)
        .filter_map(|n| {
            let name = n.name.as_deref()?;
            let v = *volts.get(name)?;
            (n.nominal_voltage != Some(v)).then(|| (name.to_string(), v))
        })
        .collect();
    let line_updates: Vec<(String, f64)> = store
        .lines()
        .filter(|l| !l.drop && l.nominal_voltage.is_none())
        .filter_map(|l| {
            let name = l.name.as_deref()?;
            let from = l.from_element.as_deref()?;
            Some((name.to_string(), *volts.get(from)?))
        })
        .collect();

    for (name, v) in node_updates {
        if let Entity::Node(node) = store.get_mut(&name)? {
            node.nominal_voltage = Some(v);
            changed = true;
        }
    }
    for (name, v) in line_updates {
        if let Entity::Line(line) = store.get_mut(&name)? {
            line.nominal_voltage = Some(v);
            changed = true;
        }
    }

    Ok(PassOutcome {
        changed,
        diagnostics: diag,
    })
}

/// The voltage anchored at the source bus: the node's own value, else the
/// value of a power source connected there.
fn source_voltage(store: &Store, source: &str) -> Option<f64> {
    if let Ok(node) = store.get_node(source) {
        if let Some(v) = node.nominal_voltage {
            return Some(v);
        }
    }
    store
        .sources()
        .filter(|s| !s.drop && s.connecting_element.as_deref() == Some(source))
        .find_map(|s| s.nominal_voltage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, Node, Phase, PowerTransformer, Winding};

    fn feeder_with_transformer() -> Store {
        let mut store = Store::new();
        store.add(Node::new("sourcebus").with_nominal_voltage(12470.0));
        for name in ["n1", "n2", "n3"] {
            store.add(Node::new(name));
        }
        store.add(
            Line::new("l_hi", "sourcebus", "n1")
                .with_length(300.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.add(PowerTransformer::new("xfm1", "n1", "n2").with_windings(vec![
            Winding::new(12470.0, &[Phase::A, Phase::B, Phase::C]),
            Winding::new(480.0, &[Phase::A, Phase::B, Phase::C]),
        ]));
        store.add(
            Line::new("l_lo", "n2", "n3")
                .with_length(50.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store
    }

    #[test]
    fn test_voltage_steps_down_across_transformer() {
        let mut store = feeder_with_transformer();
        let outcome = set_nominal_voltages(&mut store, "sourcebus").unwrap();
        assert!(outcome.changed);

        assert_eq!(store.get_node("n1").unwrap().nominal_voltage, Some(12470.0));
        assert_eq!(store.get_node("n2").unwrap().nominal_voltage, Some(480.0));
        assert_eq!(store.get_node("n3").unwrap().nominal_voltage, Some(480.0));
    }

    #[test]
    fn test_lines_inherit_from_element() {
        let mut store = feeder_with_transformer();
        set_nominal_voltages(&mut store, "sourcebus").unwrap();
        assert_eq!(store.get_line("l_hi").unwrap().nominal_voltage, Some(12470.0));
        assert_eq!(store.get_line("l_lo").unwrap().nominal_voltage, Some(480.0));
    }

    #[test]
    fn test_missing_source_voltage_is_an_error() {
        let mut store = Store::new();
        store.add(Node::new("sourcebus"));
        assert!(matches!(
            set_nominal_voltages(&mut store, "sourcebus"),
            Err(DntError::Validation(_))
        ));
    }

    #[test]
    fn test_source_voltage_from_power_source() {
        let mut store = feeder_with_transformer();
        store.set_names().unwrap();
        if let Entity::Node(n) = store.get_mut("sourcebus").unwrap() {
            n.nominal_voltage = None;
        }
        store.add(
            dnt_core::PowerSource::new("source", "sourcebus")
                .as_sourcebus()
                .with_nominal_voltage(12470.0),
        );
        let outcome = set_nominal_voltages(&mut store, "sourcebus").unwrap();
        assert!(outcome.changed);
        assert_eq!(store.get_node("n2").unwrap().nominal_voltage, Some(480.0));
    }

    #[test]
    fn test_idempotent_second_run_reports_unchanged() {
        let mut store = feeder_with_transformer();
        assert!(set_nominal_voltages(&mut store, "sourcebus").unwrap().changed);
        assert!(!set_nominal_voltages(&mut store, "sourcebus").unwrap().changed);
    }
}
