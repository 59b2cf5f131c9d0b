//! Phase agreement along the load-to-source path.

use std::collections::HashSet;

use dnt_core::{Diagnostics, DntResult, EdgeAttrs, EntityKind, Phase, Store, Winding};

use super::{switched_network, CheckOutcome};

/// One walk segment: the edge and the node on its load side.
struct Segment {
    downstream: String,
    attrs: EdgeAttrs,
}

/// Walk from every load back to the source along directed predecessors
/// and verify:
///
/// 1. at most one non-substation transformer is traversed;
/// 2. with `needs_transformers`, at least one is;
/// 3. line phases below the transformer exactly match its low winding;
/// 4. line phases above it cover its high winding;
/// 5. line phase counts never shrink toward the source;
/// 6. the transformer points downstream (`to_element` on the load side).
pub fn check_transformer_phase_path(
    store: &Store,
    source: &str,
    needs_transformers: bool,
) -> DntResult<CheckOutcome> {
    let net = switched_network(store, source)?;
    let mut diag = Diagnostics::new();

    for load in store.loads().filter(|l| !l.drop) {
        let (Some(load_name), Some(bus)) = (load.name.as_deref(), load.connecting_element.as_deref())
        else {
            continue;
        };

        let walk = walk_to_source(&net, bus, source);
        let Some(walk) = walk else {
            diag.add_warning_with_entity(
                "phase",
                &format!("no path from load to '{source}'; phase path not checked"),
                load_name,
            );
            continue;
        };

        check_walk(store, source, load_name, &walk, needs_transformers, &mut diag)?;
    }

    Ok(CheckOutcome::from_diagnostics(diag))
}

/// Predecessor chain from `bus` up to `source`, in load-to-source order.
/// `None` when the chain dead-ends or cycles before reaching the source.
fn walk_to_source(net: &dnt_core::Network, bus: &str, source: &str) -> Option<Vec<Segment>> {
    let mut walk = Vec::new();
    let mut current = bus.to_string();
    let mut guard = HashSet::new();

    while current != source {
        if !guard.insert(current.clone()) {
            return None;
        }
        let (pred, attrs) = net.predecessor_edge(&current)?;
        walk.push(Segment {
            downstream: current,
            attrs,
        });
        current = pred;
    }
    Some(walk)
}

fn check_walk(
    store: &Store,
    source: &str,
    load_name: &str,
    walk: &[Segment],
    needs_transformers: bool,
    diag: &mut Diagnostics,
) -> DntResult<()> {
    let tx_positions: Vec<usize> = walk
        .iter()
        .enumerate()
        .filter(|(_, seg)| {
            seg.attrs.equipment == EntityKind::PowerTransformer && !seg.attrs.is_substation
        })
        .map(|(i, _)| i)
        .collect();

    if tx_positions.len() > 1 {
        diag.add_error_with_entity(
            "phase",
            &format!(
                "{} transformers on the path to '{source}'; at most one expected",
                tx_positions.len()
            ),
            load_name,
        );
        return Ok(());
    }
    if tx_positions.is_empty() && needs_transformers {
        diag.add_error_with_entity(
            "phase",
            &format!("no transformer on the path to '{source}'"),
            load_name,
        );
    }

    // Line phase counts must be non-decreasing from load to source.
    let mut last_count: Option<usize> = None;
    for seg in walk {
        if seg.attrs.equipment != EntityKind::Line {
            continue;
        }
        let count = line_phases(&seg.attrs).len();
        if let Some(prev) = last_count {
            if count < prev {
                diag.add_error_with_entity(
                    "phase",
                    &format!(
                        "phase count drops from {prev} to {count} toward the source at line '{}'",
                        seg.attrs.equipment_name
                    ),
                    load_name,
                );
            }
        }
        last_count = Some(count);
    }

    let Some(&tx_at) = tx_positions.first() else {
        return Ok(());
    };
    let seg = &walk[tx_at];
    let tx = store.get_transformer(&seg.attrs.equipment_name)?;

    if tx.to_element.as_deref() != Some(seg.downstream.as_str()) {
        diag.add_error_with_entity(
            "phase",
            &format!("transformer '{}' is connected backwards", seg.attrs.equipment_name),
            load_name,
        );
    }

    let (low, high) = winding_phase_sets(&tx.windings);
    for (i, seg) in walk.iter().enumerate() {
        if seg.attrs.equipment != EntityKind::Line {
            continue;
        }
        let phases = line_phases(&seg.attrs);
        if i < tx_at {
            if phases != low {
                diag.add_error_with_entity(
                    "phase",
                    &format!(
                        "low-side line '{}' phases {:?} do not match winding phases {:?}",
                        seg.attrs.equipment_name,
                        sorted(&phases),
                        sorted(&low)
                    ),
                    load_name,
                );
            }
        } else if !phases.is_superset(&high) {
            diag.add_error_with_entity(
                "phase",
                &format!(
                    "high-side line '{}' phases {:?} do not cover winding phases {:?}",
                    seg.attrs.equipment_name,
                    sorted(&phases),
                    sorted(&high)
                ),
                load_name,
            );
        }
    }

    Ok(())
}

fn line_phases(attrs: &EdgeAttrs) -> HashSet<Phase> {
    attrs.phases.iter().copied().filter(|p| !p.is_neutral()).collect()
}

/// Low and high winding phase sets by nominal voltage; winding order
/// decides when voltages are missing.
fn winding_phase_sets(windings: &[Winding]) -> (HashSet<Phase>, HashSet<Phase>) {
    let phases = |w: &Winding| -> HashSet<Phase> {
        w.phases().into_iter().filter(|p| !p.is_neutral()).collect()
    };
    let low = windings
        .iter()
        .filter(|w| w.nominal_voltage.is_some())
        .min_by(|a, b| a.nominal_voltage.partial_cmp(&b.nominal_voltage).unwrap_or(std::cmp::Ordering::Equal))
        .or(windings.last());
    let high = windings
        .iter()
        .filter(|w| w.nominal_voltage.is_some())
        .max_by(|a, b| a.nominal_voltage.partial_cmp(&b.nominal_voltage).unwrap_or(std::cmp::Ordering::Equal))
        .or(windings.first());
    (
        low.map(&phases).unwrap_or_default(),
        high.map(&phases).unwrap_or_default(),
    )
}

fn sorted(set: &HashSet<Phase>) -> Vec<Phase> {
    let mut phases: Vec<Phase> = set.iter().copied().collect();
    phases.sort();
    phases
}
