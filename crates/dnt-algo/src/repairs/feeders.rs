//! Feeder partitioning and headnode assignment.

use std::collections::{HashMap, HashSet};

use petgraph::visit::EdgeRef;

use dnt_core::{Diagnostics, DntResult, Entity, EntityKind, Store};

use super::{prepared_network, FeederPartition, PassOutcome};

/// Partition the model by substation transformer: everything downstream
/// of one gets its `substation_name` and a `Feeder_<name>` label.
///
/// A substation whose downstream set contains another substation is
/// nested and skipped; its inner substation claims the territory. Writing
/// into an entity already labeled, or claimed twice in this run, is an
/// overlap error and the pass writes nothing.
pub fn feeder_preprocessing(
    store: &mut Store,
    source: &str,
) -> DntResult<(PassOutcome, Vec<FeederPartition>)> {
    let mut net = prepared_network(store, source)?;
    net.set_attributes(store)?;
    let mut diag = Diagnostics::new();

    let substations: Vec<String> = store
        .transformers()
        .filter(|t| !t.drop && t.is_substation)
        .filter_map(|t| t.name.clone())
        .collect();
    let substation_set: HashSet<&str> = substations.iter().map(String::as_str).collect();

    let mut partitions = Vec::new();
    for tx_name in &substations {
        let Some(headnode) = transformer_target(&net, tx_name) else {
            diag.add_warning_with_entity(
                "feeder",
                "substation transformer has no directed edge; skipped",
                tx_name,
            );
            continue;
        };
        let members = net.get_all_elements_downstream(store, &headnode, &mut diag)?;
        let nested = members
            .iter()
            .find(|m| substation_set.contains(m.as_str()) && *m != tx_name);
        if let Some(inner) = nested {
            diag.add_warning_with_entity(
                "feeder",
                &format!("substation '{inner}' nested downstream; outer partition skipped"),
                tx_name,
            );
            continue;
        }
        partitions.push(FeederPartition {
            transformer: tx_name.clone(),
            feeder_name: format!("Feeder_{tx_name}"),
            members,
        });
    }

    // Overlap detection before any write.
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for partition in &partitions {
        for member in &partition.members {
            if let Some(previous) = claimed.insert(member, &partition.transformer) {
                diag.add_error_with_entity(
                    "feeder",
                    &format!(
                        "claimed by both '{previous}' and '{}'",
                        partition.transformer
                    ),
                    member,
                );
            }
            let entity = store.get(member)?;
            let taken = entity.substation_name().map_or(false, |s| !s.is_empty())
                || entity.feeder_name().map_or(false, |s| !s.is_empty());
            if taken {
                diag.add_error_with_entity("feeder", "already assigned to a feeder", member);
            }
        }
    }
    if diag.has_errors() {
        return Ok((
            PassOutcome {
                changed: false,
                diagnostics: diag,
            },
            partitions,
        ));
    }

    let mut changed = false;
    for partition in &partitions {
        for member in &partition.members {
            let entity = store.get_mut(member)?;
            entity.set_substation_name(&partition.transformer);
            entity.set_feeder_name(&partition.feeder_name);
            changed = true;
        }
    }

    Ok((
        PassOutcome {
            changed,
            diagnostics: diag,
        },
        partitions,
    ))
}

/// Target node of the transformer's directed edge, i.e. its downstream bus.
fn transformer_target(net: &dnt_core::Network, tx_name: &str) -> Option<String> {
    let di = net.directed();
    di.edge_references()
        .find(|e| {
            e.weight().equipment == EntityKind::PowerTransformer
                && e.weight().equipment_name == tx_name
        })
        .map(|e| di[e.target()].clone())
}

/// For every feeder metadata record, pick its headnode from the direct
/// successors of the substation bus by matching the cleaned feeder name,
/// and adopt that node's nominal voltage.
pub fn set_feeder_headnodes(store: &mut Store, source: &str) -> DntResult<PassOutcome> {
    let net = prepared_network(store, source)?;
    let mut diag = Diagnostics::new();

    let metas: Vec<(String, Option<String>)> = store
        .feeder_metadata()
        .filter(|f| !f.drop)
        .filter_map(|f| Some((f.name.clone()?, f.substation.clone())))
        .collect();

    let mut updates: Vec<(String, String, Option<f64>)> = Vec::new();
    for (meta_name, substation) in metas {
        let Some(bus) = substation else {
            diag.add_warning_with_entity("feeder", "metadata names no substation bus", &meta_name);
            continue;
        };
        let successors = match net.successors(&bus) {
            Ok(s) => s,
            Err(_) => {
                diag.add_warning_with_entity(
                    "feeder",
                    &format!("substation bus '{bus}' is not in the graph"),
                    &meta_name,
                );
                continue;
            }
        };
        match match_headnode(&meta_name, &successors) {
            Some(headnode) => {
                let voltage = store
                    .get_node(&headnode)
                    .ok()
                    .and_then(|n| n.nominal_voltage);
                updates.push((meta_name, headnode, voltage));
            }
            None => diag.add_warning_with_entity(
                "feeder",
                &format!("no successor of '{bus}' matches the feeder name"),
                &meta_name,
            ),
        }
    }

    let mut changed = false;
    for (meta_name, headnode, voltage) in updates {
        if let Entity::FeederMetadata(meta) = store.get_mut(&meta_name)? {
            meta.headnode = Some(headnode);
            if voltage.is_some() {
                meta.nominal_voltage = voltage;
            }
            changed = true;
        }
    }

    Ok(PassOutcome {
        changed,
        diagnostics: diag,
    })
}

fn clean(name: &str) -> String {
    name.replace('.', "").to_lowercase()
}

/// Matching ladder: exact cleaned name, then progressively trimming at
/// `_s` boundaries, then the reversed `a->b` form.
fn match_headnode(feeder_name: &str, successors: &[String]) -> Option<String> {
    let mut target = clean(feeder_name);
    if let Some(stripped) = target.strip_suffix("_src") {
        target = stripped.to_string();
    }

    for succ in successors {
        if clean(succ) == target {
            return Some(succ.clone());
        }
    }

    let mut trimmed = target.clone();
    while let Some(pos) = trimmed.rfind("_s") {
        trimmed.truncate(pos);
        for succ in successors {
            if clean(succ) == trimmed {
                return Some(succ.clone());
            }
        }
    }

    if let Some((a, b)) = target.split_once("->") {
        let reversed = format!("{b}->{a}");
        for succ in successors {
            if clean(succ) == reversed {
                return Some(succ.clone());
            }
        }
    }

    None
}
