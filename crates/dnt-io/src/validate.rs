//! Post-read referential integrity checks.

use dnt_core::{Diagnostics, DntResult, Entity, EntityKind, Store};

/// Scan every entity's outgoing name references and report the dangling
/// ones. Series equipment and shunts must point at Node entities;
/// regulators riding a transformer must name a real transformer; feeder
/// metadata buses are checked leniently (warnings) since metadata often
/// arrives ahead of the model.
///
/// Requires `set_names()`; never mutates the store.
pub fn validate_references(store: &Store) -> DntResult<Diagnostics> {
    let mut diag = Diagnostics::new();

    let expect_node = |referenced: &str, by: &str, diag: &mut Diagnostics| {
        match store.get(referenced) {
            Ok(Entity::Node(_)) => {}
            Ok(other) => diag.add_error_with_entity(
                "reference",
                &format!("'{referenced}' is a {}, expected a node", other.kind()),
                by,
            ),
            Err(_) => diag.add_error_with_entity(
                "reference",
                &format!("references unknown node '{referenced}'"),
                by,
            ),
        }
    };

    for entity in store.iter() {
        if entity.is_dropped() {
            continue;
        }
        let Some(name) = entity.name() else { continue };
        for referenced in entity.connected_nodes() {
            expect_node(referenced, name, &mut diag);
        }

        match entity {
            Entity::Regulator(reg) => {
                if let Some(tx) = reg.connected_transformer.as_deref() {
                    let resolves = matches!(store.get(tx), Ok(Entity::PowerTransformer(_)));
                    if !resolves {
                        diag.add_error_with_entity(
                            "reference",
                            &format!("connected transformer '{tx}' does not resolve"),
                            name,
                        );
                    }
                }
            }
            Entity::FeederMetadata(meta) => {
                for (field, value) in [
                    ("substation", meta.substation.as_deref()),
                    ("headnode", meta.headnode.as_deref()),
                ] {
                    if let Some(bus) = value {
                        if !store.contains(bus) {
                            diag.add_warning_with_entity(
                                "reference",
                                &format!("{field} '{bus}' is not in the model"),
                                name,
                            );
                        }
                    }
                }
                if let Some(tx) = meta.transformer.as_deref() {
                    if !matches!(store.get(tx), Ok(Entity::PowerTransformer(_))) {
                        diag.add_warning_with_entity(
                            "reference",
                            &format!("transformer '{tx}' does not resolve"),
                            name,
                        );
                    }
                }
            }
            Entity::Load(load) => {
                if let Some(tx) = load.upstream_transformer_name.as_deref() {
                    if !matches!(store.get(tx), Ok(Entity::PowerTransformer(_))) {
                        diag.add_warning_with_entity(
                            "reference",
                            &format!("upstream transformer '{tx}' does not resolve"),
                            name,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    // Kind sanity for the degenerate case of a store with no nodes at all.
    if store.iter().all(|e| e.kind() != EntityKind::Node) && !store.is_empty() {
        diag.add_warning("reference", "model contains no node entities");
    }

    Ok(diag)
}
