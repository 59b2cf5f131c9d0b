//! Transformer orientation and sizing fixes.

use std::collections::{BTreeMap, BTreeSet};

use dnt_core::{Diagnostics, DntResult, Entity, Store};

use super::{prepared_network, walk_upstream, PassOutcome};

/// Canonical distribution transformer sizes in kVA.
const KVA_LADDER: [f64; 11] = [
    15.0, 25.0, 50.0, 75.0, 100.0, 300.0, 500.0, 1000.0, 2000.0, 3000.0, 5000.0,
];

/// Swap `from_element`/`to_element` on transformers installed backwards:
/// those whose `to_element` faces the source rather than the load, found
/// by walking each load's path. Only loads with exactly one transformer
/// on their path are considered. Winding order is left alone.
pub fn fix_transformer_phase_path(store: &mut Store, source: &str) -> DntResult<PassOutcome> {
    let net = prepared_network(store, source)?;
    let mut diag = Diagnostics::new();

    let mut reversed: BTreeSet<String> = BTreeSet::new();
    for load in store.loads().filter(|l| !l.drop) {
        let Some(bus) = load.connecting_element.as_deref() else {
            continue;
        };
        let walk = walk_upstream(&net, bus);
        if walk.transformers.len() != 1 {
            continue;
        }
        let (tx_name, downstream) = &walk.transformers[0];
        let tx = store.get_transformer(tx_name)?;
        if tx.to_element.as_deref() != Some(downstream.as_str())
            && tx.from_element.as_deref() == Some(downstream.as_str())
        {
            reversed.insert(tx_name.clone());
        }
    }

    for tx_name in &reversed {
        if let Entity::PowerTransformer(tx) = store.get_mut(tx_name)? {
            std::mem::swap(&mut tx.from_element, &mut tx.to_element);
            diag.add_warning_with_entity("phase", "endpoints swapped to face downstream", tx_name);
        }
    }

    Ok(PassOutcome {
        changed: !reversed.is_empty(),
        diagnostics: diag,
    })
}

/// Upsize transformers whose served load exceeds their rating: aggregate
/// the kW of every load whose nearest upstream transformer is this one,
/// then take the smallest ladder size strictly above the aggregate. Loads
/// past the top of the ladder are an error and the unit is left alone.
pub fn fix_undersized_transformers(store: &mut Store, source: &str) -> DntResult<PassOutcome> {
    let net = prepared_network(store, source)?;
    let mut diag = Diagnostics::new();

    let mut served_kw: BTreeMap<String, f64> = BTreeMap::new();
    for load in store.loads().filter(|l| !l.drop) {
        let Some(bus) = load.connecting_element.as_deref() else {
            continue;
        };
        let walk = walk_upstream(&net, bus);
        if let Some((tx_name, _)) = walk.transformers.first() {
            *served_kw.entry(tx_name.clone()).or_insert(0.0) += load.total_pq().0 / 1000.0;
        }
    }

    let mut resized: Vec<(String, f64)> = Vec::new();
    for (tx_name, kw) in &served_kw {
        let tx = store.get_transformer(tx_name)?;
        let Some(rated) = tx.primary_winding().and_then(|w| w.rated_power) else {
            diag.add_warning_with_entity("sizing", "no rated power on primary winding", tx_name);
            continue;
        };
        if rated / 1000.0 >= *kw {
            continue;
        }
        match KVA_LADDER.iter().find(|&&step| step > *kw) {
            Some(step) => resized.push((tx_name.clone(), step * 1000.0)),
            None => diag.add_error_with_entity(
                "sizing",
                &format!("served load {kw:.1} kW exceeds the largest ladder size"),
                tx_name,
            ),
        }
    }

    for (tx_name, volt_amperes) in &resized {
        if let Entity::PowerTransformer(tx) = store.get_mut(tx_name)? {
            for winding in &mut tx.windings {
                winding.rated_power = Some(*volt_amperes);
            }
            diag.add_warning_with_entity(
                "sizing",
                &format!("rated power raised to {} VA", volt_amperes),
                tx_name,
            );
        }
    }

    Ok(PassOutcome {
        changed: !resized.is_empty(),
        diagnostics: diag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, Load, Node, Phase, PowerTransformer, Winding};

    fn service_store(tx_from: &str, tx_to: &str, rated_kva: f64) -> Store {
        let mut store = Store::new();
        for name in ["sourcebus", "n1", "n2", "n3"] {
            store.add(Node::new(name));
        }
        store.add(
            Line::new("l_hi", "sourcebus", "n1")
                .with_length(100.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store.add(PowerTransformer::new("t1", tx_from, tx_to).with_windings(vec![
            Winding::new(12470.0, &[Phase::A, Phase::B, Phase::C])
                .with_rated_power(rated_kva * 1000.0),
            Winding::new(480.0, &[Phase::A, Phase::B, Phase::C])
                .with_rated_power(rated_kva * 1000.0),
        ]));
        store.add(
            Line::new("l_lo", "n2", "n3")
                .with_length(20.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C]),
        );
        store
    }

    #[test]
    fn test_reversed_transformer_swapped() {
        let mut store = service_store("n2", "n1", 50.0);
        store.add(Load::new("ld", "n3").with_phase_load(Phase::A, 10_000.0, 0.0));
        let outcome = fix_transformer_phase_path(&mut store, "sourcebus").unwrap();
        assert!(outcome.changed);

        let tx = store.get_transformer("t1").unwrap();
        assert_eq!(tx.from_element.as_deref(), Some("n1"));
        assert_eq!(tx.to_element.as_deref(), Some("n2"));

        // Second run is a no-op
        let again = fix_transformer_phase_path(&mut store, "sourcebus").unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_correct_orientation_untouched() {
        let mut store = service_store("n1", "n2", 50.0);
        store.add(Load::new("ld", "n3").with_phase_load(Phase::A, 10_000.0, 0.0));
        let outcome = fix_transformer_phase_path(&mut store, "sourcebus").unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_undersized_transformer_raised_to_next_step() {
        let mut store = service_store("n1", "n2", 25.0);
        // 40 kW aggregate across two loads
        store.add(Load::new("ld_a", "n3").with_phase_load(Phase::A, 25_000.0, 5000.0));
        store.add(Load::new("ld_b", "n3").with_phase_load(Phase::B, 15_000.0, 3000.0));
        let outcome = fix_undersized_transformers(&mut store, "sourcebus").unwrap();
        assert!(outcome.changed, "{}", outcome.diagnostics);

        let tx = store.get_transformer("t1").unwrap();
        for winding in &tx.windings {
            assert_eq!(winding.rated_power, Some(50_000.0));
        }
    }

    #[test]
    fn test_adequate_transformer_untouched() {
        let mut store = service_store("n1", "n2", 75.0);
        store.add(Load::new("ld", "n3").with_phase_load(Phase::A, 40_000.0, 0.0));
        let outcome = fix_undersized_transformers(&mut store, "sourcebus").unwrap();
        assert!(!outcome.changed);
        let tx = store.get_transformer("t1").unwrap();
        assert_eq!(tx.windings[0].rated_power, Some(75_000.0));
    }

    #[test]
    fn test_load_beyond_ladder_reported() {
        let mut store = service_store("n1", "n2", 100.0);
        store.add(Load::new("ld", "n3").with_phase_load(Phase::A, 6_000_000.0, 0.0));
        let outcome = fix_undersized_transformers(&mut store, "sourcebus").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.diagnostics.has_errors());
        let tx = store.get_transformer("t1").unwrap();
        assert_eq!(tx.windings[0].rated_power, Some(100_000.0));
    }
}
