//! Re-phase loads and their service drops to the upstream transformer.

use std::collections::HashSet;

use dnt_core::{Diagnostics, DntResult, Entity, Phase, Store, Wire};

use super::{prepared_network, walk_upstream, PassOutcome};

struct LoadPlan {
    load: String,
    transformer: String,
    phases: Vec<Phase>,
    lines: Vec<String>,
}

/// For every load, walk upstream to its service transformer and force the
/// load's phase components and the walked lines' wires onto the
/// transformer's phase set. The load's aggregate P and Q are preserved,
/// redistributed equally across the surviving phase loads.
pub fn center_tap_load_preprocessing(store: &mut Store, source: &str) -> DntResult<PassOutcome> {
    let net = prepared_network(store, source)?;
    let mut diag = Diagnostics::new();

    let mut plans = Vec::new();
    for load in store.loads().filter(|l| !l.drop) {
        let (Some(name), Some(bus)) = (load.name.as_deref(), load.connecting_element.as_deref())
        else {
            continue;
        };
        let walk = walk_upstream(&net, bus);
        let Some((tx_name, _)) = walk.transformers.first() else {
            diag.add_warning_with_entity("phase", "no upstream transformer found", name);
            continue;
        };
        let phases = store.get_transformer(tx_name)?.primary_phases();
        if phases.is_empty() {
            diag.add_warning_with_entity(
                "phase",
                &format!("transformer '{tx_name}' has no primary phases"),
                name,
            );
            continue;
        }
        plans.push(LoadPlan {
            load: name.to_string(),
            transformer: tx_name.clone(),
            phases,
            lines: walk.lines_below,
        });
    }

    let mut changed = false;
    for plan in &plans {
        changed |= apply_to_load(store, plan, &mut diag)?;
        for line_name in &plan.lines {
            changed |= apply_to_line(store, line_name, &plan.phases)?;
        }
    }

    Ok(PassOutcome {
        changed,
        diagnostics: diag,
    })
}

fn apply_to_load(store: &mut Store, plan: &LoadPlan, diag: &mut Diagnostics) -> DntResult<bool> {
    let Entity::Load(load) = store.get_mut(&plan.load)? else {
        return Ok(false);
    };
    let keep: HashSet<Phase> = plan.phases.iter().copied().collect();
    let (p0, q0) = load.total_pq();
    let mut changed = load.upstream_transformer_name.as_deref() != Some(&plan.transformer);
    load.upstream_transformer_name = Some(plan.transformer.clone());

    let Some(template) = load.phase_loads.first().cloned() else {
        diag.add_warning_with_entity("phase", "load has no phase components", &plan.load);
        return Ok(changed);
    };

    for pl in &mut load.phase_loads {
        let off = pl.phase.map(|p| !keep.contains(&p)).unwrap_or(false);
        if off && !pl.drop {
            pl.drop = true;
            changed = true;
        }
    }

    let present: HashSet<Phase> = load
        .phase_loads
        .iter()
        .filter(|pl| !pl.drop)
        .filter_map(|pl| pl.phase)
        .collect();
    for phase in &plan.phases {
        if !present.contains(phase) {
            let mut pl = template.clone();
            pl.phase = Some(*phase);
            pl.drop = false;
            load.phase_loads.push(pl);
            changed = true;
        }
    }

    let survivors = load.phase_loads.iter().filter(|pl| !pl.drop).count();
    if survivors > 0 {
        let (p, q) = (p0 / survivors as f64, q0 / survivors as f64);
        for pl in load.phase_loads.iter_mut().filter(|pl| !pl.drop) {
            if pl.p != Some(p) || pl.q != Some(q) {
                pl.p = Some(p);
                pl.q = Some(q);
                changed = true;
            }
        }
    }
    Ok(changed)
}

/// Same rule on the wires: any wire off the phase set is dropped,
/// neutral included, and missing phases are synthesized from an
/// existing wire.
fn apply_to_line(store: &mut Store, line_name: &str, phases: &[Phase]) -> DntResult<bool> {
    let Entity::Line(line) = store.get_mut(line_name)? else {
        return Ok(false);
    };
    let keep: HashSet<Phase> = phases.iter().copied().collect();
    let mut changed = false;

    for wire in &mut line.wires {
        let off = wire.phase.map(|p| !keep.contains(&p)).unwrap_or(false);
        if off && !wire.drop {
            wire.drop = true;
            changed = true;
        }
    }

    let template = line
        .wires
        .iter()
        .find(|w| !w.drop)
        .or(line.wires.first())
        .cloned();
    let present: HashSet<Phase> = line
        .wires
        .iter()
        .filter(|w| !w.drop)
        .filter_map(|w| w.phase)
        .collect();
    for phase in phases {
        if !present.contains(phase) {
            let mut wire = template.clone().unwrap_or_else(|| Wire::new(*phase));
            wire.phase = Some(*phase);
            wire.drop = false;
            line.wires.push(wire);
            changed = true;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnt_core::{Line, LineType, Load, Node, PowerTransformer, Winding};

    /// Phase-C service transformer feeding a triplex drop and a split load.
    fn center_tap_store() -> Store {
        let mut store = Store::new();
        for name in ["sourcebus", "pole", "tn", "meter"] {
            store.add(Node::new(name));
        }
        store.add(
            Line::new("l_primary", "sourcebus", "pole")
                .with_length(500.0)
                .with_wires(&[Phase::A, Phase::B, Phase::C, Phase::N]),
        );
        store.add(
            PowerTransformer::new("svc_tx", "pole", "tn")
                .as_center_tap()
                .with_windings(vec![
                    Winding::new(7200.0, &[Phase::C]),
                    Winding::new(120.0, &[Phase::S1]),
                    Winding::new(120.0, &[Phase::S2]),
                ]),
        );
        let mut drop_line = Line::new("l_triplex", "tn", "meter")
            .with_length(30.0)
            .with_wires(&[Phase::S1, Phase::S2, Phase::N]);
        drop_line.line_type = Some(LineType::Triplex);
        store.add(drop_line);
        store.add(
            Load::new("ct_load", "meter")
                .with_phase_load(Phase::S1, 3000.0, 1000.0)
                .with_phase_load(Phase::S2, 5000.0, 1400.0),
        );
        store
    }

    #[test]
    fn test_aggregate_power_preserved() {
        let mut store = center_tap_store();
        let outcome = center_tap_load_preprocessing(&mut store, "sourcebus").unwrap();
        assert!(outcome.changed, "{}", outcome.diagnostics);

        let load = store.loads().find(|l| l.name.as_deref() == Some("ct_load")).unwrap();
        let (p, q) = load.total_pq();
        assert!((p - 8000.0).abs() < 1e-9);
        assert!((q - 2400.0).abs() < 1e-9);
        // Re-phased to the transformer's primary phase
        assert_eq!(load.phases(), vec![Phase::C]);
        assert_eq!(load.upstream_transformer_name.as_deref(), Some("svc_tx"));
    }

    #[test]
    fn test_wires_follow_transformer_phases() {
        let mut store = center_tap_store();
        center_tap_load_preprocessing(&mut store, "sourcebus").unwrap();

        let line = store.get_line("l_triplex").unwrap();
        // The whole conductor set follows the transformer, neutral included
        assert_eq!(line.wire_phases(), vec![Phase::C]);
    }

    #[test]
    fn test_primary_lines_untouched() {
        let mut store = center_tap_store();
        center_tap_load_preprocessing(&mut store, "sourcebus").unwrap();
        // l_primary is above the transformer and keeps all phases
        let line = store.get_line("l_primary").unwrap();
        assert_eq!(line.phase_conductors(), vec![Phase::A, Phase::B, Phase::C]);
    }

    #[test]
    fn test_load_without_transformer_warns() {
        let mut store = Store::new();
        store.add(Node::new("sourcebus"));
        store.add(Node::new("n1"));
        store.add(
            Line::new("l1", "sourcebus", "n1")
                .with_length(10.0)
                .with_wires(&[Phase::A]),
        );
        store.add(Load::new("ld", "n1").with_phase_load(Phase::A, 1000.0, 0.0));
        store.set_names().unwrap();
        let outcome = center_tap_load_preprocessing(&mut store, "sourcebus").unwrap();
        assert!(!outcome.changed);
        assert!(outcome.diagnostics.has_warnings());
    }
}
