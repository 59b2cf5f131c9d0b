//! Winding phase agreement on every transformer.

use std::collections::HashSet;

use dnt_core::{Diagnostics, DntResult, Phase, PowerTransformer, Store};

use super::CheckOutcome;

/// Pure store scan, no graph needed. Two-winding units must keep the
/// first winding's phase set within the second's; center-tap units must
/// carry identical two-phase secondaries.
pub fn check_matched_phases(store: &Store) -> DntResult<CheckOutcome> {
    let mut diag = Diagnostics::new();

    for tx in store.transformers().filter(|t| !t.drop) {
        let Some(name) = tx.name.as_deref() else {
            continue;
        };
        match tx.windings.len() {
            2 => check_two_winding(tx, name, &mut diag),
            3 => check_center_tap(tx, name, &mut diag),
            n => diag.add_warning_with_entity(
                "phase",
                &format!("transformer has {n} windings; phase matching skipped"),
                name,
            ),
        }
    }

    Ok(CheckOutcome::from_diagnostics(diag))
}

fn phase_set(tx: &PowerTransformer, winding: usize) -> HashSet<Phase> {
    tx.windings[winding]
        .phases()
        .into_iter()
        .filter(|p| !p.is_neutral())
        .collect()
}

fn check_two_winding(tx: &PowerTransformer, name: &str, diag: &mut Diagnostics) {
    let first = phase_set(tx, 0);
    let second = phase_set(tx, 1);
    if !first.is_subset(&second) {
        diag.add_error_with_entity(
            "phase",
            &format!(
                "winding 1 phases {:?} are not a subset of winding 2 phases {:?}",
                sorted(&first),
                sorted(&second)
            ),
            name,
        );
    }
}

fn check_center_tap(tx: &PowerTransformer, name: &str, diag: &mut Diagnostics) {
    let primary = phase_set(tx, 0);
    let mid = phase_set(tx, 1);
    let tail = phase_set(tx, 2);

    if primary.len() > 2 {
        diag.add_error_with_entity(
            "phase",
            &format!(
                "center-tap primary carries {} phases; at most two expected",
                primary.len()
            ),
            name,
        );
    }
    if mid != tail {
        diag.add_error_with_entity(
            "phase",
            &format!(
                "center-tap secondary windings disagree: {:?} vs {:?}",
                sorted(&mid),
                sorted(&tail)
            ),
            name,
        );
    } else if mid.len() > 2 {
        diag.add_error_with_entity(
            "phase",
            &format!(
                "center-tap secondary carries {} phases; at most two expected",
                mid.len()
            ),
            name,
        );
    }
}

fn sorted(set: &HashSet<Phase>) -> Vec<Phase> {
    let mut phases: Vec<Phase> = set.iter().copied().collect();
    phases.sort();
    phases
}
