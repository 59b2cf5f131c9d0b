//! Consistency-suite behavior on the 13-node fixture feeder.

use dnt_algo::checks::{
    check_loads_connected, check_loops, check_matched_phases, check_transformer_phase_path,
    check_unique_path,
};
use dnt_algo::test_utils::{ieee13_feeder, loop_tie};
use dnt_core::Entity;

const SOURCE: &str = "sourcebus";

#[test]
fn feeder_is_loop_free_with_switches_closed() {
    let store = ieee13_feeder();
    let outcome = check_loops(&store, SOURCE).unwrap();
    assert!(outcome.passed, "{}", outcome.diagnostics);
}

#[test]
fn closed_tie_switch_induces_a_reported_loop() {
    let mut store = ieee13_feeder();
    store.add(loop_tie(false));
    store.set_names().unwrap();

    let outcome = check_loops(&store, SOURCE).unwrap();
    assert!(!outcome.passed);
    let report = outcome.diagnostics.to_string();
    assert!(report.contains("loop detected"), "{report}");
    for node in ["671", "675", "680"] {
        assert!(report.contains(node), "cycle report misses {node}: {report}");
    }
}

#[test]
fn open_tie_switch_keeps_the_feeder_radial() {
    let mut store = ieee13_feeder();
    store.add(loop_tie(true));
    store.set_names().unwrap();
    assert!(check_loops(&store, SOURCE).unwrap().passed);
    assert!(check_unique_path(&store, SOURCE).unwrap().passed);
}

#[test]
fn all_loads_are_fed_by_the_single_source() {
    let store = ieee13_feeder();
    let outcome = check_loads_connected(&store, SOURCE).unwrap();
    assert!(outcome.passed, "{}", outcome.diagnostics);
}

#[test]
fn opening_a_spur_switch_orphans_its_loads() {
    let mut store = ieee13_feeder();
    if let Entity::Line(switch) = store.get_mut("sw_671_692").unwrap() {
        for wire in &mut switch.wires {
            wire.is_open = true;
        }
    }
    store.set_names().unwrap();

    let outcome = check_loads_connected(&store, SOURCE).unwrap();
    assert!(!outcome.passed);
    let orphaned: Vec<_> = outcome
        .diagnostics
        .errors()
        .filter_map(|i| i.entity.as_deref())
        .collect();
    assert_eq!(orphaned, vec!["load_692"]);
}

#[test]
fn every_load_has_a_unique_path() {
    let store = ieee13_feeder();
    let outcome = check_unique_path(&store, SOURCE).unwrap();
    assert!(outcome.passed, "{}", outcome.diagnostics);
}

#[test]
fn winding_phases_agree_on_fixture_transformers() {
    let store = ieee13_feeder();
    let outcome = check_matched_phases(&store).unwrap();
    assert!(outcome.passed, "{}", outcome.diagnostics);
}

#[test]
fn phase_paths_are_consistent() {
    let store = ieee13_feeder();
    let outcome = check_transformer_phase_path(&store, SOURCE, false).unwrap();
    assert!(outcome.passed, "{}", outcome.diagnostics);
}

#[test]
fn checks_leave_the_store_untouched() {
    let store = ieee13_feeder();
    let epoch = store.epoch();
    check_loops(&store, SOURCE).unwrap();
    check_loads_connected(&store, SOURCE).unwrap();
    check_unique_path(&store, SOURCE).unwrap();
    check_matched_phases(&store).unwrap();
    check_transformer_phase_path(&store, SOURCE, false).unwrap();
    assert_eq!(store.epoch(), epoch);
}

#[test]
fn check_reports_are_deterministic() {
    let store = ieee13_feeder();
    let a = check_loops(&store, SOURCE).unwrap();
    let b = check_loops(&store, SOURCE).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
