//! Shared fixtures for unit and integration tests.

use dnt_core::{
    Capacitor, Line, Load, Node, Phase, PhaseCapacitor, PowerSource, PowerTransformer, Regulator,
    Store, Winding, Wire,
};

/// A small radial feeder in the spirit of the IEEE 13-node test case:
/// a 115 kV source behind a substation transformer, a 4.16 kV trunk with
/// one-, two-, and three-phase laterals, a normally-closed switch, a
/// 4.16 kV / 480 V service transformer, spot loads, and capacitor banks.
///
/// Names are assigned and indexed before returning.
pub fn ieee13_feeder() -> Store {
    let mut store = Store::new();

    for name in [
        "sourcebus", "650", "632", "633", "634", "645", "646", "671", "675", "684", "611",
        "652", "680", "692",
    ] {
        store.add(Node::new(name));
    }

    store.add(
        PowerSource::new("source", "sourcebus")
            .as_sourcebus()
            .with_nominal_voltage(115_000.0),
    );
    store.add(
        PowerTransformer::new("sub_xfmr", "sourcebus", "650")
            .as_substation()
            .with_windings(vec![
                Winding::new(115_000.0, &[Phase::A, Phase::B, Phase::C])
                    .with_rated_power(5_000_000.0),
                Winding::new(4_160.0, &[Phase::A, Phase::B, Phase::C])
                    .with_rated_power(5_000_000.0),
            ]),
    );
    let mut regulator = Regulator::new("reg1");
    regulator.connected_transformer = Some("sub_xfmr".into());
    regulator.connected_winding = Some(2);
    store.add(regulator);

    let abcn = [Phase::A, Phase::B, Phase::C, Phase::N];
    let segments: [(&str, &str, &str, f64, &[Phase]); 10] = [
        ("l_650_632", "650", "632", 610.0, &abcn),
        ("l_632_633", "632", "633", 152.0, &abcn),
        ("l_632_645", "632", "645", 152.0, &[Phase::B, Phase::C, Phase::N]),
        ("l_645_646", "645", "646", 91.0, &[Phase::B, Phase::C, Phase::N]),
        ("l_632_671", "632", "671", 610.0, &abcn),
        ("l_671_675", "671", "675", 152.0, &[Phase::A, Phase::B, Phase::C]),
        ("l_671_684", "671", "684", 91.0, &[Phase::A, Phase::C, Phase::N]),
        ("l_684_611", "684", "611", 91.0, &[Phase::C, Phase::N]),
        ("l_684_652", "684", "652", 244.0, &[Phase::A, Phase::N]),
        ("l_671_680", "671", "680", 305.0, &abcn),
    ];
    for (name, from, to, length, phases) in segments {
        store.add(Line::new(name, from, to).with_length(length).with_wires(phases));
    }
    store.add(
        Line::new("sw_671_692", "671", "692")
            .with_wires(&[Phase::A, Phase::B, Phase::C])
            .as_switch(),
    );

    store.add(
        PowerTransformer::new("xfm1", "633", "634").with_windings(vec![
            Winding::new(4_160.0, &[Phase::A, Phase::B, Phase::C]).with_rated_power(500_000.0),
            Winding::new(480.0, &[Phase::A, Phase::B, Phase::C]).with_rated_power(500_000.0),
        ]),
    );

    store.add(
        Load::new("load_634", "634")
            .with_phase_load(Phase::A, 160_000.0, 110_000.0)
            .with_phase_load(Phase::B, 120_000.0, 90_000.0)
            .with_phase_load(Phase::C, 120_000.0, 90_000.0),
    );
    store.add(Load::new("load_645", "645").with_phase_load(Phase::B, 170_000.0, 125_000.0));
    store.add(Load::new("load_646", "646").with_phase_load(Phase::B, 230_000.0, 132_000.0));
    store.add(
        Load::new("load_671", "671")
            .with_phase_load(Phase::A, 385_000.0, 220_000.0)
            .with_phase_load(Phase::B, 385_000.0, 220_000.0)
            .with_phase_load(Phase::C, 385_000.0, 220_000.0),
    );
    store.add(
        Load::new("load_675", "675")
            .with_phase_load(Phase::A, 485_000.0, 190_000.0)
            .with_phase_load(Phase::B, 68_000.0, 60_000.0)
            .with_phase_load(Phase::C, 290_000.0, 212_000.0),
    );
    store.add(Load::new("load_692", "692").with_phase_load(Phase::C, 170_000.0, 151_000.0));
    store.add(Load::new("load_611", "611").with_phase_load(Phase::C, 170_000.0, 80_000.0));
    store.add(Load::new("load_652", "652").with_phase_load(Phase::A, 128_000.0, 86_000.0));

    let mut cap_675 = Capacitor::new("cap_675", "675");
    for phase in [Phase::A, Phase::B, Phase::C] {
        cap_675.phase_capacitors.push(PhaseCapacitor::new(phase, 200_000.0));
    }
    store.add(cap_675);
    let mut cap_611 = Capacitor::new("cap_611", "611");
    cap_611.phase_capacitors.push(PhaseCapacitor::new(Phase::C, 100_000.0));
    store.add(cap_611);

    store.set_names().expect("fixture names are unique");
    store
}

/// A tie line closing the 671 - 675 - 680 loop, normally open.
pub fn loop_tie(open: bool) -> Line {
    let mut tie = Line::new("sw_tie", "675", "680").as_switch();
    tie.wires = [Phase::A, Phase::B, Phase::C]
        .into_iter()
        .map(|p| {
            let wire = Wire::new(p);
            if open {
                wire.open()
            } else {
                wire
            }
        })
        .collect();
    tie
}
