//! Typed records for every network element, plus the tagged [`Entity`]
//! union the store and writers dispatch over.
//!
//! Attribute conventions shared by every kind:
//! - `name` is assigned at construction or lazily by [`Store::set_names`]
//!   (crate::store::Store::set_names).
//! - `substation_name` / `feeder_name` are filled by feeder partitioning.
//! - `drop` marks soft deletion; consumers skip dropped entities, wires,
//!   and phase components.
//! - Physical quantities are in base units: volts, amperes, ohms, watts,
//!   vars, meters, degrees.

mod feeder;
mod line;
mod load;
mod node;
mod shunt;
mod transformer;

pub use feeder::FeederMetadata;
pub use line::{Line, LineType, Wire};
pub use load::{Load, LoadModel, PhaseLoad};
pub use node::Node;
pub use shunt::{Capacitor, PhaseCapacitor, PowerSource};
pub use transformer::{
    ConnectionType, PhaseWinding, PowerTransformer, Regulator, VoltageType, Winding,
};

use serde::{Deserialize, Serialize};

/// A geographic position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub long: f64,
    pub lat: f64,
    pub elevation: f64,
}

/// Discriminant for [`Entity`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Node,
    Line,
    PowerTransformer,
    Regulator,
    Load,
    Capacitor,
    PowerSource,
    FeederMetadata,
}

impl EntityKind {
    /// Lowercase label used for generated names and reporting.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Line => "line",
            EntityKind::PowerTransformer => "transformer",
            EntityKind::Regulator => "regulator",
            EntityKind::Load => "load",
            EntityKind::Capacitor => "capacitor",
            EntityKind::PowerSource => "source",
            EntityKind::FeederMetadata => "feeder_metadata",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Tagged union over every entity kind.
///
/// Exhaustive matching here is deliberate: writer dispatch and store
/// iteration must handle each kind, and adding a variant should break
/// every consumer until it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    Node(Node),
    Line(Line),
    PowerTransformer(PowerTransformer),
    Regulator(Regulator),
    Load(Load),
    Capacitor(Capacitor),
    PowerSource(PowerSource),
    FeederMetadata(FeederMetadata),
}

impl Entity {
    /// The kind tag of this entity.
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Line(_) => EntityKind::Line,
            Entity::PowerTransformer(_) => EntityKind::PowerTransformer,
            Entity::Regulator(_) => EntityKind::Regulator,
            Entity::Load(_) => EntityKind::Load,
            Entity::Capacitor(_) => EntityKind::Capacitor,
            Entity::PowerSource(_) => EntityKind::PowerSource,
            Entity::FeederMetadata(_) => EntityKind::FeederMetadata,
        }
    }

    /// The entity's name, if assigned.
    pub fn name(&self) -> Option<&str> {
        match self {
            Entity::Node(e) => e.name.as_deref(),
            Entity::Line(e) => e.name.as_deref(),
            Entity::PowerTransformer(e) => e.name.as_deref(),
            Entity::Regulator(e) => e.name.as_deref(),
            Entity::Load(e) => e.name.as_deref(),
            Entity::Capacitor(e) => e.name.as_deref(),
            Entity::PowerSource(e) => e.name.as_deref(),
            Entity::FeederMetadata(e) => e.name.as_deref(),
        }
    }

    /// Assign or overwrite the entity's name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = Some(name.into());
        match self {
            Entity::Node(e) => e.name = name,
            Entity::Line(e) => e.name = name,
            Entity::PowerTransformer(e) => e.name = name,
            Entity::Regulator(e) => e.name = name,
            Entity::Load(e) => e.name = name,
            Entity::Capacitor(e) => e.name = name,
            Entity::PowerSource(e) => e.name = name,
            Entity::FeederMetadata(e) => e.name = name,
        }
    }

    /// Soft-deletion state.
    pub fn is_dropped(&self) -> bool {
        match self {
            Entity::Node(e) => e.drop,
            Entity::Line(e) => e.drop,
            Entity::PowerTransformer(e) => e.drop,
            Entity::Regulator(e) => e.drop,
            Entity::Load(e) => e.drop,
            Entity::Capacitor(e) => e.drop,
            Entity::PowerSource(e) => e.drop,
            Entity::FeederMetadata(e) => e.drop,
        }
    }

    /// The node names this entity attaches to: both endpoints for series
    /// equipment, the connecting element for shunts, nothing for metadata.
    pub fn connected_nodes(&self) -> Vec<&str> {
        match self {
            Entity::Node(_) | Entity::FeederMetadata(_) => Vec::new(),
            Entity::Line(e) => [e.from_element.as_deref(), e.to_element.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
            Entity::PowerTransformer(e) => [e.from_element.as_deref(), e.to_element.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
            Entity::Regulator(e) => [e.from_element.as_deref(), e.to_element.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
            Entity::Load(e) => e.connecting_element.as_deref().into_iter().collect(),
            Entity::Capacitor(e) => e.connecting_element.as_deref().into_iter().collect(),
            Entity::PowerSource(e) => e.connecting_element.as_deref().into_iter().collect(),
        }
    }

    /// True for shunt entities linked to the graph by a degenerate edge.
    pub fn is_shunt(&self) -> bool {
        matches!(
            self,
            Entity::Load(_) | Entity::Capacitor(_) | Entity::PowerSource(_)
        )
    }

    pub fn substation_name(&self) -> Option<&str> {
        match self {
            Entity::Node(e) => e.substation_name.as_deref(),
            Entity::Line(e) => e.substation_name.as_deref(),
            Entity::PowerTransformer(e) => e.substation_name.as_deref(),
            Entity::Regulator(e) => e.substation_name.as_deref(),
            Entity::Load(e) => e.substation_name.as_deref(),
            Entity::Capacitor(e) => e.substation_name.as_deref(),
            Entity::PowerSource(e) => e.substation_name.as_deref(),
            Entity::FeederMetadata(e) => e.substation_name.as_deref(),
        }
    }

    pub fn set_substation_name(&mut self, substation: impl Into<String>) {
        let substation = Some(substation.into());
        match self {
            Entity::Node(e) => e.substation_name = substation,
            Entity::Line(e) => e.substation_name = substation,
            Entity::PowerTransformer(e) => e.substation_name = substation,
            Entity::Regulator(e) => e.substation_name = substation,
            Entity::Load(e) => e.substation_name = substation,
            Entity::Capacitor(e) => e.substation_name = substation,
            Entity::PowerSource(e) => e.substation_name = substation,
            Entity::FeederMetadata(e) => e.substation_name = substation,
        }
    }

    pub fn feeder_name(&self) -> Option<&str> {
        match self {
            Entity::Node(e) => e.feeder_name.as_deref(),
            Entity::Line(e) => e.feeder_name.as_deref(),
            Entity::PowerTransformer(e) => e.feeder_name.as_deref(),
            Entity::Regulator(e) => e.feeder_name.as_deref(),
            Entity::Load(e) => e.feeder_name.as_deref(),
            Entity::Capacitor(e) => e.feeder_name.as_deref(),
            Entity::PowerSource(e) => e.feeder_name.as_deref(),
            Entity::FeederMetadata(e) => e.feeder_name.as_deref(),
        }
    }

    pub fn set_feeder_name(&mut self, feeder: impl Into<String>) {
        let feeder = Some(feeder.into());
        match self {
            Entity::Node(e) => e.feeder_name = feeder,
            Entity::Line(e) => e.feeder_name = feeder,
            Entity::PowerTransformer(e) => e.feeder_name = feeder,
            Entity::Regulator(e) => e.feeder_name = feeder,
            Entity::Load(e) => e.feeder_name = feeder,
            Entity::Capacitor(e) => e.feeder_name = feeder,
            Entity::PowerSource(e) => e.feeder_name = feeder,
            Entity::FeederMetadata(e) => e.feeder_name = feeder,
        }
    }
}

macro_rules! impl_entity_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Entity {
            fn from(value: $ty) -> Self {
                Entity::$variant(value)
            }
        }
    };
}

impl_entity_from!(Node, Node);
impl_entity_from!(Line, Line);
impl_entity_from!(PowerTransformer, PowerTransformer);
impl_entity_from!(Regulator, Regulator);
impl_entity_from!(Load, Load);
impl_entity_from!(Capacitor, Capacitor);
impl_entity_from!(PowerSource, PowerSource);
impl_entity_from!(FeederMetadata, FeederMetadata);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    #[test]
    fn test_entity_kind_and_name() {
        let entity: Entity = Node::new("650").into();
        assert_eq!(entity.kind(), EntityKind::Node);
        assert_eq!(entity.name(), Some("650"));
    }

    #[test]
    fn test_connected_nodes() {
        let line: Entity = Line::new("l1", "650", "632").into();
        assert_eq!(line.connected_nodes(), vec!["650", "632"]);

        let load: Entity = Load::new("load_634", "634").into();
        assert_eq!(load.connected_nodes(), vec!["634"]);
        assert!(load.is_shunt());

        let node: Entity = Node::new("650").into();
        assert!(node.connected_nodes().is_empty());
    }

    #[test]
    fn test_set_name() {
        let mut entity: Entity = Load::new("x", "634").into();
        entity.set_name("load_1");
        assert_eq!(entity.name(), Some("load_1"));
    }

    #[test]
    fn test_serde_tagged_roundtrip() {
        let entity: Entity = Node::new("632")
            .with_phases(&[Phase::A, Phase::B, Phase::C])
            .into();
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"kind\":\"Node\""));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), Some("632"));
    }
}
