//! The entity container: insertion-ordered storage, a name index rebuilt by
//! [`Store::set_names`], and an epoch counter that invalidates graph views.
//!
//! The name index lives beside the entities rather than inside them, so
//! entities can reference each other by string keys without ownership
//! cycles, and soft deletion stays a pure scan.

use std::collections::{HashMap, HashSet};

use crate::error::{DntError, DntResult};
use crate::model::{
    Capacitor, Entity, EntityKind, FeederMetadata, Line, Load, Node, PowerSource,
    PowerTransformer, Regulator,
};

/// Owns every entity of a model.
///
/// Iteration follows insertion order. Name lookup requires a prior
/// [`Store::set_names`] call; structural mutation advances the epoch and
/// stales any network built from the previous state.
#[derive(Debug, Default)]
pub struct Store {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    names_set: bool,
    epoch: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity. Invalidates the name index until the next
    /// `set_names()`.
    pub fn add(&mut self, entity: impl Into<Entity>) {
        self.entities.push(entity.into());
        self.names_set = false;
        self.epoch += 1;
    }

    /// Assign generated names to unnamed entities and rebuild the name
    /// index. Two entities declaring the same name is a structural error.
    ///
    /// Generated `<label>_<ordinal>` names skip ordinals an entity
    /// already claims literally, so declared names never collide with
    /// generated ones.
    pub fn set_names(&mut self) -> DntResult<()> {
        let mut taken: HashSet<String> = self
            .entities
            .iter()
            .filter_map(|e| e.name())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        let mut counters: HashMap<EntityKind, usize> = HashMap::new();
        for entity in &mut self.entities {
            if entity.name().map(|n| n.is_empty()).unwrap_or(true) {
                let ordinal = counters.entry(entity.kind()).or_insert(0);
                let name = loop {
                    *ordinal += 1;
                    let candidate = format!("{}_{}", entity.kind().label(), ordinal);
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                };
                taken.insert(name.clone());
                entity.set_name(name);
            }
        }

        let mut index = HashMap::with_capacity(self.entities.len());
        for (i, entity) in self.entities.iter().enumerate() {
            let name = entity.name().unwrap_or_default().to_string();
            if index.insert(name.clone(), i).is_some() {
                return Err(DntError::Duplicate(name));
            }
        }

        self.index = index;
        self.names_set = true;
        self.epoch += 1;
        Ok(())
    }

    /// Whether `set_names()` has run since the last structural change.
    pub fn names_set(&self) -> bool {
        self.names_set
    }

    /// Current mutation epoch. Networks record this at build time.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by name.
    pub fn get(&self, name: &str) -> DntResult<&Entity> {
        if !self.names_set {
            return Err(DntError::Validation(
                "name lookup before set_names()".into(),
            ));
        }
        self.index
            .get(name)
            .map(|&i| &self.entities[i])
            .ok_or_else(|| DntError::NotFound(name.to_string()))
    }

    /// Look up an entity by name for mutation. Advances the epoch.
    pub fn get_mut(&mut self, name: &str) -> DntResult<&mut Entity> {
        if !self.names_set {
            return Err(DntError::Validation(
                "name lookup before set_names()".into(),
            ));
        }
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| DntError::NotFound(name.to_string()))?;
        self.epoch += 1;
        Ok(&mut self.entities[i])
    }

    /// True when `name` resolves to an entity.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate all entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Iterate all entities mutably. Advances the epoch.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.epoch += 1;
        self.entities.iter_mut()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn transformers(&self) -> impl Iterator<Item = &PowerTransformer> {
        self.entities.iter().filter_map(|e| match e {
            Entity::PowerTransformer(t) => Some(t),
            _ => None,
        })
    }

    pub fn regulators(&self) -> impl Iterator<Item = &Regulator> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Regulator(r) => Some(r),
            _ => None,
        })
    }

    pub fn loads(&self) -> impl Iterator<Item = &Load> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Load(l) => Some(l),
            _ => None,
        })
    }

    pub fn capacitors(&self) -> impl Iterator<Item = &Capacitor> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Capacitor(c) => Some(c),
            _ => None,
        })
    }

    pub fn sources(&self) -> impl Iterator<Item = &PowerSource> {
        self.entities.iter().filter_map(|e| match e {
            Entity::PowerSource(s) => Some(s),
            _ => None,
        })
    }

    pub fn feeder_metadata(&self) -> impl Iterator<Item = &FeederMetadata> {
        self.entities.iter().filter_map(|e| match e {
            Entity::FeederMetadata(f) => Some(f),
            _ => None,
        })
    }

    /// Mutable iteration over loads. Advances the epoch.
    pub fn loads_mut(&mut self) -> impl Iterator<Item = &mut Load> {
        self.epoch += 1;
        self.entities.iter_mut().filter_map(|e| match e {
            Entity::Load(l) => Some(l),
            _ => None,
        })
    }

    /// Mutable iteration over transformers. Advances the epoch.
    pub fn transformers_mut(&mut self) -> impl Iterator<Item = &mut PowerTransformer> {
        self.epoch += 1;
        self.entities.iter_mut().filter_map(|e| match e {
            Entity::PowerTransformer(t) => Some(t),
            _ => None,
        })
    }

    /// Look up a node by name, failing on kind mismatch.
    pub fn get_node(&self, name: &str) -> DntResult<&Node> {
        match self.get(name)? {
            Entity::Node(n) => Ok(n),
            other => Err(DntError::Validation(format!(
                "'{name}' is a {}, expected a node",
                other.kind()
            ))),
        }
    }

    /// Look up a transformer by name, failing on kind mismatch.
    pub fn get_transformer(&self, name: &str) -> DntResult<&PowerTransformer> {
        match self.get(name)? {
            Entity::PowerTransformer(t) => Ok(t),
            other => Err(DntError::Validation(format!(
                "'{name}' is a {}, expected a transformer",
                other.kind()
            ))),
        }
    }

    /// Look up a line by name, failing on kind mismatch.
    pub fn get_line(&self, name: &str) -> DntResult<&Line> {
        match self.get(name)? {
            Entity::Line(l) => Ok(l),
            other => Err(DntError::Validation(format!(
                "'{name}' is a {}, expected a line",
                other.kind()
            ))),
        }
    }
}
