//! The reader and writer contracts format adapters implement.

use std::collections::BTreeMap;

use serde::Serialize;

use dnt_core::{Diagnostics, DntResult, EntityKind, Store};

/// Per-kind entity tally for read/write reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCounts(BTreeMap<&'static str, usize>);

impl EntityCounts {
    pub fn record(&mut self, kind: EntityKind) {
        *self.0.entry(kind.label()).or_insert(0) += 1;
    }

    pub fn get(&self, kind: EntityKind) -> usize {
        self.0.get(kind.label()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

impl std::fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (label, count) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{count} {label}")?;
            first = false;
        }
        if first {
            write!(f, "nothing")?;
        }
        Ok(())
    }
}

/// What a reader produced: per-kind counts plus anything unusual met on
/// the way in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadSummary {
    pub counts: EntityCounts,
    pub diagnostics: Diagnostics,
}

/// What a writer emitted. `skipped_dropped` counts soft-deleted entities
/// honoured by omission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub written: EntityCounts,
    pub skipped_dropped: usize,
    pub diagnostics: Diagnostics,
}

/// A format adapter that populates a store.
///
/// Implementations construct entities, add them to the store, and finish
/// with `store.set_names()` so name lookup works immediately after.
pub trait Reader {
    fn read(&mut self, store: &mut Store) -> DntResult<ReadSummary>;
}

/// A format adapter that consumes a store.
///
/// `set_names()` must have run on the store. Implementations skip
/// entities, wires, and phase components carrying the drop flag, and
/// never mutate the store or its graph views.
pub trait Writer {
    fn write(&mut self, store: &Store) -> DntResult<WriteSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_tally_and_display() {
        let mut counts = EntityCounts::default();
        counts.record(EntityKind::Node);
        counts.record(EntityKind::Node);
        counts.record(EntityKind::Load);

        assert_eq!(counts.get(EntityKind::Node), 2);
        assert_eq!(counts.get(EntityKind::Line), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.to_string(), "1 load, 2 node");
    }

    #[test]
    fn test_empty_counts_display() {
        assert_eq!(EntityCounts::default().to_string(), "nothing");
    }
}
