//! Reference JSON adapter.
//!
//! One document, one model: a `format` marker, a schema `version`, and
//! the entity list in store order. Entities serialize through the tagged
//! [`Entity`] union, so this adapter doubles as the template for new
//! format adapters: parse, add, `set_names()`, validate.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use dnt_core::{DntError, DntResult, Entity, Store};

use crate::contract::{ReadSummary, Reader, WriteSummary, Writer};
use crate::validate::validate_references;

const FORMAT: &str = "dnt-model";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelDocument {
    format: String,
    version: u32,
    entities: Vec<Entity>,
}

/// Reads a JSON model document into a store.
pub struct JsonReader<R: Read> {
    source: R,
}

impl JsonReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> DntResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> JsonReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: Read> Reader for JsonReader<R> {
    fn read(&mut self, store: &mut Store) -> DntResult<ReadSummary> {
        let mut text = String::new();
        self.source.read_to_string(&mut text)?;
        let document: ModelDocument =
            serde_json::from_str(&text).map_err(|e| DntError::Parse(e.to_string()))?;

        if document.format != FORMAT {
            return Err(DntError::Parse(format!(
                "unexpected document format '{}'",
                document.format
            )));
        }
        let mut summary = ReadSummary::default();
        if document.version > VERSION {
            summary.diagnostics.add_warning(
                "format",
                &format!(
                    "document version {} is newer than supported {VERSION}",
                    document.version
                ),
            );
        }

        for entity in document.entities {
            summary.counts.record(entity.kind());
            store.add(entity);
        }
        store.set_names()?;
        summary.diagnostics.merge(validate_references(store)?);
        Ok(summary)
    }
}

/// Writes a store as a JSON model document, dropping soft-deleted
/// entities and sub-components on the way out.
pub struct JsonWriter<W: std::io::Write> {
    sink: W,
    pretty: bool,
}

impl JsonWriter<BufWriter<File>> {
    pub fn to_path(path: impl AsRef<Path>) -> DntResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: std::io::Write> JsonWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, pretty: false }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl<W: std::io::Write> Writer for JsonWriter<W> {
    fn write(&mut self, store: &Store) -> DntResult<WriteSummary> {
        if !store.names_set() {
            return Err(DntError::Validation(
                "write requires set_names() on the store".into(),
            ));
        }

        let mut summary = WriteSummary::default();
        let mut entities = Vec::with_capacity(store.len());
        for entity in store.iter() {
            if entity.is_dropped() {
                summary.skipped_dropped += 1;
                continue;
            }
            summary.written.record(entity.kind());
            entities.push(strip_dropped(entity.clone()));
        }

        let document = ModelDocument {
            format: FORMAT.to_string(),
            version: VERSION,
            entities,
        };
        let text = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .map_err(|e| DntError::Parse(e.to_string()))?;
        self.sink.write_all(text.as_bytes())?;
        self.sink.flush()?;
        Ok(summary)
    }
}

/// Remove dropped wires, phase loads, and phase capacitors from a clone
/// headed for the sink.
fn strip_dropped(mut entity: Entity) -> Entity {
    match &mut entity {
        Entity::Line(line) => line.wires.retain(|w| !w.drop),
        Entity::Load(load) => load.phase_loads.retain(|pl| !pl.drop),
        Entity::Capacitor(cap) => cap.phase_capacitors.retain(|pc| !pc.drop),
        _ => {}
    }
    entity
}
