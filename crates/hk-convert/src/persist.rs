//! Persisted context files: a JSON array of entity wire records that
//! includes the context's own record `<iri>`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use hk_graph::Entity;
use hk_ontology::HkoContext;
use serde_json::Value;
use tracing::debug;

use crate::constants::encode_iri;
use crate::error::{ConvertError, Result};
use crate::reader::{context_from_entities, ReadReport, Reader, ReaderConfig};
use crate::writer::{Writer, WriterConfig};

/// Rebuilds the context `iri` from decoded entities.
pub fn context_from_records(
    entities: &[Entity],
    iri: &str,
    config: &ReaderConfig,
) -> Result<(HkoContext, ReadReport)> {
    let id = encode_iri(iri);
    let reference =
        context_from_entities(entities, &id).ok_or(ConvertError::MissingContext { id })?;
    let mut context = HkoContext::new(reference);
    let report = Reader::new(config.clone()).read_into_context(entities, &mut context)?;
    Ok((context, report))
}

pub fn save_context(path: impl AsRef<Path>, context: &HkoContext, config: &WriterConfig) -> anyhow::Result<()> {
    let path = path.as_ref();
    let records: Vec<Value> = Writer::new(config.clone())
        .write_context(context)
        .iter()
        .map(Entity::to_record)
        .collect();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    debug!(path = %path.display(), records = records.len(), "context saved");
    Ok(())
}

pub fn load_context(
    path: impl AsRef<Path>,
    iri: &str,
    config: &ReaderConfig,
) -> anyhow::Result<(HkoContext, ReadReport)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    let entities = records
        .into_iter()
        .map(Entity::from_record)
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("decoding records of {}", path.display()))?;
    let loaded = context_from_records(&entities, iri, config)?;
    debug!(
        path = %path.display(),
        elements = loaded.0.len(),
        skipped = loaded.1.skipped.len(),
        "context loaded"
    );
    Ok(loaded)
}
