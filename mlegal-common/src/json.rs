//! Persisted placement models, in the same JSON layout the DEF reader's output is exchanged in.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::placement::PlacementModel;

pub fn load_json(path: impl AsRef<Path>) -> Result<PlacementModel> {
    let path = path.as_ref();
    let inf = File::open(path).with_context(|| format!("Failed to open {:?} for reading", path))?;
    serde_json::from_reader(BufReader::new(inf))
        .with_context(|| format!("Failed to parse placement model from {:?}", path))
}

/// Write any serializable value (a model, a snapshot history, a statistics table) as pretty
/// printed JSON.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let outf =
        File::create(path).with_context(|| format!("Failed to create {:?} for writing", path))?;
    let mut outf = BufWriter::new(outf);
    serde_json::to_writer_pretty(&mut outf, value)
        .with_context(|| format!("Failed to serialize to {:?}", path))?;
    outf.flush()
        .with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(())
}
