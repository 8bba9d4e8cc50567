//! JSON file I/O with atomic writes
//!
//! Every failure here is reported as a data store (transport) error: the
//! services above treat the file store exactly like a remote one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AgendaError;

fn transport(action: &str, path: &Path, err: impl std::fmt::Display) -> AgendaError {
    AgendaError::Transport(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// Read JSON from a file, returning the default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, AgendaError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| transport("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| transport("parse", path, e))
}

/// Write JSON to a file atomically (write to a sibling temp file, then rename)
///
/// The target is either fully replaced or left untouched.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AgendaError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| transport("create directory for", path, e))?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| transport("create", &temp_path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| transport("serialize", path, e))?;
    writer.flush().map_err(|e| transport("flush", path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| transport("sync", path, e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        transport("replace", path, e)
    })
}
