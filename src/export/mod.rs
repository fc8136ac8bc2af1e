// src/export/mod.rs
use crate::db::auctions::snapshot;
use crate::db::connection::Database;
use crate::errors::ServerError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write the `limit` most recently updated records to `path` as a JSON array.
///
/// The document is written next to the target and renamed over it, so readers
/// only ever see a complete file. Returns the number of records written.
pub fn export_json(db: &Database, path: &Path, limit: usize) -> Result<usize, ServerError> {
    let auctions = snapshot(db, limit)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| ServerError::Io(format!("create {}: {e}", dir.display())))?;
    }

    let tmp = temp_path(path);
    {
        let file = File::create(&tmp)
            .map_err(|e| ServerError::Io(format!("create {}: {e}", tmp.display())))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &auctions)
            .map_err(|e| ServerError::Serialize(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| ServerError::Io(format!("write {}: {e}", tmp.display())))?;
    }

    fs::rename(&tmp, path)
        .map_err(|e| ServerError::Io(format!("replace {}: {e}", path.display())))?;

    tracing::info!(count = auctions.len(), path = %path.display(), "Exported auctions");
    Ok(auctions.len())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "auctions.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
