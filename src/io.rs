//! JSON batch file exchange
//!
//! Outputs are written to a sibling temp file and renamed into place, so a
//! stage that fails never leaves a partial output file behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Read and parse a JSON file. Unparseable content is malformed input.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw)
        .map_err(|e| AnalysisError::MalformedInput(format!("{}: {}", path.display(), e)))
}

/// Like [`read_json`], but a missing file yields `T::default()`
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    let temp_file = temp_path(path);

    fs::write(&temp_file, data)?;
    if let Err(e) = fs::rename(&temp_file, path) {
        let _ = fs::remove_file(&temp_file);
        return Err(e.into());
    }

    Ok(())
}

/// Replace several files as one unit.
///
/// Every value is first written to its sibling temp file. Renaming starts only
/// once all temp files exist and no destination is a directory. If a rename
/// still fails, outputs created by this call are removed again.
pub fn write_json_all_atomic<T: Serialize>(outputs: &[(&Path, &T)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());

    for (path, value) in outputs {
        let temp_file = temp_path(path);
        let written = serde_json::to_vec_pretty(value)
            .map_err(AnalysisError::from)
            .and_then(|data| fs::write(&temp_file, data).map_err(AnalysisError::from));
        if let Err(e) = written {
            discard(&staged);
            let _ = fs::remove_file(&temp_file);
            return Err(e);
        }
        staged.push((temp_file, *path));
    }

    if let Some((_, path)) = staged.iter().find(|(_, path)| path.is_dir()) {
        let e = std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} is a directory", path.display()),
        );
        discard(&staged);
        return Err(e.into());
    }

    let mut created: Vec<&Path> = Vec::new();
    for (i, (temp_file, path)) in staged.iter().enumerate() {
        let existed = path.exists();
        if let Err(e) = fs::rename(temp_file, path) {
            discard(&staged[i..]);
            for path in created {
                let _ = fs::remove_file(path);
            }
            return Err(e.into());
        }
        if !existed {
            created.push(*path);
        }
    }

    Ok(())
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (temp_file, _) in staged {
        let _ = fs::remove_file(temp_file);
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
