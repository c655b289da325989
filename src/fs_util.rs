use std::fs;
use std::io::Write;

use camino::Utf8Path;
use tempfile::Builder;

use crate::error::PipelineError;

pub fn ensure_dir(path: &Utf8Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| PipelineError::Filesystem(format!("create dir {path}: {err}")))
}

pub fn ensure_parent(path: &Utf8Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Replaces `path` with `content` through a sibling temp file, so readers
/// never observe a half-written file.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut temp = Builder::new()
        .prefix(".actseek-pipeline")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| PipelineError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| PipelineError::Filesystem(format!("write {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| PipelineError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}
