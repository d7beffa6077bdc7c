use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Serialize `value` as pretty JSON with a trailing newline.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut s = serde_json::to_string_pretty(value)?;
    if !s.ends_with('\n') {
        s.push('\n');
    }
    Ok(s)
}

/// Write `value` as JSON to `target_path` atomically.
///
/// The content goes to a temp file in the target's directory, which is then
/// renamed over the target. Readers see either the old file or the new one,
/// never a partial write.
pub fn write_json_atomic<T: Serialize>(value: &T, target_path: &Path) -> Result<()> {
    let json = to_json_pretty(value)?;

    let parent = target_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Target path has no parent directory: {:?}", target_path))?;

    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {:?}", parent))?;

    // Same directory keeps the rename on one filesystem
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(json.as_bytes())?;
    temp.flush()?;

    temp.persist(target_path)
        .with_context(|| format!("Failed to replace {:?}", target_path))?;

    debug!("Wrote {} bytes to {:?}", json.len(), target_path);
    Ok(())
}
