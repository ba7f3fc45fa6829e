//! Read-only filesystem probes for protected-path previews.

use std::fs;
use std::path::Path;

use tracing::trace;

/// List up to `limit` entries affected by an operation on `path`.
///
/// Directories yield sorted entry names, anything else yields the path
/// itself. Probe failures yield nothing.
pub(crate) fn preview_entries(path: &Path, limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "Preview probe failed");
            return Vec::new();
        }
    };

    if !metadata.is_dir() {
        return vec![path.display().to_string()];
    }

    match fs::read_dir(path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names.truncate(limit);
            names
        }
        Err(e) => {
            trace!(path = %path.display(), error = %e, "Preview listing failed");
            Vec::new()
        }
    }
}
