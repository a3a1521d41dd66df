//! Script discovery.
//!
//! Lists the `.sql` files directly inside the script directory, sorted by
//! full path so every listing of the same directory yields the same order.

use crate::error::{Result, SqlRunError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extension of query files (compared ASCII case-insensitively).
pub const SCRIPT_EXTENSION: &str = "sql";

/// A discovered query file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptFile {
    /// Full path to the script.
    pub path: PathBuf,
    /// File name without its extension; output artifacts are named after it.
    pub stem: String,
}

impl ScriptFile {
    /// Creates a script file from its path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, stem }
    }

    /// Returns the file name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns the directory containing the script.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

/// Lists the script files in `dir`, ordered by full path.
///
/// Subdirectories are not searched. An existing directory without scripts
/// yields an empty list.
pub fn discover_scripts(dir: &Path) -> Result<Vec<ScriptFile>> {
    if !dir.is_dir() {
        return Err(SqlRunError::DirectoryNotFound(dir.to_path_buf()));
    }

    let walker = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true);

    let mut scripts = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 means the directory itself could not be read.
            Err(e) if e.depth() == 0 => {
                debug!("Failed to list {}: {}", dir.display(), e);
                return Err(SqlRunError::DirectoryNotFound(dir.to_path_buf()));
            }
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_script(entry.path()) {
            scripts.push(ScriptFile::new(entry.into_path()));
        }
    }

    scripts.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Found {} script(s) in {}", scripts.len(), dir.display());

    Ok(scripts)
}
