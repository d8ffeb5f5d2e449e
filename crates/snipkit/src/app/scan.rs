//! Walking the snippet directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Directory names whose contents are never snippets.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Recursively collect every file under `root` carrying `extension`,
/// skipping version-control metadata directories. The result is sorted so a
/// rebuild processes files in a stable order for a given directory state.
pub fn walk_snippets(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .is_none_or(|name| !VCS_DIRS.contains(&name))
    });

    let mut files = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                let is_file = entry.file_type().is_some_and(|ty| ty.is_file());
                if is_file && entry.path().extension().and_then(OsStr::to_str) == Some(extension) {
                    files.push(entry.into_path());
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "snippet walk error");
            }
        }
    }

    files.sort();
    files
}
