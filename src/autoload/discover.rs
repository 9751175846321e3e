//! Expansion of autoload roots into the ordered list of files to load.
//!
//! A root ending in the source extension is a single file. Anything else is
//! a directory walked recursively; files come out sorted by name at every
//! level so load order is stable between cycles.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{AutoloadError, AutoloadResult};

pub fn expand_roots(roots: &[PathBuf], extension: &str) -> AutoloadResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.extension() == Some(OsStr::new(extension)) {
            files.push(root.clone());
        } else {
            files.extend(walk(root, extension)?);
        }
    }
    Ok(files)
}

fn walk(root: &Path, extension: &str) -> AutoloadResult<Vec<PathBuf>> {
    if !root.exists() {
        tracing::warn!("[autoload] path does not exist: {}", root.display());
        return Ok(Vec::new());
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true) // Skip dotfiles and dot-directories
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| AutoloadError::Walk {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if path.extension() == Some(OsStr::new(extension)) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}
