//! Watched file set and the directories needed to observe it.
//!
//! Editors replace files by atomic rename, so watching a file directly
//! loses track of it after the first save. The notify watcher watches
//! parent directories instead and filters events through this registry.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PathRegistry {
    paths: HashSet<PathBuf>,
    watch_dirs: BTreeSet<PathBuf>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry over `paths`.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut registry = Self::new();
        for path in paths {
            registry.add(path);
        }
        registry
    }

    /// Track `path`. Returns its parent directory when that directory is new.
    pub fn add(&mut self, path: PathBuf) -> Option<PathBuf> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !self.paths.insert(path) {
            return None;
        }
        self.watch_dirs.insert(parent.clone()).then_some(parent)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Directories to watch, sorted.
    pub fn watch_dirs(&self) -> impl Iterator<Item = &Path> {
        self.watch_dirs.iter().map(PathBuf::as_path)
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn dir_count(&self) -> usize {
        self.watch_dirs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_computes_unique_dirs() {
        let registry = PathRegistry::from_paths(vec![
            PathBuf::from("/app/models/user.rb"),
            PathBuf::from("/app/models/post.rb"),
            PathBuf::from("/app/services/mailer.rb"),
        ]);

        assert_eq!(registry.path_count(), 3);
        assert_eq!(registry.dir_count(), 2);
        let dirs: Vec<&Path> = registry.watch_dirs().collect();
        assert_eq!(
            dirs,
            vec![Path::new("/app/models"), Path::new("/app/services")]
        );
        assert!(registry.contains(Path::new("/app/models/user.rb")));
        assert!(!registry.contains(Path::new("/app/models/other.rb")));
    }

    #[test]
    fn test_add_reports_new_dirs_once() {
        let mut registry = PathRegistry::new();

        assert_eq!(
            registry.add(PathBuf::from("/app/a.rb")),
            Some(PathBuf::from("/app"))
        );
        assert_eq!(registry.add(PathBuf::from("/app/b.rb")), None);
        assert_eq!(registry.add(PathBuf::from("/app/a.rb")), None);
    }

    #[test]
    fn test_root_level_files_watch_current_dir() {
        let mut registry = PathRegistry::new();
        assert_eq!(
            registry.add(PathBuf::from("boot.rb")),
            Some(PathBuf::from("."))
        );
    }
}
