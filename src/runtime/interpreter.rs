//! Executes unit scripts into a shared `ModuleSpace`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::parser::{self, Stmt};
use super::space::ModuleSpace;
use crate::error::{LoadError, NameError};
use crate::host::{DependencyCache, SourceExecutor};
use crate::types::{EntityId, SEPARATOR};

pub const DEFAULT_EXTENSION: &str = "rb";

pub struct Interpreter {
    space: Arc<ModuleSpace>,
    extension: String,
    /// Files already executed in this cache generation. `require` skips them.
    loaded: Mutex<HashSet<PathBuf>>,
}

impl Interpreter {
    pub fn new(space: Arc<ModuleSpace>) -> Self {
        Self::with_extension(space, DEFAULT_EXTENSION)
    }

    pub fn with_extension(space: Arc<ModuleSpace>, extension: impl Into<String>) -> Self {
        Self {
            space,
            extension: extension.into(),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn space(&self) -> &Arc<ModuleSpace> {
        &self.space
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }

    fn run_file(&self, path: &Path) -> Result<(), LoadError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| LoadError::new(path, 0, format!("cannot read file: {e}")))?;
        let stmts = parser::parse(&source).map_err(|e| LoadError::new(path, e.line, e.message))?;

        self.loaded.lock().insert(canonical(path));
        self.run(path, &stmts, self.space.root())
    }

    fn run(&self, file: &Path, stmts: &[Stmt], scope: EntityId) -> Result<(), LoadError> {
        for stmt in stmts {
            match stmt {
                Stmt::Namespace {
                    kind,
                    absolute,
                    path,
                    body,
                    line,
                } => {
                    let at = |e: NameError| LoadError::new(file, *line, e.to_string());
                    let (last, prefix) = path
                        .split_last()
                        .ok_or_else(|| LoadError::new(file, *line, "empty name"))?;

                    let mut parent = if *absolute { self.space.root() } else { scope };
                    for (i, segment) in prefix.iter().enumerate() {
                        let found = if i == 0 && !*absolute {
                            self.space.lookup(parent, segment)
                        } else {
                            self.space.child(parent, segment)
                        };
                        parent = found.ok_or_else(|| {
                            at(NameError::Uninitialized(prefix[..=i].join(SEPARATOR)))
                        })?;
                    }

                    let id = self.space.define(parent, last, *kind).map_err(at)?;
                    self.run(file, body, id)?;
                }
                Stmt::Method { name, body, line } => {
                    if scope == self.space.root() {
                        return Err(LoadError::new(
                            file,
                            *line,
                            "method defined outside of a module or class",
                        ));
                    }
                    self.space
                        .define_method(scope, name, body.clone().unwrap_or_default())
                        .map_err(|e| LoadError::new(file, *line, e.to_string()))?;
                }
                Stmt::Require { target, line } => {
                    let required = self.resolve_require(file, target);
                    if !required.is_file() {
                        return Err(LoadError::new(
                            file,
                            *line,
                            format!("cannot load such file -- {}", required.display()),
                        ));
                    }
                    if self.loaded.lock().contains(&canonical(&required)) {
                        crate::debug_event!("runtime", "already required", "{}", required.display());
                        continue;
                    }
                    self.run_file(&required)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_require(&self, file: &Path, target: &str) -> PathBuf {
        let base = file.parent().unwrap_or_else(|| Path::new("."));
        let mut path = base.join(target);
        if path.extension().is_none() {
            path.set_extension(&self.extension);
        }
        path
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl SourceExecutor for Interpreter {
    fn execute(&self, path: &Path) -> Result<(), LoadError> {
        crate::debug_event!("runtime", "executing", "{}", path.display());
        self.run_file(path)
    }
}

impl DependencyCache for Interpreter {
    fn invalidate(&self) {
        let mut loaded = self.loaded.lock();
        crate::debug_event!("runtime", "dependency cache cleared", "{} files", loaded.len());
        loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Namespace;
    use std::fs;
    use tempfile::TempDir;

    fn interpreter() -> Interpreter {
        Interpreter::new(Arc::new(ModuleSpace::new()))
    }

    #[test]
    fn test_execute_defines_nested_entities() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("foo_class.rb");
        fs::write(
            &file,
            "module TestClasses\n  class FooClass\n    def self.name\n      'foo'\n    end\n  end\nend\n",
        )
        .unwrap();

        let interp = interpreter();
        interp.execute(&file).unwrap();

        let space = interp.space();
        assert!(space.is_defined("TestClasses::FooClass").unwrap());
        assert_eq!(space.call("TestClasses::FooClass", "name").unwrap(), "foo");
    }

    #[test]
    fn test_qualified_definition_needs_existing_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("orphan.rb");
        fs::write(&file, "class Missing::Orphan\nend\n").unwrap();

        let err = interpreter().execute(&file).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.reason.contains("uninitialized constant Missing"));
    }

    #[test]
    fn test_runtime_error_keeps_earlier_definitions() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("partial.rb");
        fs::write(&file, "module First\nend\nclass First\nend\n").unwrap();

        let interp = interpreter();
        let err = interp.execute(&file).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(interp.space().is_defined("First").unwrap());
    }

    #[test]
    fn test_syntax_error_defines_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("broken.rb");
        fs::write(&file, "module Broken\n").unwrap();

        let interp = interpreter();
        assert!(interp.execute(&file).is_err());
        assert!(!interp.space().is_defined("Broken").unwrap());
    }

    #[test]
    fn test_require_runs_once_per_cache_generation() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("helper.rb"), "module Helper\nend\n").unwrap();
        let main = temp_dir.path().join("main.rb");
        fs::write(&main, "require 'helper'\nmodule Main\nend\n").unwrap();

        let interp = interpreter();
        interp.execute(&main).unwrap();
        assert!(interp.space().is_defined("Helper").unwrap());
        assert_eq!(interp.loaded_count(), 2);

        // Detaching Helper without invalidating keeps the require cached.
        interp.space().detach("", "Helper").unwrap();
        interp.execute(&main).unwrap();
        assert!(!interp.space().is_defined("Helper").unwrap());

        interp.invalidate();
        assert_eq!(interp.loaded_count(), 0);
        interp.execute(&main).unwrap();
        assert!(interp.space().is_defined("Helper").unwrap());
    }

    #[test]
    fn test_missing_require_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("main.rb");
        fs::write(&main, "require 'nowhere'\n").unwrap();

        let err = interpreter().execute(&main).unwrap_err();
        assert!(err.reason.contains("cannot load such file"));
    }

    #[test]
    fn test_unreadable_file() {
        let err = interpreter()
            .execute(Path::new("/definitely/not/here.rb"))
            .unwrap_err();
        assert_eq!(err.line, 0);
    }
}
