//! Error types shared by the registry, the orchestrator and the host runtime.

use std::path::PathBuf;
use thiserror::Error;

use crate::watcher::WatchError;

/// Failure to execute a source file.
///
/// Fatal to the file being loaded and to the enclosing load cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}:{line}: {reason}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    pub line: usize,
    pub reason: String,
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Name resolution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("wrong constant name {0:?}")]
    InvalidName(String),

    #[error("uninitialized constant {0}")]
    Uninitialized(String),

    #[error("undefined method '{method}' for {receiver}")]
    UndefinedMethod { receiver: String, method: String },

    #[error("{name} is not a {expected}")]
    KindMismatch { name: String, expected: String },
}

#[derive(Error, Debug)]
pub enum AutoloadError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Name error: {0}")]
    Name(#[from] NameError),

    #[error("Watcher error: {0}")]
    Watch(#[from] WatchError),

    #[error("Cannot expand autoload path {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

pub type AutoloadResult<T> = Result<T, AutoloadError>;
