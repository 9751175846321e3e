//! Bundled host runtime: an owned module namespace plus an interpreter for
//! a small line-oriented definition language ("unit scripts").

mod interpreter;
mod parser;
mod space;

pub use interpreter::{DEFAULT_EXTENSION, Interpreter};
pub use parser::{Stmt, SyntaxError, parse};
pub use space::{EntityKind, ModuleSpace, is_constant_name};

use std::sync::Arc;

use crate::host::Host;

/// Build a `Host` backed by a fresh `ModuleSpace`.
///
/// Returns the space too so callers can invoke loaded code.
pub fn host(extension: &str) -> (Host, Arc<ModuleSpace>) {
    let space = Arc::new(ModuleSpace::new());
    let interpreter = Arc::new(Interpreter::with_extension(space.clone(), extension));
    let host = Host::new(interpreter.clone(), space.clone(), interpreter);
    (host, space)
}
