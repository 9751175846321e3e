//! Parser for unit scripts.
//!
//! ```text
//! # comment
//! require 'support/helpers'
//! module TestClasses
//!   class FooClass
//!     def self.greet
//!       'hello'
//!     end
//!   end
//! end
//! ```

use super::space::{EntityKind, is_constant_name};
use crate::types::SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Namespace {
        kind: EntityKind,
        /// `true` for `::A::B` paths anchored at the root.
        absolute: bool,
        path: Vec<String>,
        body: Vec<Stmt>,
        line: usize,
    },
    Method {
        name: String,
        body: Option<String>,
        line: usize,
    },
    Require {
        target: String,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
    let lines: Vec<(usize, &str)> = source
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let mut parser = Parser { lines, pos: 0 };
    let stmts = parser.block(None)?;
    Ok(stmts)
}

struct Parser<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos).copied();
        self.pos += 1;
        line
    }

    /// Statements up to the `end` closing `opened_at`, or to end of input at top level.
    fn block(&mut self, opened_at: Option<usize>) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            let Some((line, text)) = self.next() else {
                return match opened_at {
                    Some(open) => Err(SyntaxError::new(open, "missing `end`")),
                    None => Ok(stmts),
                };
            };

            if text == "end" {
                return match opened_at {
                    Some(_) => Ok(stmts),
                    None => Err(SyntaxError::new(line, "unexpected `end`")),
                };
            }

            let (keyword, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            let rest = rest.trim();
            let stmt = match keyword {
                "module" => self.namespace(EntityKind::Module, rest, line)?,
                "class" => self.namespace(EntityKind::Class, rest, line)?,
                "def" => self.method(rest, line)?,
                "require" => Stmt::Require {
                    target: string_literal(rest)
                        .ok_or_else(|| SyntaxError::new(line, "require expects a string literal"))?,
                    line,
                },
                other => {
                    return Err(SyntaxError::new(line, format!("unexpected `{other}`")));
                }
            };
            stmts.push(stmt);
        }
    }

    fn namespace(&mut self, kind: EntityKind, rest: &str, line: usize) -> Result<Stmt, SyntaxError> {
        let (absolute, rest) = match rest.strip_prefix(SEPARATOR) {
            Some(stripped) => (true, stripped),
            None => (false, rest),
        };
        let path: Vec<String> = rest.split(SEPARATOR).map(str::to_string).collect();
        if !path.iter().all(|s| is_constant_name(s)) {
            return Err(SyntaxError::new(
                line,
                format!("{kind} name must be a constant, got `{rest}`"),
            ));
        }
        let body = self.block(Some(line))?;
        Ok(Stmt::Namespace {
            kind,
            absolute,
            path,
            body,
            line,
        })
    }

    fn method(&mut self, rest: &str, line: usize) -> Result<Stmt, SyntaxError> {
        let name = rest
            .strip_prefix("self.")
            .ok_or_else(|| SyntaxError::new(line, "only `def self.<name>` is supported"))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SyntaxError::new(line, format!("invalid method name `{name}`")));
        }

        let body = match self.next() {
            Some((_, "end")) => None,
            Some((body_line, text)) => {
                let value = string_literal(text).ok_or_else(|| {
                    SyntaxError::new(body_line, "method body must be a string literal")
                })?;
                match self.next() {
                    Some((_, "end")) => Some(value),
                    Some((l, _)) => return Err(SyntaxError::new(l, "expected `end`")),
                    None => return Err(SyntaxError::new(line, "missing `end`")),
                }
            }
            None => return Err(SyntaxError::new(line, "missing `end`")),
        };

        Ok(Stmt::Method {
            name: name.to_string(),
            body,
            line,
        })
    }
}

fn string_literal(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) {
        return None;
    }
    Some(inner.to_string())
}
