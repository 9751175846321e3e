//! Canonical entity names and the file-name convention.

use std::path::Path;

use crate::error::NameError;
use crate::types::{QualifiedName, ROOT_SEGMENT, SEPARATOR, SINGLETON_PREFIX};

/// Normalize a raw, host-reported name.
///
/// `::Foo`, `::Object::Foo`, `Object::Object::Foo` and `#<Class:#<Class:Foo>>`
/// all become `Foo`. Root segments are dropped wherever they appear; a name
/// made only of root segments normalizes to the root itself.
pub fn normalize_name(raw: &str) -> Result<QualifiedName, NameError> {
    let invalid = || NameError::InvalidName(raw.to_string());

    let mut name = raw;
    loop {
        let before = name;

        let mut depth = 0;
        while let Some(rest) = name.strip_prefix(SINGLETON_PREFIX) {
            name = rest;
            depth += 1;
        }
        for _ in 0..depth {
            name = name.strip_suffix('>').ok_or_else(invalid)?;
        }

        while let Some(rest) = name.strip_prefix(SEPARATOR) {
            name = rest;
        }

        if name == before {
            break;
        }
    }

    let mut segments = Vec::new();
    for segment in name.split(SEPARATOR) {
        if !is_valid_segment(segment) {
            return Err(invalid());
        }
        if segment != ROOT_SEGMENT {
            segments.push(segment);
        }
    }

    if segments.is_empty() {
        segments.push(ROOT_SEGMENT);
    }

    QualifiedName::from_segments(segments)
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ':' | '#' | '<' | '>'))
}

/// `foo_class` -> `FooClass`.
pub fn camelize(stem: &str) -> String {
    stem.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// The entity name a file is expected to define, derived from its base name.
pub fn file_entity_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = camelize(stem);
    if name.is_empty() { None } else { Some(name) }
}
