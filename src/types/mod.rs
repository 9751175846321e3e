use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::NameError;

/// Separator between qualified name segments.
pub const SEPARATOR: &str = "::";

/// Name of the root namespace when it appears as an explicit segment.
pub const ROOT_SEGMENT: &str = "Object";

/// Prefix the host uses when reporting a singleton entity.
pub const SINGLETON_PREFIX: &str = "#<Class:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(NonZeroU64);

impl EntityId {
    pub const FIRST: EntityId = EntityId(NonZeroU64::MIN);

    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn value(&self) -> u64 {
        self.0.get()
    }
}

/// An entity as reported by the host at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: EntityId,
    /// Raw name as reported by the host, before normalization.
    pub name: String,
}

impl EntityRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Point-in-time enumeration of every entity the host knows about.
///
/// Keyed by id so iteration follows creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entities: BTreeMap<EntityId, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityRef) {
        self.entities.insert(entity.id, entity.name);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.entities
            .iter()
            .map(|(id, name)| EntityRef::new(*id, name.as_str()))
    }
}

impl FromIterator<EntityRef> for Snapshot {
    fn from_iter<I: IntoIterator<Item = EntityRef>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for entity in iter {
            snapshot.insert(entity);
        }
        snapshot
    }
}

/// Canonical, non-empty path of segments identifying an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Build from segments. Fails on an empty sequence or an empty segment.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(NameError::InvalidName(segments.join(SEPARATOR)));
        }
        Ok(Self { segments })
    }

    /// Split a `A::B::C` string without normalizing it.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        if s.is_empty() {
            return Err(NameError::InvalidName(String::new()));
        }
        Self::from_segments(s.split(SEPARATOR)).map_err(|_| NameError::InvalidName(s.to_string()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Terminal segment.
    pub fn name(&self) -> &str {
        // Non-empty by construction.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Enclosing namespace path, empty for top-level names.
    pub fn parent_path(&self) -> String {
        self.segments[..self.segments.len() - 1].join(SEPARATOR)
    }

    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(SEPARATOR))
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

impl PartialEq<str> for QualifiedName {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for QualifiedName {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// Entities discovered while loading one file, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadRecord {
    pub path: PathBuf,
    pub entities: Vec<QualifiedName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_creation() {
        assert!(EntityId::new(0).is_none());

        let id = EntityId::new(42).unwrap();
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_qualified_name_parts() {
        let name = QualifiedName::parse("TestClasses::FooClass").unwrap();
        assert_eq!(name.name(), "FooClass");
        assert_eq!(name.parent_path(), "TestClasses");
        assert!(!name.is_top_level());
        assert_eq!(name.to_string(), "TestClasses::FooClass");

        let top = QualifiedName::parse("Foo").unwrap();
        assert_eq!(top.parent_path(), "");
        assert!(top.is_top_level());
    }

    #[test]
    fn test_qualified_name_rejects_empty() {
        assert!(QualifiedName::parse("").is_err());
        assert!(QualifiedName::parse("Foo::").is_err());
        assert!(QualifiedName::from_segments(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_snapshot_iterates_in_creation_order() {
        let snapshot: Snapshot = [
            EntityRef::new(EntityId::new(3).unwrap(), "C"),
            EntityRef::new(EntityId::new(1).unwrap(), "A"),
            EntityRef::new(EntityId::new(2).unwrap(), "B"),
        ]
        .into_iter()
        .collect();

        let names: Vec<String> = snapshot.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(snapshot.len(), 3);
    }
}
