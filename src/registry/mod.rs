//! Ownership tracking and safe removal of namespace entities.
//!
//! Loading a file can define far more than the file itself declares
//! (framework internals, transitively required files). The registry keeps
//! only the entities whose terminal name matches the file, and removes
//! them again in reverse discovery order so nested entities go before the
//! namespaces that contain them.

mod naming;

pub use naming::{camelize, file_entity_name, normalize_name};

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::NameError;
use crate::host::Namespace;
use crate::types::{EntityRef, QualifiedName, Snapshot};

/// Outcome of removing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entity was detached from its enclosing namespace.
    Detached,
    /// Nothing to do: the entity or its enclosing namespace is already gone.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalStats {
    pub detached: usize,
    pub skipped: usize,
}

pub struct EntityRegistry {
    namespace: Arc<dyn Namespace>,
}

impl EntityRegistry {
    pub fn new(namespace: Arc<dyn Namespace>) -> Self {
        Self { namespace }
    }

    /// Entities present in `after` but not in `before`, in creation order.
    pub fn diff(before: &Snapshot, after: &Snapshot) -> Vec<EntityRef> {
        after.iter().filter(|e| !before.contains(e.id)).collect()
    }

    /// Keep the candidates owned by `path` under the file-name convention.
    ///
    /// Candidates whose names cannot be normalized (anonymous entities) are
    /// never owned by a file.
    pub fn match_by_file_convention(candidates: &[EntityRef], path: &Path) -> Vec<QualifiedName> {
        let Some(expected) = file_entity_name(path) else {
            return Vec::new();
        };

        let mut owned = IndexSet::new();
        for candidate in candidates {
            match normalize_name(&candidate.name) {
                Ok(name) if name.name() == expected => {
                    owned.insert(name);
                }
                Ok(_) => {}
                Err(e) => {
                    crate::debug_event!("registry", "unnamed entity skipped", "{e}");
                }
            }
        }
        owned.into_iter().collect()
    }

    /// Detach one entity from its enclosing namespace.
    ///
    /// Idempotent: a missing entity or a missing parent is `Removal::Skipped`.
    /// Only malformed names are errors.
    pub fn remove_entity(&self, name: &QualifiedName) -> Result<Removal, NameError> {
        let parent = name.parent_path();

        if !parent.is_empty() && !self.namespace.is_defined(&parent)? {
            crate::debug_event!("registry", "parent gone", "{name}");
            return Ok(Removal::Skipped);
        }

        if !self.namespace.has_child(&parent, name.name())? {
            crate::debug_event!("registry", "already removed", "{name}");
            return Ok(Removal::Skipped);
        }

        if self.namespace.detach(&parent, name.name())? {
            crate::debug_event!("registry", "detached", "{name}");
            Ok(Removal::Detached)
        } else {
            Ok(Removal::Skipped)
        }
    }

    /// Remove every entity, last discovered first, draining the set as it goes.
    ///
    /// On error the failing name stays at the end of the set.
    pub fn remove_all(&self, entities: &mut IndexSet<QualifiedName>) -> Result<RemovalStats, NameError> {
        let mut stats = RemovalStats::default();

        while let Some(name) = entities.pop() {
            match self.remove_entity(&name) {
                Ok(Removal::Detached) => stats.detached += 1,
                Ok(Removal::Skipped) => stats.skipped += 1,
                Err(e) => {
                    entities.insert(name);
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ModuleSpace;
    use crate::types::EntityId;
    use std::path::PathBuf;

    fn entity(id: u64, name: &str) -> EntityRef {
        EntityRef::new(EntityId::new(id).unwrap(), name)
    }

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::parse(s).unwrap()
    }

    #[test]
    fn test_diff_yields_new_entities_in_creation_order() {
        let before: Snapshot = [entity(1, "Object"), entity(2, "Kernel")].into_iter().collect();
        let after: Snapshot = [
            entity(1, "Object"),
            entity(2, "Kernel"),
            entity(4, "Index"),
            entity(3, "Endpoints"),
        ]
        .into_iter()
        .collect();

        let new: Vec<String> = EntityRegistry::diff(&before, &after)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(new, vec!["Endpoints", "Index"]);
    }

    #[test]
    fn test_match_keeps_only_file_named_entities() {
        let candidates = vec![
            entity(10, "::Endpoints::Notes::Index"),
            entity(11, "ActiveRecord::Errors"),
            entity(12, "Endpointflux"),
            entity(13, "#<Class:Endpoints::Notes::Index>"),
        ];

        let owned =
            EntityRegistry::match_by_file_convention(&candidates, &PathBuf::from("lib/index.rb"));
        assert_eq!(owned, vec![qn("Endpoints::Notes::Index")]);
    }

    #[test]
    fn test_match_with_unmatchable_file_name() {
        let candidates = vec![entity(10, "Foo")];
        assert!(EntityRegistry::match_by_file_convention(&candidates, Path::new("_.rb")).is_empty());
    }

    #[test]
    fn test_remove_nested_entity_keeps_parent() {
        let space = Arc::new(ModuleSpace::new());
        space.define_module("SaveMe").unwrap();
        space.define_module("SaveMe::KillMe").unwrap();
        let registry = EntityRegistry::new(space.clone());

        let removal = registry.remove_entity(&normalize_name("::SaveMe::KillMe").unwrap());

        assert_eq!(removal, Ok(Removal::Detached));
        assert!(space.is_defined("SaveMe").unwrap());
        assert!(!space.is_defined("SaveMe::KillMe").unwrap());
    }

    #[test]
    fn test_remove_simple_entity() {
        let space = Arc::new(ModuleSpace::new());
        space.define_module("KillMe").unwrap();
        let registry = EntityRegistry::new(space.clone());

        assert_eq!(registry.remove_entity(&qn("KillMe")), Ok(Removal::Detached));
        assert!(!space.is_defined("KillMe").unwrap());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let space = Arc::new(ModuleSpace::new());
        space.define_module("KillMe").unwrap();
        let registry = EntityRegistry::new(space.clone());

        assert_eq!(registry.remove_entity(&qn("KillMe")), Ok(Removal::Detached));
        assert_eq!(registry.remove_entity(&qn("KillMe")), Ok(Removal::Skipped));
        assert_eq!(registry.remove_entity(&qn("NeverDefined")), Ok(Removal::Skipped));
        assert_eq!(
            registry.remove_entity(&qn("Missing::Parent::Child")),
            Ok(Removal::Skipped)
        );
    }

    #[test]
    fn test_remove_all_goes_in_reverse_and_drains() {
        let space = Arc::new(ModuleSpace::new());
        space.define_module("Outer").unwrap();
        space.define_module("Outer::Inner").unwrap();
        let registry = EntityRegistry::new(space.clone());

        // Discovery order puts the parent first; reverse removal detaches
        // the child before its parent disappears.
        let mut entities: IndexSet<QualifiedName> =
            [qn("Outer"), qn("Outer::Inner")].into_iter().collect();
        let stats = registry.remove_all(&mut entities).unwrap();

        assert!(entities.is_empty());
        assert_eq!(stats, RemovalStats { detached: 2, skipped: 0 });
        assert!(!space.is_defined("Outer").unwrap());
    }

    #[test]
    fn test_remove_all_skips_children_of_removed_parents() {
        let space = Arc::new(ModuleSpace::new());
        space.define_module("Outer").unwrap();
        space.define_module("Outer::Inner").unwrap();
        let registry = EntityRegistry::new(space.clone());

        // Parent discovered last, so it goes first and takes the child with it.
        let mut entities: IndexSet<QualifiedName> =
            [qn("Outer::Inner"), qn("Outer")].into_iter().collect();
        let stats = registry.remove_all(&mut entities).unwrap();

        assert!(entities.is_empty());
        assert_eq!(stats, RemovalStats { detached: 1, skipped: 1 });
    }
}
