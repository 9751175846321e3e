//! Owned namespace of modules and classes.
//!
//! Entities are keyed by id with explicit parent links. Only entities
//! reachable from the root are part of the namespace; detaching a child drops
//! its whole subtree.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::NameError;
use crate::host::Namespace;
use crate::types::{EntityId, EntityRef, ROOT_SEGMENT, SEPARATOR, SINGLETON_PREFIX, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Module,
    Class,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Module => f.write_str("module"),
            EntityKind::Class => f.write_str("class"),
        }
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    kind: EntityKind,
    parent: Option<EntityId>,
    children: IndexMap<String, EntityId>,
    /// Singleton methods: name -> returned string.
    methods: IndexMap<String, String>,
    /// Id of the singleton entity, created with the first singleton method.
    singleton: Option<EntityId>,
}

#[derive(Debug)]
struct SpaceInner {
    last_id: EntityId,
    root: EntityId,
    nodes: HashMap<EntityId, Node>,
}

impl SpaceInner {
    fn allocate(&mut self) -> EntityId {
        self.last_id = self.last_id.next();
        self.last_id
    }

    fn child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        if name == ROOT_SEGMENT {
            return Some(self.root);
        }
        self.nodes.get(&parent)?.children.get(name).copied()
    }

    /// Resolve an absolute path. The empty path is the root.
    fn resolve(&self, path: &str) -> Result<Option<EntityId>, NameError> {
        if path.is_empty() {
            return Ok(Some(self.root));
        }
        let mut current = self.root;
        for segment in path.split(SEPARATOR) {
            if !is_constant_name(segment) {
                return Err(NameError::InvalidName(path.to_string()));
            }
            match self.child(current, segment) {
                Some(id) => current = id,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn path_of(&self, id: EntityId) -> String {
        if id == self.root {
            return ROOT_SEGMENT.to_string();
        }
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                break;
            }
            match self.nodes.get(&node_id) {
                Some(node) => {
                    segments.push(node.name.as_str());
                    current = node.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        segments.join(SEPARATOR)
    }

    fn drop_subtree(&mut self, id: EntityId) -> usize {
        let Some(node) = self.nodes.remove(&id) else {
            return 0;
        };
        1 + node
            .children
            .values()
            .map(|child| self.drop_subtree(*child))
            .sum::<usize>()
    }
}

/// Is `segment` a valid constant name: ASCII upper-case first, then
/// alphanumerics or underscores.
pub fn is_constant_name(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// The shared namespace of the bundled host runtime.
#[derive(Debug)]
pub struct ModuleSpace {
    inner: RwLock<SpaceInner>,
}

impl Default for ModuleSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleSpace {
    pub fn new() -> Self {
        let root = EntityId::FIRST;
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: ROOT_SEGMENT.to_string(),
                kind: EntityKind::Class,
                parent: None,
                children: IndexMap::new(),
                methods: IndexMap::new(),
                singleton: None,
            },
        );
        Self {
            inner: RwLock::new(SpaceInner {
                last_id: root,
                root,
                nodes,
            }),
        }
    }

    pub fn root(&self) -> EntityId {
        self.inner.read().root
    }

    /// Number of live entities, root included.
    pub fn entity_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn path_of(&self, id: EntityId) -> String {
        self.inner.read().path_of(id)
    }

    /// Look up `name` lexically: in `scope`, then each enclosing namespace.
    pub fn lookup(&self, scope: EntityId, name: &str) -> Option<EntityId> {
        let inner = self.inner.read();
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = inner.child(id, name) {
                return Some(found);
            }
            current = inner.nodes.get(&id).and_then(|n| n.parent);
        }
        None
    }

    /// Child `name` of `parent`, if present.
    pub fn child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.inner.read().child(parent, name)
    }

    /// Define `name` under `parent`, or reopen it when it already exists
    /// with the same kind.
    pub fn define(
        &self,
        parent: EntityId,
        name: &str,
        kind: EntityKind,
    ) -> Result<EntityId, NameError> {
        if !is_constant_name(name) {
            return Err(NameError::InvalidName(name.to_string()));
        }

        let mut inner = self.inner.write();
        if let Some(existing) = inner.child(parent, name) {
            let existing_kind = inner.nodes.get(&existing).map(|n| n.kind);
            if existing_kind == Some(kind) {
                return Ok(existing);
            }
            return Err(NameError::KindMismatch {
                name: inner.path_of(existing),
                expected: kind.to_string(),
            });
        }

        if !inner.nodes.contains_key(&parent) {
            return Err(NameError::Uninitialized(inner.path_of(parent)));
        }

        let id = inner.allocate();
        inner.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                kind,
                parent: Some(parent),
                children: IndexMap::new(),
                methods: IndexMap::new(),
                singleton: None,
            },
        );
        if let Some(parent_node) = inner.nodes.get_mut(&parent) {
            parent_node.children.insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Define every segment of an absolute `A::B::C` path as modules.
    pub fn define_module(&self, path: &str) -> Result<EntityId, NameError> {
        self.define_path(path, EntityKind::Module)
    }

    pub fn define_class(&self, path: &str) -> Result<EntityId, NameError> {
        self.define_path(path, EntityKind::Class)
    }

    fn define_path(&self, path: &str, kind: EntityKind) -> Result<EntityId, NameError> {
        let segments: Vec<&str> = path.split(SEPARATOR).collect();
        let (last, prefix) = segments
            .split_last()
            .ok_or_else(|| NameError::InvalidName(path.to_string()))?;

        let mut parent = self.root();
        for segment in prefix {
            parent = self.define(parent, segment, EntityKind::Module)?;
        }
        self.define(parent, last, kind)
    }

    /// Define (or redefine) a singleton method on `owner`.
    pub fn define_method(
        &self,
        owner: EntityId,
        method: &str,
        body: impl Into<String>,
    ) -> Result<(), NameError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(&owner) {
            return Err(NameError::Uninitialized(inner.path_of(owner)));
        }
        let singleton = match inner.nodes.get(&owner).and_then(|n| n.singleton) {
            Some(id) => id,
            None => inner.allocate(),
        };
        if let Some(node) = inner.nodes.get_mut(&owner) {
            node.singleton = Some(singleton);
            node.methods.insert(method.to_string(), body.into());
        }
        Ok(())
    }

    /// Invoke `receiver.method`.
    pub fn call(&self, receiver: &str, method: &str) -> Result<String, NameError> {
        let inner = self.inner.read();
        let id = inner
            .resolve(receiver)?
            .ok_or_else(|| NameError::Uninitialized(receiver.to_string()))?;
        inner
            .nodes
            .get(&id)
            .and_then(|node| node.methods.get(method))
            .cloned()
            .ok_or_else(|| NameError::UndefinedMethod {
                receiver: receiver.to_string(),
                method: method.to_string(),
            })
    }
}

impl Namespace for ModuleSpace {
    fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        let mut snapshot = Snapshot::new();
        let mut stack = vec![inner.root];

        while let Some(id) = stack.pop() {
            let Some(node) = inner.nodes.get(&id) else {
                continue;
            };
            let path = inner.path_of(id);
            if let Some(singleton) = node.singleton {
                snapshot.insert(EntityRef::new(
                    singleton,
                    format!("{SINGLETON_PREFIX}{path}>"),
                ));
            }
            snapshot.insert(EntityRef::new(id, path));
            stack.extend(node.children.values().copied());
        }

        snapshot
    }

    fn is_defined(&self, path: &str) -> Result<bool, NameError> {
        if path.is_empty() {
            return Err(NameError::InvalidName(String::new()));
        }
        Ok(self.inner.read().resolve(path)?.is_some())
    }

    fn has_child(&self, parent: &str, name: &str) -> Result<bool, NameError> {
        if !is_constant_name(name) {
            return Err(NameError::InvalidName(name.to_string()));
        }
        let inner = self.inner.read();
        let Some(parent_id) = inner.resolve(parent)? else {
            return Ok(false);
        };
        Ok(inner
            .nodes
            .get(&parent_id)
            .is_some_and(|node| node.children.contains_key(name)))
    }

    fn detach(&self, parent: &str, name: &str) -> Result<bool, NameError> {
        if !is_constant_name(name) {
            return Err(NameError::InvalidName(name.to_string()));
        }
        let mut inner = self.inner.write();
        let Some(parent_id) = inner.resolve(parent)? else {
            return Ok(false);
        };
        let removed = inner
            .nodes
            .get_mut(&parent_id)
            .and_then(|node| node.children.shift_remove(name));

        match removed {
            Some(child) => {
                inner.drop_subtree(child);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_defined() {
        let space = ModuleSpace::new();
        space.define_module("SaveMe").unwrap();

        assert!(space.is_defined("SaveMe").unwrap());
        assert!(space.is_defined("Object::SaveMe").unwrap());
        assert!(!space.is_defined("KillMe").unwrap());
    }

    #[test]
    fn test_is_defined_rejects_wrong_names() {
        let space = ModuleSpace::new();
        assert!(matches!(space.is_defined(""), Err(NameError::InvalidName(_))));
        assert!(matches!(space.is_defined("lower"), Err(NameError::InvalidName(_))));
        assert!(matches!(space.is_defined("A::"), Err(NameError::InvalidName(_))));
    }

    #[test]
    fn test_snapshot_reports_singletons() {
        let space = ModuleSpace::new();
        let id = space.define_module("TestModule").unwrap();
        space.define_method(id, "hello", "hi").unwrap();

        let names: Vec<String> = space.snapshot().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Object", "TestModule", "#<Class:TestModule>"]);
    }

    #[test]
    fn test_detach_drops_subtree() {
        let space = ModuleSpace::new();
        space.define_module("Outer::Inner::Deep").unwrap();
        assert_eq!(space.entity_count(), 4);

        assert!(space.detach("", "Outer").unwrap());
        assert_eq!(space.entity_count(), 1);
        assert!(!space.is_defined("Outer::Inner").unwrap());
        assert!(!space.detach("", "Outer").unwrap());
        assert!(!space.detach("Outer", "Inner").unwrap());
    }

    #[test]
    fn test_redefinition_keeps_identity() {
        let space = ModuleSpace::new();
        let first = space.define_class("Foo").unwrap();
        let second = space.define_class("Foo").unwrap();
        assert_eq!(first, second);

        let err = space.define_module("Foo").unwrap_err();
        assert!(matches!(err, NameError::KindMismatch { .. }));
    }

    #[test]
    fn test_ids_are_not_reused_after_detach() {
        let space = ModuleSpace::new();
        let first = space.define_module("Foo").unwrap();
        space.detach("", "Foo").unwrap();
        let second = space.define_module("Foo").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_call() {
        let space = ModuleSpace::new();
        let id = space.define_module("Greeter").unwrap();
        space.define_method(id, "hello", "Hi").unwrap();

        assert_eq!(space.call("Greeter", "hello").unwrap(), "Hi");
        assert!(matches!(
            space.call("Greeter", "bye"),
            Err(NameError::UndefinedMethod { .. })
        ));
        assert!(matches!(
            space.call("Nobody", "hello"),
            Err(NameError::Uninitialized(_))
        ));
    }
}
