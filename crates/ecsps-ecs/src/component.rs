//! Component type declaration and metadata.
//!
//! The set of component types a [`World`](crate::world::World) can hold is
//! closed: every type is declared once in a [`ComponentRegistry`] while the
//! world is being built. Declaration produces a [`ComponentTypeId`] that
//! indexes the type's column and keys entity slot mappings.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::EcsError;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker trait for values that can be stored as components.
///
/// Blanket-implemented for every `Send + Sync + 'static` type.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a declared component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// Position of the type's column in the world.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a declared component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Unique ID assigned at declaration time.
    pub id: ComponentTypeId,
    /// Human-readable name (supplied by the caller).
    pub name: String,
    /// `std::any::type_name::<T>()`
    pub type_name: &'static str,
    /// Rust `TypeId` for runtime type checking.
    pub type_id: TypeId,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types to [`ComponentTypeId`]s and their metadata.
///
/// Declaring the same Rust type twice returns the existing id. Reusing a name
/// for a different type is rejected.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// TypeId -> ComponentTypeId for dedup.
    by_type: HashMap<TypeId, ComponentTypeId>,
    /// Name -> ComponentTypeId for lookup by string name.
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by ComponentTypeId.0.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a component type under the given `name`.
    ///
    /// If the type has already been declared, the existing
    /// [`ComponentTypeId`] is returned and `name` is ignored.
    pub fn register<T: Component>(&mut self, name: &str) -> Result<ComponentTypeId, EcsError> {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return Ok(existing);
        }
        if self.by_name.contains_key(name) {
            return Err(EcsError::DuplicateComponentName {
                name: name.to_owned(),
            });
        }

        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_name: type_name::<T>(),
            type_id: rust_type_id,
        });
        self.by_type.insert(rust_type_id, id);
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Look up a component type by its Rust `TypeId`.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Like [`lookup`](Self::lookup), but an undeclared type is an error.
    pub fn resolve<T: 'static>(&self) -> Result<ComponentTypeId, EcsError> {
        self.lookup::<T>().ok_or_else(|| EcsError::UnknownComponent {
            name: type_name::<T>().to_owned(),
            registered: self.registered_names().join(", "),
        })
    }

    /// Look up a component type by its declared string name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the [`ComponentInfo`] for a declared component type ID.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Declared name of `id`, or `"<unknown>"` for a foreign id.
    pub fn name_of(&self, id: ComponentTypeId) -> &str {
        self.get_info(id).map_or("<unknown>", |info| info.name.as_str())
    }

    /// Total number of declared component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been declared.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the names of all declared component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Pos;

    #[derive(Debug, Clone)]
    struct Vel;

    #[test]
    fn register_and_lookup() {
        let mut reg = ComponentRegistry::new();
        let id = reg.register::<Pos>("position").unwrap();
        assert_eq!(reg.lookup::<Pos>(), Some(id));
        assert_eq!(reg.lookup_by_name("position"), Some(id));
        assert_eq!(reg.name_of(id), "position");
    }

    #[test]
    fn same_type_same_id() {
        let mut reg = ComponentRegistry::new();
        let id1 = reg.register::<Pos>("position").unwrap();
        let id2 = reg.register::<Pos>("position_again").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn different_types_different_ids() {
        let mut reg = ComponentRegistry::new();
        let p = reg.register::<Pos>("position").unwrap();
        let v = reg.register::<Vel>("velocity").unwrap();
        assert_ne!(p, v);
        assert_eq!(v.index(), 1);
    }

    #[test]
    fn name_reuse_for_other_type_is_rejected() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>("thing").unwrap();
        let err = reg.register::<Vel>("thing").unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponentName { .. }));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn resolve_unknown_lists_registered_names() {
        let mut reg = ComponentRegistry::new();
        reg.register::<Pos>("position").unwrap();
        let err = reg.resolve::<Vel>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Vel"), "{msg}");
        assert!(msg.contains("position"), "{msg}");
    }

    #[test]
    fn info_correctness() {
        let mut reg = ComponentRegistry::new();
        let id = reg.register::<Pos>("position").unwrap();
        let info = reg.get_info(id).unwrap();
        assert_eq!(info.name, "position");
        assert_eq!(info.type_id, TypeId::of::<Pos>());
        assert!(info.type_name.ends_with("Pos"));
    }
}
