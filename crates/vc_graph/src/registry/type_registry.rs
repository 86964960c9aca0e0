use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use log::warn;

use super::{GetTypeMeta, Member, MigrateFn, Override, RefInfo, Shared, TypeKind, TypeMeta};
use crate::hash::{HashMap, HashSet, TypeIdMap};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The Type Descriptor Provider: the central store of [`TypeMeta`].
///
/// [Registering] a type generates its [`TypeMeta`] through [`GetTypeMeta`]
/// (usually implemented with `#[derive(Describe)]`) and registers the types
/// it depends on. Registration is explicit, there is no global discovery.
///
/// # Example
///
/// ```
/// use core::any::TypeId;
/// use vc_graph::registry::TypeRegistry;
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<String>>();
///
/// let meta = registry.get(TypeId::of::<Vec<String>>()).unwrap();
/// assert_eq!(registry.get_with_name(meta.name()).unwrap().type_id(), meta.type_id());
///
/// let list = registry.create_instance(meta.type_id()).unwrap();
/// assert!(list.downcast_ref::<Vec<String>>().unwrap().is_empty());
/// ```
///
/// [Registering]: TypeRegistry::register
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_name_to_id: HashMap<&'static str, TypeId>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a empty [`TypeRegistry`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            type_meta_table: TypeIdMap::with_hasher(crate::hash::FixedHashState),
            type_name_to_id: HashMap::with_hasher(crate::hash::FixedHashState),
        }
    }

    /// Create a type registry with default registrations for primitive types.
    ///
    /// - `()` `bool` `char`
    /// - `i8 - i64` `isize`
    /// - `u8 - u64` `usize`
    /// - `f32` `f64`
    /// - `String`
    /// - [`Shared`]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry.register::<Shared>();
        registry
    }

    /// Registers `T` and its dependencies, unless `T` is already registered.
    ///
    /// Returns `false` if `T` was already present, in which case neither
    /// `T` nor its dependencies are touched.
    pub fn register<T: GetTypeMeta>(&mut self) -> bool {
        if self.type_meta_table.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        self.insert(T::get_type_meta());
        T::register_dependencies(self);
        true
    }

    /// Inserts hand-written metadata. Does nothing if the type already exists.
    ///
    /// This method will _not_ register type dependencies.
    pub fn register_meta(&mut self, meta: TypeMeta) -> bool {
        if self.type_meta_table.contains_key(&meta.type_id()) {
            return false;
        }
        self.insert(meta);
        true
    }

    fn insert(&mut self, meta: TypeMeta) {
        let name = meta.name();
        if let Some(other) = self.type_name_to_id.get(name) {
            warn!(
                "type name `{name}` is used by more than one type, `$type` tags resolve to the first ({:?})",
                self.type_meta_table.get(other).map(TypeMeta::ty),
            );
        } else {
            self.type_name_to_id.insert(name, meta.type_id());
        }
        self.type_meta_table.insert(meta.type_id(), meta);
    }

    /// Registers the migration from the model `Old` into its descendant `New`.
    ///
    /// Both types must be registered and `New` must be versioned, otherwise
    /// nothing happens and `false` is returned. Whether `Old` is actually
    /// declared as an ancestor of `New` is checked when the version graph
    /// is built.
    pub fn register_migration<Old: Any, New: Any + From<Old>>(&mut self) -> bool {
        fn migrate<Old: Any, New: Any + From<Old>>(
            old: Box<dyn Any>,
        ) -> Result<Box<dyn Any>, Box<dyn Any>> {
            let old = old.downcast::<Old>()?;
            Ok(Box::new(New::from(*old)))
        }

        self.register_migration_fn(TypeId::of::<Old>(), TypeId::of::<New>(), migrate::<Old, New>)
    }

    /// Like [`register_migration`](Self::register_migration), with a custom conversion.
    pub fn register_migration_fn(&mut self, old: TypeId, new: TypeId, migration: MigrateFn) -> bool {
        if !self.type_meta_table.contains_key(&old) {
            return false;
        }
        match self
            .type_meta_table
            .get_mut(&new)
            .and_then(TypeMeta::versioning_mut)
        {
            Some(versioning) => {
                versioning.insert_migration(old, migration);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains_key(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    /// Looks a type up by the name used in `$type` tags.
    #[inline]
    pub fn get_with_name(&self, name: &str) -> Option<&TypeMeta> {
        self.type_name_to_id
            .get(name)
            .and_then(|id| self.type_meta_table.get(id))
    }

    /// The members of a struct type.
    #[inline]
    pub fn members(&self, type_id: TypeId) -> Option<&[Member]> {
        self.get(type_id).map(TypeMeta::members)
    }

    /// The converter override declared on the type itself, if any.
    #[inline]
    pub fn attribute_override(&self, type_id: TypeId) -> Option<&Override> {
        self.get(type_id).and_then(TypeMeta::attribute_override)
    }

    #[inline]
    pub fn create_instance(&self, type_id: TypeId) -> Option<Box<dyn Any>> {
        self.get(type_id).and_then(TypeMeta::create_instance)
    }

    /// Returns `true` if an object of type `candidate` may live in a slot
    /// declared as `storage`.
    ///
    /// That is the case when both are equal, when `storage` is [`Shared`],
    /// or when `candidate` transitively extends `storage`.
    pub fn is_assignable(&self, storage: TypeId, candidate: TypeId) -> bool {
        if storage == candidate || storage == TypeId::of::<Shared>() {
            return true;
        }

        let mut visited = HashSet::default();
        let mut queue: Vec<TypeId> = Vec::from([candidate]);
        while let Some(current) = queue.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(meta) = self.get(current) else {
                continue;
            };
            for base in meta.extends() {
                if base.id() == storage {
                    return true;
                }
                queue.push(base.id());
            }
        }
        false
    }

    /// Iterates over every registered type, in no particular order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }
}

impl GetTypeMeta for Shared {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>(TypeKind::Reference(RefInfo::erased()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::any::{Any, TypeId};

    use super::TypeRegistry;
    use crate::registry::{Shared, Type, TypeKind, TypeMeta, default_instance};

    #[derive(Default)]
    struct Base;
    #[derive(Default)]
    struct Middle;
    #[derive(Default)]
    struct Leaf;

    fn opaque<T: Any + Default>() -> TypeMeta {
        TypeMeta::of::<T>(TypeKind::Primitive).with_constructor(default_instance::<T>)
    }

    #[test]
    fn assignability_follows_extends_chain() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(opaque::<Base>());
        registry.register_meta(opaque::<Middle>().with_extends(Type::of::<Base>()));
        registry.register_meta(opaque::<Leaf>().with_extends(Type::of::<Middle>()));

        let id = TypeId::of::<Base>();
        assert!(registry.is_assignable(id, TypeId::of::<Leaf>()));
        assert!(registry.is_assignable(id, id));
        assert!(!registry.is_assignable(TypeId::of::<Leaf>(), id));
        assert!(registry.is_assignable(TypeId::of::<Shared>(), TypeId::of::<Base>()));
    }

    #[test]
    fn register_adds_dependencies_once() {
        let mut registry = TypeRegistry::empty();
        assert!(registry.register::<Vec<Vec<String>>>());
        assert!(registry.contains(TypeId::of::<Vec<String>>()));
        assert!(registry.contains(TypeId::of::<String>()));
        assert!(!registry.register::<Vec<String>>());
    }

    #[test]
    fn migration_needs_versioned_target() {
        #[derive(Default)]
        struct V1(u8);
        #[derive(Default)]
        struct V2(u16);
        impl From<V1> for V2 {
            fn from(v: V1) -> Self {
                V2(u16::from(v.0))
            }
        }

        let mut registry = TypeRegistry::empty();
        registry.register_meta(opaque::<V1>());
        registry.register_meta(opaque::<V2>());
        assert!(!registry.register_migration::<V1, V2>());

        let mut registry = TypeRegistry::empty();
        registry.register_meta(opaque::<V1>().with_version("1", []));
        registry.register_meta(opaque::<V2>().with_version("2", [Type::of::<V1>()]));
        assert!(registry.register_migration::<V1, V2>());

        let versioning = registry.get(TypeId::of::<V2>()).unwrap().versioning().unwrap();
        let migrate = versioning.migration(TypeId::of::<V1>()).unwrap();
        let migrated = migrate(alloc::boxed::Box::new(V1(9))).ok().unwrap();
        assert_eq!(migrated.downcast_ref::<V2>().map(|v| v.0), Some(9));
    }
}
