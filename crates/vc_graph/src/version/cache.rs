use alloc::rc::Rc;
use core::any::TypeId;

use log::error;

use super::{VersionError, VersionedType};
use crate::hash::TypeIdMap;
use crate::registry::TypeRegistry;

type Entry = Result<Option<Rc<VersionedType>>, VersionError>;

/// Version graphs by root model, errors included.
///
/// A graph is built and validated once. Later lookups return the cached
/// result until [`clear`](Self::clear) is called.
#[derive(Default)]
pub struct VersionCache {
    entries: TypeIdMap<Entry>,
}

impl VersionCache {
    pub fn get(&mut self, registry: &TypeRegistry, model: TypeId) -> Entry {
        if let Some(entry) = self.entries.get(&model) {
            return entry.clone();
        }

        let entry = VersionedType::build(registry, model);
        if let Err(e) = &entry {
            error!("invalid version graph: {e}");
        }
        self.entries.insert(model, entry.clone());
        entry
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::any::TypeId;

    use super::VersionCache;
    use crate::registry::{Type, TypeKind, TypeMeta, TypeRegistry};
    use crate::version::VersionError;

    macro_rules! models {
        ($($name:ident),*) => {
            $(
                #[derive(Default)]
                struct $name;
            )*
        };
    }

    models!(A, B, C, D, E);

    macro_rules! migrate {
        ($($from:ident => $to:ident),*) => {
            $(
                impl From<$from> for $to {
                    fn from(_: $from) -> Self {
                        $to
                    }
                }
            )*
        };
    }

    migrate!(A => B, A => C, A => E, B => D, C => D, E => D);

    fn model<T: core::any::Any>(version: &'static str, ancestors: &[Type]) -> TypeMeta {
        TypeMeta::of::<T>(TypeKind::Primitive).with_version(version, ancestors.iter().copied())
    }

    #[test]
    fn diamond_shares_nodes_and_finds_path() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(model::<A>("1", &[]));
        registry.register_meta(model::<B>("1_2a", &[Type::of::<A>()]));
        registry.register_meta(model::<C>("1_2b", &[Type::of::<A>()]));
        registry.register_meta(model::<E>("1_2c", &[Type::of::<A>()]));
        registry.register_meta(model::<D>(
            "1_2abc_3",
            &[Type::of::<B>(), Type::of::<C>(), Type::of::<E>()],
        ));
        registry.register_migration::<A, B>();
        registry.register_migration::<A, C>();
        registry.register_migration::<A, E>();
        registry.register_migration::<B, D>();
        registry.register_migration::<C, D>();
        registry.register_migration::<E, D>();

        let mut cache = VersionCache::default();
        let root = cache.get(&registry, TypeId::of::<D>()).unwrap().unwrap();

        // The three intermediates share one node for "1".
        let oldest = &root.ancestors()[0].ancestors()[0];
        assert!(root.ancestors().iter().all(|middle| Rc::ptr_eq(&middle.ancestors()[0], oldest)));

        let path = root.import_path("1").unwrap();
        assert_eq!(path.len(), 3);
        assert!(path[0].model().is::<A>());
        assert!(path[2].model().is::<D>());
        let middles = ["1_2a", "1_2b", "1_2c"];
        assert_eq!(
            path.iter().filter(|node| middles.contains(&node.version())).count(),
            1
        );

        for middle in middles {
            let path = root.import_path(middle).unwrap();
            assert_eq!(path.len(), 2);
            assert_eq!(path[0].version(), middle);
        }
        assert!(root.import_path("0").is_none());
    }

    #[test]
    fn unversioned_models_have_no_graph() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(TypeMeta::of::<A>(TypeKind::Primitive));
        assert!(VersionCache::default().get(&registry, TypeId::of::<A>()).unwrap().is_none());
    }

    #[test]
    fn invalid_graphs_are_reported() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(model::<A>("1", &[]));
        registry.register_meta(model::<B>("1", &[Type::of::<A>()]));
        registry.register_meta(model::<C>("2", &[Type::of::<A>()]));
        registry.register_meta(model::<D>("3", &[Type::of::<C>()]));
        registry.register_migration::<A, B>();
        registry.register_migration::<C, D>();

        let mut cache = VersionCache::default();
        assert!(matches!(
            cache.get(&registry, TypeId::of::<B>()),
            Err(VersionError::DuplicateVersion { version: "1", .. })
        ));
        assert!(matches!(
            cache.get(&registry, TypeId::of::<D>()),
            Err(VersionError::MissingMigration { .. })
        ));
    }

    #[test]
    fn ancestors_must_be_registered_and_versioned() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(TypeMeta::of::<A>(TypeKind::Primitive));
        registry.register_meta(model::<B>("2", &[Type::of::<A>()]));
        registry.register_meta(model::<C>("2", &[Type::of::<D>()]));

        let mut cache = VersionCache::default();
        assert!(matches!(
            cache.get(&registry, TypeId::of::<B>()),
            Err(VersionError::UnversionedAncestor { .. })
        ));
        assert!(matches!(
            cache.get(&registry, TypeId::of::<C>()),
            Err(VersionError::UnregisteredAncestor { .. })
        ));
    }

    #[test]
    fn cyclic_ancestry_is_rejected() {
        let mut registry = TypeRegistry::empty();
        registry.register_meta(model::<A>("1", &[Type::of::<B>()]));
        registry.register_meta(model::<B>("2", &[Type::of::<A>()]));
        assert!(matches!(
            VersionCache::default().get(&registry, TypeId::of::<A>()),
            Err(VersionError::CyclicAncestry(_))
        ));
    }
}
