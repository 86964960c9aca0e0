use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use super::VersionError;
use crate::hash::{HashMap, TypeIdMap};
use crate::registry::{MigrateFn, Type, TypeRegistry};

// -----------------------------------------------------------------------------
// VersionedType

/// A node of a version graph.
pub struct VersionedType {
    version: &'static str,
    model: Type,
    ancestors: Vec<Rc<VersionedType>>,
    // Parallel to `ancestors`.
    migrations: Vec<MigrateFn>,
}

impl VersionedType {
    #[inline]
    pub const fn version(&self) -> &'static str {
        self.version
    }

    /// The concrete type of this version.
    #[inline]
    pub const fn model(&self) -> Type {
        self.model
    }

    #[inline]
    pub fn ancestors(&self) -> &[Rc<VersionedType>] {
        &self.ancestors
    }

    /// Runs the migration from the direct ancestor `from` into this model.
    ///
    /// Returns the input if `from` is not a direct ancestor or the migration
    /// refuses the value.
    pub fn migrate(&self, from: TypeId, value: Box<dyn Any>) -> Result<Box<dyn Any>, Box<dyn Any>> {
        match self.migration(from) {
            Some(migration) => migration(value),
            None => Err(value),
        }
    }

    pub fn migration(&self, from: TypeId) -> Option<MigrateFn> {
        self.ancestors
            .iter()
            .position(|ancestor| ancestor.model.id() == from)
            .map(|index| self.migrations[index])
    }

    /// Finds the models to go through when importing data written as
    /// `version`, starting with the model of that version and ending with
    /// `self`.
    ///
    /// Ancestors are searched depth first in declaration order and the first
    /// path found is used.
    pub fn import_path(self: &Rc<Self>, version: &str) -> Option<Vec<Rc<VersionedType>>> {
        let mut path = Vec::new();
        if !Self::import_path_rec(self, version, &mut path) {
            return None;
        }
        path.push(self.clone());
        Some(path)
    }

    fn import_path_rec(current: &Rc<Self>, version: &str, path: &mut Vec<Rc<VersionedType>>) -> bool {
        for ancestor in &current.ancestors {
            if ancestor.version == version || Self::import_path_rec(ancestor, version, path) {
                path.push(ancestor.clone());
                return true;
            }
        }
        false
    }

    /// Builds the graph rooted at `model`.
    ///
    /// Returns `Ok(None)` if the model is not versioned.
    pub fn build(registry: &TypeRegistry, model: TypeId) -> Result<Option<Rc<Self>>, VersionError> {
        let mut builder = Builder {
            registry,
            in_progress: Vec::new(),
            done: TypeIdMap::default(),
        };
        let Some(root) = builder.build(model)? else {
            return Ok(None);
        };
        root.validate()?;
        Ok(Some(root))
    }

    // Every model reachable from `self` must have a unique version string.
    fn validate(self: &Rc<Self>) -> Result<(), VersionError> {
        let mut seen: HashMap<&'static str, Type> = HashMap::default();
        let mut queue: Vec<&Rc<VersionedType>> = Vec::from([self]);
        while let Some(node) = queue.pop() {
            match seen.get(node.version) {
                Some(model) if *model == node.model => continue,
                Some(model) => {
                    return Err(VersionError::DuplicateVersion {
                        version: node.version,
                        first: model.path(),
                        second: node.model.path(),
                    });
                }
                None => {
                    seen.insert(node.version, node.model);
                }
            }
            queue.extend(node.ancestors.iter());
        }
        Ok(())
    }
}

impl fmt::Debug for VersionedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedType")
            .field("version", &self.version)
            .field("model", &self.model)
            .field(
                "ancestors",
                &self.ancestors.iter().map(|a| a.version).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Builder

struct Builder<'a> {
    registry: &'a TypeRegistry,
    in_progress: Vec<TypeId>,
    // Shares nodes reached through several paths.
    done: TypeIdMap<Rc<VersionedType>>,
}

impl Builder<'_> {
    fn build(&mut self, model: TypeId) -> Result<Option<Rc<VersionedType>>, VersionError> {
        if let Some(node) = self.done.get(&model) {
            return Ok(Some(node.clone()));
        }
        let registry = self.registry;
        let Some(meta) = registry.get(model) else {
            return Ok(None);
        };
        let Some(versioning) = meta.versioning() else {
            return Ok(None);
        };
        if self.in_progress.contains(&model) {
            return Err(VersionError::CyclicAncestry(meta.ty().path()));
        }

        self.in_progress.push(model);
        let mut ancestors = Vec::with_capacity(versioning.ancestors().len());
        let mut migrations = Vec::with_capacity(versioning.ancestors().len());
        for ancestor in versioning.ancestors() {
            if !registry.contains(ancestor.id()) {
                return Err(VersionError::UnregisteredAncestor {
                    model: meta.ty().path(),
                    ancestor: ancestor.path(),
                });
            }
            let Some(node) = self.build(ancestor.id())? else {
                return Err(VersionError::UnversionedAncestor {
                    model: meta.ty().path(),
                    ancestor: ancestor.path(),
                });
            };
            let Some(migration) = versioning.migration(ancestor.id()) else {
                return Err(VersionError::MissingMigration {
                    from: ancestor.path(),
                    to: meta.ty().path(),
                });
            };
            ancestors.push(node);
            migrations.push(migration);
        }
        self.in_progress.pop();

        let node = Rc::new(VersionedType {
            version: versioning.version(),
            model: meta.ty(),
            ancestors,
            migrations,
        });
        self.done.insert(model, node.clone());
        Ok(Some(node))
    }
}
