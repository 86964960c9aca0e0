use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use super::{Member, Type, TypeKind, TypeRegistry};
use crate::converter::Converter;
use crate::hash::TypeIdMap;

/// Converts a boxed value of an older model into the next model.
///
/// The input is handed back on failure.
pub type MigrateFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>, Box<dyn Any>>;

/// Creates a boxed `T::default()`.
///
/// Used as [`TypeMeta::with_constructor`] argument.
pub fn default_instance<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

// -----------------------------------------------------------------------------
// Override

/// A converter choice made for one specific type.
///
/// It takes precedence over every converter pool.
#[derive(Clone)]
pub enum Override {
    /// Use this converter.
    Converter(Rc<dyn Converter>),
    /// Serialize the type as the named member alone.
    Forward(&'static str),
}

impl Override {
    pub fn converter(converter: impl Converter + 'static) -> Self {
        Self::Converter(Rc::new(converter))
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converter(_) => f.write_str("Converter(..)"),
            Self::Forward(member) => f.debug_tuple("Forward").field(member).finish(),
        }
    }
}

// -----------------------------------------------------------------------------
// Versioning

/// Version declaration of a model.
///
/// A model lists its direct ancestors, the older models it can be imported
/// from. For every ancestor a migration must be registered with
/// [`TypeRegistry::register_migration`].
pub struct Versioning {
    version: &'static str,
    ancestors: Vec<Type>,
    migrations: TypeIdMap<MigrateFn>,
}

impl Versioning {
    #[inline]
    pub const fn version(&self) -> &'static str {
        self.version
    }

    #[inline]
    pub fn ancestors(&self) -> &[Type] {
        &self.ancestors
    }

    /// The migration from a direct ancestor into this model.
    #[inline]
    pub fn migration(&self, ancestor: TypeId) -> Option<MigrateFn> {
        self.migrations.get(&ancestor).copied()
    }

    #[inline]
    pub(crate) fn insert_migration(&mut self, ancestor: TypeId, migration: MigrateFn) {
        self.migrations.insert(ancestor, migration);
    }
}

impl fmt::Debug for Versioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versioning")
            .field("version", &self.version)
            .field("ancestors", &self.ancestors)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypeMeta

/// Everything the serializer knows about one type.
///
/// Built once per type by [`GetTypeMeta::get_type_meta`], usually through
/// `#[derive(Describe)]`.
///
/// # Examples
///
/// ```
/// use vc_graph::registry::{TypeKind, TypeMeta, default_instance};
///
/// #[derive(Default)]
/// struct Handle(u64);
///
/// let meta = TypeMeta::of::<Handle>(TypeKind::Primitive)
///     .with_name("Handle")
///     .with_constructor(default_instance::<Handle>);
///
/// assert_eq!(meta.name(), "Handle");
/// assert!(meta.create_instance().is_some());
/// ```
pub struct TypeMeta {
    ty: Type,
    name: &'static str,
    kind: TypeKind,
    constructor: Option<fn() -> Box<dyn Any>>,
    sealed: bool,
    extends: Vec<Type>,
    attribute_override: Option<Override>,
    versioning: Option<Versioning>,
}

impl TypeMeta {
    /// Creates metadata for `T`, named after its type path.
    pub fn of<T: Any>(kind: TypeKind) -> Self {
        let ty = Type::of::<T>();
        Self {
            ty,
            name: ty.path(),
            kind,
            constructor: None,
            sealed: false,
            extends: Vec::new(),
            attribute_override: None,
            versioning: None,
        }
    }

    /// Sets the name written to and resolved from `$type` tags.
    #[inline]
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    #[inline]
    pub fn with_constructor(mut self, constructor: fn() -> Box<dyn Any>) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Marks the type as never holding another runtime type.
    ///
    /// Sealed storage types never get a `$type` tag.
    #[inline]
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Declares that objects of this type may be stored in `base` slots.
    #[inline]
    pub fn with_extends(mut self, base: Type) -> Self {
        self.extends.push(base);
        self
    }

    #[inline]
    pub fn with_override(mut self, attribute_override: Override) -> Self {
        self.attribute_override = Some(attribute_override);
        self
    }

    /// Declares the model version and its direct ancestors.
    pub fn with_version(mut self, version: &'static str, ancestors: impl IntoIterator<Item = Type>) -> Self {
        self.versioning = Some(Versioning {
            version,
            ancestors: ancestors.into_iter().collect(),
            migrations: TypeIdMap::default(),
        });
        self
    }

    #[inline]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// The direct base types, see [`with_extends`](Self::with_extends).
    #[inline]
    pub fn extends(&self) -> &[Type] {
        &self.extends
    }

    /// Members of a struct type. Empty for every other kind.
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            TypeKind::Struct(info) => info.members(),
            _ => &[],
        }
    }

    #[inline]
    pub const fn attribute_override(&self) -> Option<&Override> {
        self.attribute_override.as_ref()
    }

    #[inline]
    pub const fn versioning(&self) -> Option<&Versioning> {
        self.versioning.as_ref()
    }

    #[inline]
    pub(crate) const fn versioning_mut(&mut self) -> Option<&mut Versioning> {
        self.versioning.as_mut()
    }

    #[inline]
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Creates a default instance, if the type has a constructor.
    #[inline]
    pub fn create_instance(&self) -> Option<Box<dyn Any>> {
        self.constructor.map(|constructor| constructor())
    }
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("ty", &self.ty)
            .field("name", &self.name)
            .field("kind", &self.kind.name())
            .field("sealed", &self.sealed)
            .field("extends", &self.extends)
            .field("versioning", &self.versioning)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// Types that can describe themselves to a [`TypeRegistry`].
///
/// Implement it with `#[derive(Describe)]` for structs and fieldless enums.
pub trait GetTypeMeta: Any {
    fn get_type_meta() -> TypeMeta;

    /// Registers the types this type refers to, such as member types.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
