//! Type descriptions: what the serializer knows about each type.
//!
//! - [`TypeRegistry`]: the store, filled by explicit registration.
//! - [`TypeMeta`]: the description of one type.
//! - [`Shared`] and [`Ref`]: handles to objects with identity.

// -----------------------------------------------------------------------------
// Modules

mod impls;
mod kind;
mod meta;
mod shared;
mod ty;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use kind::{EnumInfo, ListInfo, MapInfo, Member, OptionInfo, RefInfo, StructInfo, TypeKind};
pub use meta::{GetTypeMeta, MigrateFn, Override, TypeMeta, Versioning, default_instance};
pub use shared::{Ref, Shared};
pub use ty::Type;
pub use type_registry::TypeRegistry;
