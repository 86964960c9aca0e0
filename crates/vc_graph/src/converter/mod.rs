//! Converters turn one kind of value into a [`Document`] and back.
//!
//! The serializer takes care of identity, polymorphism and versioning.
//! A converter only handles the payload of a single value and recurses into
//! the serializer for nested values.

// -----------------------------------------------------------------------------
// Modules

mod enums;
mod forward;
mod list;
mod map;
mod primitive;
mod reflected;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use enums::EnumConverter;
pub use forward::ForwardConverter;
pub use list::ListConverter;
pub use map::MapConverter;
pub use primitive::{Primitive, PrimitiveConverter};
pub use reflected::ReflectedConverter;
pub use registry::ConverterRegistry;

// -----------------------------------------------------------------------------
// Converter

use alloc::boxed::Box;
use alloc::format;
use core::any::Any;

use vc_document::Document;

use crate::registry::TypeMeta;
use crate::{Error, Serializer};

/// Converts values of the types it [accepts](Converter::can_process).
///
/// # Examples
///
/// A converter that writes a newtype as a plain string:
///
/// ```
/// use core::any::Any;
/// use vc_graph::converter::Converter;
/// use vc_graph::registry::{Override, TypeKind, TypeMeta, TypeRegistry, default_instance};
/// use vc_graph::{Document, Error, Serializer, SerializerBuilder};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Tag(String);
///
/// struct TagConverter;
///
/// impl Converter for TagConverter {
///     fn can_process(&self, meta: &TypeMeta) -> bool {
///         meta.ty().is::<Tag>()
///     }
///
///     fn request_cycle_support(&self, _: &TypeMeta) -> bool {
///         false
///     }
///
///     fn serialize(&self, _: &mut Serializer, value: &dyn Any, _: &TypeMeta) -> Result<Document, Error> {
///         let tag = value.downcast_ref::<Tag>().ok_or_else(|| Error::custom("not a tag"))?;
///         Ok(Document::from(tag.0.as_str()))
///     }
///
///     fn deserialize(
///         &self,
///         _: &mut Serializer,
///         data: &Document,
///         instance: &mut dyn Any,
///         meta: &TypeMeta,
///     ) -> Result<(), Error> {
///         let text = data.as_str().ok_or_else(|| Error::mismatch(meta.name(), data.kind()))?;
///         let tag = instance.downcast_mut::<Tag>().ok_or_else(|| Error::custom("not a tag"))?;
///         tag.0 = text.into();
///         Ok(())
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register_meta(
///     TypeMeta::of::<Tag>(TypeKind::Primitive)
///         .with_constructor(default_instance::<Tag>)
///         .with_override(Override::converter(TagConverter)),
/// );
///
/// let mut serializer = SerializerBuilder::new(registry).build();
/// let doc = serializer.to_document(&Tag("red".into())).unwrap();
/// assert_eq!(doc, Document::from("red"));
/// assert_eq!(serializer.from_document::<Tag>(&doc).unwrap(), Tag("red".into()));
/// ```
pub trait Converter {
    /// Returns `true` if this converter handles the described type.
    fn can_process(&self, meta: &TypeMeta) -> bool;

    /// Whether objects handled by this converter are tracked by identity.
    ///
    /// Only relevant for objects behind a [`Shared`](crate::registry::Shared).
    /// Converters of leaf values usually return `false`, so that equal leaves
    /// are written inline instead of as references.
    fn request_cycle_support(&self, _meta: &TypeMeta) -> bool {
        true
    }

    /// Whether a slot of this storage type may hold another runtime type,
    /// in which case a `$type` tag is written when the types differ.
    fn request_inheritance_support(&self, meta: &TypeMeta) -> bool {
        !meta.is_sealed()
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error>;

    /// Populates `instance`, which is already of the type described by `meta`.
    fn deserialize(
        &self,
        serializer: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error>;

    /// Creates the instance that [`deserialize`](Self::deserialize) will populate.
    fn create_instance(&self, _data: &Document, meta: &TypeMeta) -> Result<Box<dyn Any>, Error> {
        meta.create_instance()
            .ok_or_else(|| Error::NotConstructible(meta.name().into()))
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// The error for a document of the wrong shape.
#[inline]
fn unexpected(meta: &TypeMeta, data: &Document) -> Error {
    Error::mismatch(format!("`{}`", meta.name()), data.kind())
}

/// The error for an erased value that is not of the described type.
#[inline]
pub(crate) fn wrong_instance(meta: &TypeMeta) -> Error {
    Error::mismatch(format!("an instance of `{}`", meta.name()), "another type")
}
