use core::any::Any;

use vc_document::Document;

use crate::registry::TypeMeta;

/// Hooks that run around the conversion of the types a processor accepts.
///
/// Processors never change which converter is used. They observe values and
/// may adjust documents. Every hook has an empty default.
///
/// - Serialization calls [`before_serialize`](Self::before_serialize) with
///   the value and [`after_serialize`](Self::after_serialize) with the
///   finished document, metadata included.
/// - Deserialization calls [`before_deserialize`](Self::before_deserialize)
///   with a copy of the document once the runtime type is known, and
///   [`after_deserialize`](Self::after_deserialize) with the populated
///   instance.
pub trait Processor {
    fn can_process(&self, meta: &TypeMeta) -> bool;

    fn before_serialize(&self, _meta: &TypeMeta, _value: &dyn Any) {}

    fn after_serialize(&self, _meta: &TypeMeta, _value: &dyn Any, _data: &mut Document) {}

    fn before_deserialize(&self, _meta: &TypeMeta, _data: &mut Document) {}

    fn after_deserialize(&self, _meta: &TypeMeta, _instance: &mut dyn Any) {}
}
