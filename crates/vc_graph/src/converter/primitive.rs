use alloc::string::{String, ToString};
use core::any::{Any, TypeId};
use core::marker::PhantomData;

use vc_document::{Document, Number};

use super::{Converter, unexpected, wrong_instance};
use crate::registry::TypeMeta;
use crate::{Config, Error, Serializer};

// -----------------------------------------------------------------------------
// Primitive

/// A leaf value with a fixed document representation.
pub trait Primitive: Any {
    fn to_document(&self, config: &Config) -> Document;

    /// Returns `None` if the document does not hold a valid value.
    fn from_document(data: &Document) -> Option<Self>
    where
        Self: Sized;
}

impl Primitive for () {
    fn to_document(&self, _: &Config) -> Document {
        Document::Null
    }

    fn from_document(data: &Document) -> Option<Self> {
        data.is_null().then_some(())
    }
}

impl Primitive for bool {
    fn to_document(&self, _: &Config) -> Document {
        Document::Bool(*self)
    }

    fn from_document(data: &Document) -> Option<Self> {
        data.as_bool()
    }
}

impl Primitive for char {
    fn to_document(&self, _: &Config) -> Document {
        Document::String(self.to_string())
    }

    fn from_document(data: &Document) -> Option<Self> {
        let mut chars = data.as_str()?.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }
}

impl Primitive for String {
    fn to_document(&self, _: &Config) -> Document {
        Document::String(self.clone())
    }

    fn from_document(data: &Document) -> Option<Self> {
        data.as_str().map(String::from)
    }
}

macro_rules! impl_narrow_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Primitive for $ty {
                fn to_document(&self, _: &Config) -> Document {
                    Document::from(i64::from(*self))
                }

                fn from_document(data: &Document) -> Option<Self> {
                    data.as_i64().and_then(|v| Self::try_from(v).ok())
                }
            }
        )*
    };
}

impl_narrow_int!(i8, i16, i32, u8, u16, u32);

macro_rules! impl_wide_int {
    ($($ty:ty => $as_number:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                fn to_document(&self, config: &Config) -> Document {
                    if config.wide_integers_as_strings {
                        Document::String(self.to_string())
                    } else {
                        Document::from(*self)
                    }
                }

                fn from_document(data: &Document) -> Option<Self> {
                    match data {
                        Document::Number(number) => number.$as_number(),
                        Document::String(text) => text.parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_wide_int!(i64 => as_i64, u64 => as_u64);

impl Primitive for isize {
    fn to_document(&self, config: &Config) -> Document {
        (*self as i64).to_document(config)
    }

    fn from_document(data: &Document) -> Option<Self> {
        i64::from_document(data).and_then(|v| Self::try_from(v).ok())
    }
}

impl Primitive for usize {
    fn to_document(&self, config: &Config) -> Document {
        (*self as u64).to_document(config)
    }

    fn from_document(data: &Document) -> Option<Self> {
        u64::from_document(data).and_then(|v| Self::try_from(v).ok())
    }
}

impl Primitive for f64 {
    fn to_document(&self, _: &Config) -> Document {
        Document::Number(Number::Float(*self))
    }

    fn from_document(data: &Document) -> Option<Self> {
        data.as_number().map(Number::as_f64)
    }
}

impl Primitive for f32 {
    fn to_document(&self, _: &Config) -> Document {
        Document::Number(Number::Float(f64::from(*self)))
    }

    fn from_document(data: &Document) -> Option<Self> {
        data.as_number().map(|n| n.as_f64() as f32)
    }
}

// -----------------------------------------------------------------------------
// PrimitiveConverter

/// Converter of a single [`Primitive`] type.
///
/// Registered in the direct pool, so lookups for `T` skip every predicate.
pub struct PrimitiveConverter<T>(PhantomData<fn() -> T>);

impl<T> PrimitiveConverter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for PrimitiveConverter<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Primitive> Converter for PrimitiveConverter<T> {
    fn can_process(&self, meta: &TypeMeta) -> bool {
        meta.type_id() == TypeId::of::<T>()
    }

    fn request_cycle_support(&self, _: &TypeMeta) -> bool {
        false
    }

    fn request_inheritance_support(&self, _: &TypeMeta) -> bool {
        false
    }

    fn serialize(
        &self,
        serializer: &mut Serializer,
        value: &dyn Any,
        meta: &TypeMeta,
    ) -> Result<Document, Error> {
        let value = value.downcast_ref::<T>().ok_or_else(|| wrong_instance(meta))?;
        Ok(value.to_document(serializer.config()))
    }

    fn deserialize(
        &self,
        _: &mut Serializer,
        data: &Document,
        instance: &mut dyn Any,
        meta: &TypeMeta,
    ) -> Result<(), Error> {
        let value = T::from_document(data).ok_or_else(|| unexpected(meta, data))?;
        let slot = instance.downcast_mut::<T>().ok_or_else(|| wrong_instance(meta))?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use vc_document::Document;

    use super::Primitive;
    use crate::Config;

    #[test]
    fn wide_integers_as_strings() {
        let config = Config {
            wide_integers_as_strings: true,
            ..Config::default()
        };
        let doc = u64::MAX.to_document(&config);
        assert_eq!(doc, Document::from("18446744073709551615"));
        assert_eq!(u64::from_document(&doc), Some(u64::MAX));
        assert_eq!(u64::from_document(&u64::MAX.to_document(&Config::default())), Some(u64::MAX));
        assert_eq!(i64::from_document(&Document::from("-12")), Some(-12));
    }

    #[test]
    fn narrow_integers_reject_out_of_range() {
        assert_eq!(u8::from_document(&Document::from(256_i64)), None);
        assert_eq!(i8::from_document(&Document::from(-128_i64)), Some(-128));
        assert_eq!(u16::from_document(&Document::from(3.0)), Some(3));
        assert_eq!(u16::from_document(&Document::from("3")), None);
    }

    #[test]
    fn char_needs_exactly_one() {
        assert_eq!(char::from_document(&Document::from("x")), Some('x'));
        assert_eq!(char::from_document(&Document::from("xy")), None);
        assert_eq!(char::from_document(&Document::from("")), None);
        assert_eq!(
            String::from_document(&'é'.to_document(&Config::default())),
            Some(String::from("é"))
        );
    }
}
