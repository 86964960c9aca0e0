use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::Number;
use crate::keys::{CONTENT_KEY, is_reserved_key};

/// Members of a [`Document::Object`].
///
/// Ordering carries no meaning. A sorted map keeps printed output stable.
pub type Map = BTreeMap<String, Document>;

// -----------------------------------------------------------------------------
// Document

/// A node of the document tree.
///
/// Documents are built bottom-up by the serialization pipeline and stay
/// mutable until the whole top-level call finishes, which is what allows
/// identity metadata to be stamped onto a node after it has been produced.
///
/// Equality is structural and compares payloads only.
///
/// # Examples
///
/// ```
/// use vc_document::{Document, Map};
///
/// let mut map = Map::new();
/// map.insert("name".into(), Document::from("ferris"));
/// map.insert("legs".into(), Document::from(6_i64));
///
/// let doc = Document::Object(map);
/// assert_eq!(doc.get("legs").and_then(Document::as_i64), Some(6));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Document>),
    Object(Map),
}

impl Document {
    /// A short name of the variant, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[Document]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up an object member. Returns `None` for non-objects.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Turns `self` into an object so that metadata can be attached to it.
    ///
    /// Objects are returned as they are. Any other value is moved under
    /// [`CONTENT_KEY`] of a fresh object, so the original payload survives.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_document::{CONTENT_KEY, Document};
    ///
    /// let mut doc = Document::from(3_i64);
    /// doc.ensure_object().insert("$version".into(), Document::from("2"));
    ///
    /// assert_eq!(doc.get(CONTENT_KEY), Some(&Document::from(3_i64)));
    /// assert_eq!(doc.unwrap_content(), &Document::from(3_i64));
    /// ```
    pub fn ensure_object(&mut self) -> &mut Map {
        if !self.is_object() {
            let content = mem::take(self);
            let mut map = Map::new();
            map.insert(String::from(CONTENT_KEY), content);
            *self = Self::Object(map);
        }

        match self {
            Self::Object(map) => map,
            _ => unreachable!("`ensure_object` always leaves an object behind"),
        }
    }

    /// Returns `true` if this node was wrapped by [`ensure_object`](Self::ensure_object).
    #[inline]
    pub fn is_wrapped(&self) -> bool {
        self.get(CONTENT_KEY).is_some()
    }

    /// The exact inverse of [`ensure_object`](Self::ensure_object).
    ///
    /// Returns the payload under [`CONTENT_KEY`] if present, otherwise `self`.
    #[inline]
    pub fn unwrap_content(&self) -> &Document {
        self.get(CONTENT_KEY).unwrap_or(self)
    }

    /// Returns `true` if the object holds any member that is not a reserved key.
    pub fn has_user_members(&self) -> bool {
        self.as_object()
            .is_some_and(|map| map.keys().any(|key| !is_reserved_key(key)))
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from {
    ($($ty:ty => |$v:ident| $expr:expr),* $(,)?) => {
        $(
            impl From<$ty> for Document {
                #[inline]
                fn from($v: $ty) -> Self {
                    $expr
                }
            }
        )*
    };
}

impl_from! {
    bool => |v| Self::Bool(v),
    i64 => |v| Self::Number(Number::Int(v)),
    u64 => |v| Self::Number(Number::from(v)),
    f64 => |v| Self::Number(Number::Float(v)),
    Number => |v| Self::Number(v),
    String => |v| Self::String(v),
    &str => |v| Self::String(String::from(v)),
    Vec<Document> => |v| Self::Array(v),
    Map => |v| Self::Object(v),
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{Document, Map};
    use crate::{CONTENT_KEY, TYPE_KEY};

    #[test]
    fn ensure_object_keeps_objects() {
        let mut map = Map::new();
        map.insert(String::from("a"), Document::Null);
        let mut doc = Document::Object(map.clone());

        doc.ensure_object()
            .insert(String::from(TYPE_KEY), Document::from("T"));

        assert!(!doc.is_wrapped());
        assert_eq!(doc.get("a"), Some(&Document::Null));
        assert_eq!(doc.unwrap_content(), &doc);
    }

    #[test]
    fn ensure_object_wraps_values() {
        let original = Document::Array(vec![Document::from(1_i64), Document::from("x")]);
        let mut doc = original.clone();

        doc.ensure_object();

        assert!(doc.is_wrapped());
        assert_eq!(doc.get(CONTENT_KEY), Some(&original));
        assert_eq!(doc.unwrap_content(), &original);
        assert!(!doc.has_user_members());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Document::from(2_i64), Document::from(2.0));
        assert_ne!(Document::from("2"), Document::from(2_i64));
        assert_ne!(Document::Array(vec![]), Document::Object(Map::new()));
    }
}
