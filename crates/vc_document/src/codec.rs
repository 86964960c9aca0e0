//! `serde` bridge. The text format itself belongs to whichever serde codec
//! the caller picks.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{self, MapAccess, SeqAccess, Visitor};
use serde_core::ser::{SerializeMap, SerializeSeq};
use serde_core::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Document, Map, Number};

// -----------------------------------------------------------------------------
// Serialize

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Number::Int(v) => serializer.serialize_i64(v),
            Number::UInt(v) => serializer.serialize_u64(v),
            Number::Float(v) => serializer.serialize_f64(v),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(v) => serializer.serialize_bool(*v),
            Document::Number(v) => v.serialize(serializer),
            Document::String(v) => serializer.serialize_str(v),
            Document::Array(items) => {
                let mut state = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    state.serialize_element(item)?;
                }
                state.end()
            }
            Document::Object(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Deserialize

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any document value")
    }

    #[inline]
    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    #[inline]
    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    #[inline]
    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Document::deserialize(deserializer)
    }

    #[inline]
    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Bool(v))
    }

    #[inline]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Number(Number::Int(v)))
    }

    #[inline]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        Ok(Document::Number(Number::from(v)))
    }

    #[inline]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Number(Number::Float(v)))
    }

    #[inline]
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::String(String::from(v)))
    }

    #[inline]
    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Document>()? {
            items.push(item);
        }
        Ok(Document::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut map = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Document>()? {
            map.insert(key, value);
        }
        Ok(Document::Object(map))
    }
}

impl<'de> Deserialize<'de> for Document {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use crate::{Document, Map, Number};

    #[test]
    fn json_round_trip() {
        let text = r#"{"a":[1,2.5,"x",null,true],"b":{"$id":"0"}}"#;
        let doc: Document = serde_json::from_str(text).unwrap();

        let mut inner = Map::new();
        inner.insert(String::from("$id"), Document::from("0"));
        let mut expected = Map::new();
        expected.insert(
            String::from("a"),
            Document::Array(vec![
                Document::from(1_i64),
                Document::from(2.5),
                Document::from("x"),
                Document::Null,
                Document::Bool(true),
            ]),
        );
        expected.insert(String::from("b"), Document::Object(inner));

        assert_eq!(doc, Document::Object(expected));
        assert_eq!(serde_json::to_string(&doc).unwrap(), text);
    }

    #[test]
    fn large_unsigned_survives() {
        let doc: Document = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(doc, Document::Number(Number::UInt(u64::MAX)));
        assert_eq!(serde_json::to_string(&doc).unwrap(), "18446744073709551615");
    }
}
