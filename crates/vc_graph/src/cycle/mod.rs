//! Object identity across one top-level call.

mod lazy;
mod tracker;

pub use lazy::LazyDefinitionWriter;
pub use tracker::ReferenceTracker;

/// Id of an object within one top-level call, written as a decimal string.
pub type ReferenceId = usize;

use alloc::string::{String, ToString};

use vc_document::{CONTENT_KEY, DEFINITION_KEY, Document, Map, REFERENCE_KEY};

use crate::Error;

#[inline]
pub(crate) fn write_id(id: ReferenceId) -> Document {
    Document::String(id.to_string())
}

pub(crate) fn parse_id(data: &Document) -> Result<ReferenceId, Error> {
    match data {
        Document::String(text) => text
            .parse()
            .map_err(|_| Error::MalformedReferenceId(text.clone())),
        other => Err(Error::MalformedReferenceId(String::from(other.kind()))),
    }
}

/// Whether `data` is the definition of or a reference to an object.
///
/// Metadata of another object must not be merged into such a node.
pub(crate) fn has_identity(data: &Document) -> bool {
    data.get(DEFINITION_KEY).is_some() || data.get(REFERENCE_KEY).is_some()
}

/// Nests `data` under `$content`, even when it already is an object.
pub(crate) fn wrap_content(data: Document) -> Document {
    let mut map = Map::new();
    map.insert(String::from(CONTENT_KEY), data);
    Document::Object(map)
}
