use alloc::string::String;

use log::trace;
use vc_document::{CONTENT_KEY, DEFINITION_KEY, Document, Map, REFERENCE_KEY};

use super::{ReferenceId, has_identity, parse_id, wrap_content, write_id};
use crate::hash::HashSet;

// -----------------------------------------------------------------------------
// LazyDefinitionWriter

/// Writes object definitions so that only referenced ones carry `$id`.
///
/// When a definition is produced it is not yet known whether a later part of
/// the graph will reference it. [`define`](Self::define) therefore stamps
/// every definition right away, and [`finish`](Self::finish) removes the
/// stamps of objects that were never referenced once the whole top-level
/// call is done.
///
/// A definition that already is another object's definition or reference,
/// as with a struct forwarding to a handle member, is wrapped in `$content`
/// so that both ids survive.
#[derive(Default)]
pub struct LazyDefinitionWriter {
    defined: HashSet<ReferenceId>,
    referenced: HashSet<ReferenceId>,
}

impl LazyDefinitionWriter {
    /// Stamps the definition of object `id`.
    pub fn define(&mut self, id: ReferenceId, definition: Document) -> Document {
        trace!("stamping object definition `{id}`");
        self.defined.insert(id);

        let mut definition = if has_identity(&definition) {
            wrap_content(definition)
        } else {
            definition
        };
        definition
            .ensure_object()
            .insert(String::from(DEFINITION_KEY), write_id(id));
        definition
    }

    /// Returns a reference to object `id`, keeping the stamp of its definition.
    pub fn reference(&mut self, id: ReferenceId) -> Document {
        self.referenced.insert(id);

        let mut map = Map::new();
        map.insert(String::from(REFERENCE_KEY), write_id(id));
        Document::Object(map)
    }

    /// Removes the stamps of unreferenced definitions from `root`, then
    /// forgets all state.
    pub fn finish(&mut self, root: &mut Document) {
        if self.defined.iter().any(|id| !self.referenced.contains(id)) {
            self.unstamp(root);
        }
        self.clear();
    }

    /// Forgets all state, used when a call fails.
    pub fn clear(&mut self) {
        self.defined.clear();
        self.referenced.clear();
    }

    fn unstamp(&self, node: &mut Document) {
        match node {
            Document::Array(items) => items.iter_mut().for_each(|item| self.unstamp(item)),
            Document::Object(map) => map.values_mut().for_each(|value| self.unstamp(value)),
            _ => return,
        }

        let Some(map) = node.as_object_mut() else {
            return;
        };
        let unreferenced = map
            .get(DEFINITION_KEY)
            .and_then(|id| parse_id(id).ok())
            .is_some_and(|id| self.defined.contains(&id) && !self.referenced.contains(&id));
        if !unreferenced {
            return;
        }
        map.remove(DEFINITION_KEY);

        // A lone `$content` only comes from a stamp. It stays around another
        // object's identity.
        if map.len() == 1
            && map.get(CONTENT_KEY).is_some_and(|content| !has_identity(content))
            && let Some(content) = map.remove(CONTENT_KEY)
        {
            *node = content;
        }
    }
}
