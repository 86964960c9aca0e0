use super::ReferenceId;
use crate::hash::{HashMap, HashSet};
use crate::registry::Shared;

// -----------------------------------------------------------------------------
// ReferenceTracker

/// Per-call identity bookkeeping.
///
/// Every public entry point and every recursive call brackets its work with
/// [`enter`](Self::enter) and [`exit`](Self::exit). When the outermost exit
/// happens all state is dropped, so ids never leak from one top-level call
/// into the next.
#[derive(Default)]
pub struct ReferenceTracker {
    depth: usize,
    next_id: ReferenceId,
    // Serialization: object address -> id, holding the object alive so the
    // address cannot be reused within the call.
    ids: HashMap<usize, (ReferenceId, Shared)>,
    marked: HashSet<ReferenceId>,
    // Deserialization: id -> object.
    objects: HashMap<ReferenceId, Shared>,
}

impl ReferenceTracker {
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn enter(&mut self) {
        self.depth += 1;
    }

    /// Returns `true` if this was the outermost exit, after which the
    /// tracker is empty again.
    pub fn exit(&mut self) -> bool {
        debug_assert!(self.depth > 0, "unbalanced `ReferenceTracker::exit`");
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return false;
        }
        self.ids.clear();
        self.marked.clear();
        self.objects.clear();
        self.next_id = 0;
        true
    }

    /// The id of `object`, assigned on first request.
    pub fn reference_id(&mut self, object: &Shared) -> ReferenceId {
        let next_id = &mut self.next_id;
        self.ids
            .entry(object.addr())
            .or_insert_with(|| {
                let id = *next_id;
                *next_id += 1;
                (id, object.clone())
            })
            .0
    }

    /// Returns `true` if the definition of `object` has already been written.
    pub fn is_marked(&mut self, object: &Shared) -> bool {
        let id = self.reference_id(object);
        self.marked.contains(&id)
    }

    /// Records that the definition of `object` is being written.
    pub fn mark(&mut self, object: &Shared) -> ReferenceId {
        let id = self.reference_id(object);
        self.marked.insert(id);
        id
    }

    /// Registers a deserialized object before its members are read.
    pub fn register(&mut self, id: ReferenceId, object: Shared) {
        self.objects.insert(id, object);
    }

    pub fn resolve(&self, id: ReferenceId) -> Option<Shared> {
        self.objects.get(&id).cloned()
    }
}
