//! Hash containers with a fixed hasher.
//!
//! Every cache of the crate is keyed by [`TypeId`], an object address or a
//! reference id, none of which is attacker controlled, so a fixed fast
//! state is used instead of a randomized one.

use core::any::TypeId;
use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x95EE04C4F326B271);

/// A [`BuildHasher`] that always produces the same hasher.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

pub type HashSet<K> = hashbrown::HashSet<K, FixedHashState>;

/// A map keyed by [`TypeId`].
pub type TypeIdMap<V> = HashMap<TypeId, V>;
