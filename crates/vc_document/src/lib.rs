#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod codec;
mod document;
mod keys;
mod number;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use document::{Document, Map};
pub use keys::{CONTENT_KEY, DEFINITION_KEY, REFERENCE_KEY, TYPE_KEY, VERSION_KEY};
pub use keys::{RESERVED_KEYS, is_reserved_key};
pub use number::Number;
