#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;

// Lets `#[derive(Describe)]` output refer to `::vc_graph` inside this crate.
extern crate self as vc_graph;

// -----------------------------------------------------------------------------
// Modules

pub mod converter;
pub mod cycle;
pub mod registry;
pub mod version;

mod config;
mod error;
mod hash;
mod outcome;
mod processor;
mod serializer;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use config::{Config, NameStyle};
pub use error::Error;
pub use outcome::Outcome;
pub use processor::Processor;
pub use serializer::{Serializer, SerializerBuilder};

pub use vc_document::{Document, Map, Number};

/// Implements [`GetTypeMeta`](registry::GetTypeMeta).
///
/// Supports structs with named fields and fieldless enums. Both need a
/// [`Default`] implementation, which is what deserialization starts from.
///
/// # Container attributes
///
/// - `#[graph(name = "...")]`: the name used in `$type` tags, the type path by default.
/// - `#[graph(sealed)]`: slots of this type never hold another type.
/// - `#[graph(extends(A, B))]`: objects of this type may be stored as `A` or `B`.
/// - `#[graph(version = "...")]` and `#[graph(ancestors(A, B))]`: versioning.
/// - `#[graph(forward = "field")]`: serialize the struct as this field alone.
/// - `#[graph(converter = Path)]`: use the converter `Path::default()`.
///
/// # Field attributes
///
/// - `#[graph(skip)]`: never read nor written.
/// - `#[graph(rename = "...")]`: the member name in documents.
///
/// # Examples
///
/// ```
/// use vc_graph::Describe;
///
/// #[derive(Describe, Default)]
/// #[graph(name = "Monster", version = "2", ancestors(MonsterV1))]
/// struct Monster {
///     #[graph(rename = "hp")]
///     hit_points: u32,
///     #[graph(skip)]
///     cached_strength: f32,
/// }
///
/// #[derive(Describe, Default)]
/// #[graph(version = "1")]
/// struct MonsterV1 {
///     health: u32,
/// }
///
/// impl From<MonsterV1> for Monster {
///     fn from(old: MonsterV1) -> Self {
///         Monster { hit_points: old.health, ..Default::default() }
///     }
/// }
/// ```
pub use vc_graph_derive::Describe;
