//! Versioned models and their migration graphs.
//!
//! A model declares a version string and its direct ancestors, older models
//! it can be imported from. Following ancestors transitively gives a
//! directed acyclic graph. Reading a document written by an older model
//! finds a path through that graph and runs one migration per edge.

mod cache;
mod graph;

pub use cache::VersionCache;
pub use graph::VersionedType;

use thiserror::Error;

/// An invalid version graph.
///
/// These are configuration errors. They are reported the first time the
/// model is used and cached afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VersionError {
    /// Two different models of one graph share a version string.
    #[error("`{first}` and `{second}` both declare version `{version}`")]
    DuplicateVersion {
        version: &'static str,
        first: &'static str,
        second: &'static str,
    },
    /// An ancestor edge has no registered migration.
    #[error("no migration from `{from}` to `{to}` is registered")]
    MissingMigration {
        from: &'static str,
        to: &'static str,
    },
    /// An ancestor does not declare a version.
    #[error("ancestor `{ancestor}` of `{model}` is not versioned")]
    UnversionedAncestor {
        model: &'static str,
        ancestor: &'static str,
    },
    /// An ancestor was never registered.
    #[error("ancestor `{ancestor}` of `{model}` is not registered")]
    UnregisteredAncestor {
        model: &'static str,
        ancestor: &'static str,
    },
    /// A model is its own ancestor.
    #[error("`{0}` is its own ancestor")]
    CyclicAncestry(&'static str),
}
