use alloc::string::String;
use core::fmt::Display;

use thiserror::Error;

use crate::cycle::ReferenceId;
use crate::version::VersionError;

// -----------------------------------------------------------------------------
// Error

/// A failure of a serialization or deserialization step.
///
/// Only a few variants are recoverable, see [`Error::is_recoverable`].
/// A recoverable failure of a single struct member is turned into a warning
/// and the member is skipped, unless [`Config::strict`] is set.
///
/// [`Config::strict`]: crate::Config::strict
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The type was never registered in the [`TypeRegistry`](crate::registry::TypeRegistry).
    #[error("type `{0}` is not registered")]
    Unregistered(String),
    /// No converter knows how to handle this type.
    #[error("no conversion is available for `{0}`")]
    Unsupported(String),
    /// The document does not have the shape the converter expects.
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
    /// The type cannot be instantiated from a document.
    #[error("cannot create an instance of `{0}`")]
    NotConstructible(String),
    /// A `$type` tag names an unknown or unassignable type.
    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),
    /// A `$ref` names an id that has not been defined before.
    #[error("reference to undefined object `{0}`")]
    DanglingReference(ReferenceId),
    /// A `$ref` or `$id` value is not a decimal id string.
    #[error("malformed reference id `{0}`")]
    MalformedReferenceId(String),
    /// There is no migration path from the stored version to the requested one.
    #[error("cannot import `{ty}` from version `{from}` into version `{to}`")]
    NoImportPath {
        ty: &'static str,
        from: String,
        to: &'static str,
    },
    /// A migration between two versioned models refused its input.
    #[error("migration from `{from}` to `{to}` failed")]
    MigrationFailed {
        from: &'static str,
        to: &'static str,
    },
    /// The declared version graph is invalid.
    #[error(transparent)]
    Version(#[from] VersionError),
    /// Any failure reported by a user converter.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a [`Mismatch`](Self::Mismatch) error.
    #[inline]
    pub fn mismatch(expected: impl Display, found: impl Display) -> Self {
        use alloc::string::ToString;

        Self::Mismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a [`Custom`](Self::Custom) error.
    #[inline]
    pub fn custom(message: impl Display) -> Self {
        use alloc::string::ToString;

        Self::Custom(message.to_string())
    }

    /// Returns `true` if the failure is local to the value being converted,
    /// so that the surrounding container may skip it and go on.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Mismatch { .. } | Self::InvalidTypeTag(_) | Self::NotConstructible(_)
        )
    }
}
