use alloc::string::String;
use alloc::vec::Vec;

use crate::Error;

// -----------------------------------------------------------------------------
// Outcome

/// The result of a top-level [`try_serialize`] or [`try_deserialize`] call.
///
/// An outcome is either a success or a hard failure, and carries every
/// warning produced along the way in both cases.
///
/// [`try_serialize`]: crate::Serializer::try_serialize
/// [`try_deserialize`]: crate::Serializer::try_deserialize
#[derive(Debug, Default)]
#[must_use]
pub struct Outcome {
    error: Option<Error>,
    warnings: Vec<String>,
}

impl Outcome {
    #[inline]
    pub const fn success(warnings: Vec<String>) -> Self {
        Self {
            error: None,
            warnings,
        }
    }

    #[inline]
    pub const fn failure(error: Error, warnings: Vec<String>) -> Self {
        Self {
            error: Some(error),
            warnings,
        }
    }

    #[inline]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    #[inline]
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }

    #[inline]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    #[inline]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    #[inline]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Combines two outcomes.
    ///
    /// Warnings are concatenated. The first hard failure is kept.
    pub fn merge(&mut self, other: Outcome) {
        self.warnings.extend(other.warnings);
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    /// Converts into a plain [`Result`], keeping the warnings on success.
    pub fn into_result(self) -> Result<Vec<String>, Error> {
        match self.error {
            None => Ok(self.warnings),
            Some(error) => Err(error),
        }
    }
}
