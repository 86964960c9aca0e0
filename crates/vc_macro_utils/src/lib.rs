//! Helpers shared by the `vc_*` derive crates.
#![allow(clippy::std_instead_of_core, reason = "proc-macro crate")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro crate")]

// -----------------------------------------------------------------------------
// Modules

mod manifest;

// -----------------------------------------------------------------------------
// Exports

pub use manifest::Manifest;
