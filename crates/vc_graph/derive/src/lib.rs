//! Derive macro for `vc_graph`. See [`Describe`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static GRAPH_ATTRIBUTE_NAME: &str = "graph";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// Implements `GetTypeMeta` for a struct with named fields or a fieldless enum.
///
/// The type must implement `Default`. Generic type parameters get a
/// `GetTypeMeta` bound, lifetime parameters are rejected.
///
/// See `vc_graph::Describe` for the list of `#[graph(...)]` attributes.
#[proc_macro_derive(Describe, attributes(graph))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impls::impl_describe(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
