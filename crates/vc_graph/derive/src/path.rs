//! Paths into `vc_graph` used by the generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the correct access path to the `vc_graph` crate.
///
/// 1. For crates that depend on `vc_graph`, `::vc_graph` is returned.
/// 2. For crates that depend on `vc_persist`, `::vc_persist::graph` is returned.
/// 3. Otherwise `::vc_graph` is returned, which needs `extern crate self as vc_graph`
///    inside `vc_graph` itself.
///
/// This reads the caller's manifest, so resolve it once per expansion.
pub(crate) fn vc_graph() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_graph"))
}

#[inline]
pub(crate) fn type_meta_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::TypeMeta
    }
}

#[inline]
pub(crate) fn get_type_meta_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::GetTypeMeta
    }
}

#[inline]
pub(crate) fn type_registry_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::TypeRegistry
    }
}

#[inline]
pub(crate) fn type_kind_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::TypeKind
    }
}

#[inline]
pub(crate) fn type_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::Type
    }
}

#[inline]
pub(crate) fn member_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::Member
    }
}

#[inline]
pub(crate) fn struct_info_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::StructInfo
    }
}

#[inline]
pub(crate) fn enum_info_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::EnumInfo
    }
}

#[inline]
pub(crate) fn override_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::Override
    }
}

#[inline]
pub(crate) fn default_instance_(vc_graph_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_graph_path::registry::default_instance
    }
}

#[inline]
pub(crate) fn any_() -> TokenStream {
    quote! {
        ::core::any::Any
    }
}

#[inline]
pub(crate) fn option_() -> TokenStream {
    quote! {
        ::core::option::Option
    }
}

#[inline]
pub(crate) fn default_() -> TokenStream {
    quote! {
        ::core::default::Default
    }
}
