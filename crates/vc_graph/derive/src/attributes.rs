//! Parsing of `#[graph(...)]` attributes.

use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr, Token, Type, parenthesized};

use crate::GRAPH_ATTRIBUTE_NAME;

fn graph_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(GRAPH_ATTRIBUTE_NAME))
}

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_types(meta: &ParseNestedMeta) -> syn::Result<Vec<Type>> {
    let content;
    parenthesized!(content in meta.input);
    let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
    Ok(types.into_iter().collect())
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Attributes placed on the struct or enum itself.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `#[graph(name = "...")]`
    pub name: Option<LitStr>,
    /// `#[graph(sealed)]`
    pub sealed: Option<Span>,
    /// `#[graph(extends(A, B))]`
    pub extends: Vec<Type>,
    /// `#[graph(version = "...")]`
    pub version: Option<LitStr>,
    /// `#[graph(ancestors(A, B))]`
    pub ancestors: Vec<Type>,
    /// `#[graph(forward = "field")]`
    pub forward: Option<LitStr>,
    /// `#[graph(converter = Path)]`
    pub converter: Option<syn::Path>,
}

impl TypeAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in graph_attributes(attrs) {
            attr.parse_nested_meta(|meta| this.parse_meta(meta))?;
        }
        this.validate()?;
        Ok(this)
    }

    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.name, value, &meta)
        } else if meta.path.is_ident("sealed") {
            set_once(&mut self.sealed, meta.path.span(), &meta)
        } else if meta.path.is_ident("extends") {
            self.extends.extend(parse_types(&meta)?);
            Ok(())
        } else if meta.path.is_ident("version") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.version, value, &meta)
        } else if meta.path.is_ident("ancestors") {
            self.ancestors.extend(parse_types(&meta)?);
            Ok(())
        } else if meta.path.is_ident("forward") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.forward, value, &meta)
        } else if meta.path.is_ident("converter") {
            let value = meta.value()?.parse()?;
            set_once(&mut self.converter, value, &meta)
        } else {
            Err(meta.error(
                "unknown attribute, expected one of `name`, `sealed`, `extends`, \
                 `version`, `ancestors`, `forward` or `converter`",
            ))
        }
    }

    fn validate(&self) -> syn::Result<()> {
        if self.version.is_none()
            && let Some(first) = self.ancestors.first()
        {
            return Err(syn::Error::new(
                first.span(),
                "`ancestors` needs a `version` on the same type",
            ));
        }
        if let (Some(forward), Some(_)) = (&self.forward, &self.converter) {
            return Err(syn::Error::new(
                forward.span(),
                "`forward` and `converter` cannot be used together",
            ));
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Attributes placed on a field or an enum variant.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    /// `#[graph(skip)]`, fields only.
    pub skip: Option<Span>,
    /// `#[graph(rename = "...")]`
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in graph_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    set_once(&mut this.skip, meta.path.span(), &meta)
                } else if meta.path.is_ident("rename") {
                    let value = meta.value()?.parse()?;
                    set_once(&mut this.rename, value, &meta)
                } else {
                    Err(meta.error("unknown attribute, expected `skip` or `rename`"))
                }
            })?;
        }
        if let (Some(skip), Some(_)) = (this.skip, &this.rename) {
            return Err(syn::Error::new(skip, "a skipped field cannot be renamed"));
        }
        Ok(this)
    }
}
