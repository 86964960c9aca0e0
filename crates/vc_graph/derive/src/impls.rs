//! Code generation for `#[derive(Describe)]`.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{Data, DataEnum, DeriveInput, Fields, FieldsNamed, Generics, Ident, LitStr, parse_quote};

use crate::attributes::{FieldAttributes, TypeAttributes};

/// A field that becomes a member.
struct MemberField<'a> {
    ident: &'a Ident,
    ty: &'a syn::Type,
    name: LitStr,
}

pub(crate) fn impl_describe(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if let Some(lifetime) = ast.generics.lifetimes().next() {
        return Err(syn::Error::new(
            lifetime.span(),
            "`Describe` types must be `'static`, lifetime parameters are not supported",
        ));
    }

    let attrs = TypeAttributes::parse(&ast.attrs)?;
    let vc_graph_path = crate::path::vc_graph();
    let no_fields: FieldsNamed = parse_quote!({});

    let (kind, dependencies, forward) = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => struct_kind(&vc_graph_path, fields, &attrs)?,
            Fields::Unit => struct_kind(&vc_graph_path, &no_fields, &attrs)?,
            Fields::Unnamed(fields) => {
                return Err(syn::Error::new(
                    fields.span(),
                    "`Describe` needs named fields, tuple structs are not supported",
                ));
            }
        },
        Data::Enum(data) => {
            if let Some(forward) = &attrs.forward {
                return Err(syn::Error::new(forward.span(), "`forward` is only valid on structs"));
            }
            (enum_kind(&vc_graph_path, data, ast.ident.span())?, Vec::new(), None)
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "`Describe` does not support unions",
            ));
        }
    };

    let is_enum = matches!(ast.data, Data::Enum(_));
    let builder = builder_calls(&vc_graph_path, &attrs, forward, is_enum);
    let register = register_calls(&vc_graph_path, &attrs, &dependencies);

    let type_meta_ = crate::path::type_meta_(&vc_graph_path);
    let get_type_meta_ = crate::path::get_type_meta_(&vc_graph_path);
    let type_registry_ = crate::path::type_registry_(&vc_graph_path);

    let ident = &ast.ident;
    let generics = bounded_generics(&vc_graph_path, ast);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #get_type_meta_ for #ident #ty_generics #where_clause {
            fn get_type_meta() -> #type_meta_ {
                #type_meta_::of::<Self>(#kind)
                    #builder
            }

            #[allow(unused_variables)]
            fn register_dependencies(registry: &mut #type_registry_) {
                #register
            }
        }
    })
}

fn bounded_generics(vc_graph_path: &syn::Path, ast: &DeriveInput) -> Generics {
    let get_type_meta_ = crate::path::get_type_meta_(vc_graph_path);
    let default_ = crate::path::default_();

    let mut generics = ast.generics.clone();
    if generics.type_params().next().is_none() {
        return generics;
    }

    let params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    let ident = &ast.ident;
    let (_, ty_generics, _) = ast.generics.split_for_impl();

    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(parse_quote!(#param: #get_type_meta_));
    }
    where_clause
        .predicates
        .push(parse_quote!(#ident #ty_generics: #default_));
    generics
}

// -----------------------------------------------------------------------------
// Kinds

fn struct_kind<'a>(
    vc_graph_path: &syn::Path,
    fields: &'a FieldsNamed,
    attrs: &TypeAttributes,
) -> syn::Result<(TokenStream, Vec<&'a syn::Type>, Option<LitStr>)> {
    let type_kind_ = crate::path::type_kind_(vc_graph_path);
    let struct_info_ = crate::path::struct_info_(vc_graph_path);
    let member_ = crate::path::member_(vc_graph_path);

    let mut members = Vec::new();
    let mut forward = None;
    for field in &fields.named {
        let field_attrs = FieldAttributes::parse(&field.attrs)?;
        let Some(ident) = &field.ident else {
            continue;
        };
        let is_forward_target = attrs.forward.as_ref().is_some_and(|f| ident == &f.value());

        if let Some(skip) = field_attrs.skip {
            if is_forward_target {
                return Err(syn::Error::new(skip, "cannot forward to a skipped field"));
            }
            continue;
        }

        let name = field_attrs
            .rename
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
        if is_forward_target {
            forward = Some(name.clone());
        }
        members.push(MemberField {
            ident,
            ty: &field.ty,
            name,
        });
    }

    if let Some(target) = &attrs.forward
        && forward.is_none()
    {
        return Err(syn::Error::new(
            target.span(),
            format!("no field named `{}` to forward to", target.value()),
        ));
    }

    let count = members.len();
    let entries = members.iter().map(|member| {
        let MemberField { ident, ty, name } = member;
        quote_spanned! { ty.span() =>
            #member_::new::<Self, #ty>(#name, |value| &value.#ident, |value| &mut value.#ident)
        }
    });
    let kind = quote! {
        #type_kind_::Struct(#struct_info_::new({
            let members: [#member_; #count] = [#(#entries),*];
            members
        }))
    };
    let dependencies = members.iter().map(|member| member.ty).collect();
    Ok((kind, dependencies, forward))
}

fn enum_kind(vc_graph_path: &syn::Path, data: &DataEnum, span: Span) -> syn::Result<TokenStream> {
    let type_kind_ = crate::path::type_kind_(vc_graph_path);
    let enum_info_ = crate::path::enum_info_(vc_graph_path);
    let any_ = crate::path::any_();
    let option_ = crate::path::option_();

    if data.variants.is_empty() {
        return Err(syn::Error::new(span, "`Describe` needs at least one variant"));
    }

    let mut names = Vec::with_capacity(data.variants.len());
    let mut idents = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.fields.span(),
                "`Describe` only supports fieldless enum variants",
            ));
        }
        let attrs = FieldAttributes::parse(&variant.attrs)?;
        if let Some(skip) = attrs.skip {
            return Err(syn::Error::new(skip, "enum variants cannot be skipped"));
        }
        names.push(
            attrs
                .rename
                .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span())),
        );
        idents.push(&variant.ident);
    }

    let indices = 0..idents.len();
    let read_arms = idents.iter().zip(indices.clone()).map(|(ident, index)| {
        quote! { Self::#ident => #option_::Some(#index), }
    });
    let write_arms = idents.iter().zip(indices).map(|(ident, index)| {
        quote! { #index => Self::#ident, }
    });

    Ok(quote! {
        #type_kind_::Enum(#enum_info_::new(
            &[#(#names),*],
            |value: &dyn #any_| match value.downcast_ref::<Self>()? {
                #(#read_arms)*
            },
            |value: &mut dyn #any_, index: usize| {
                let #option_::Some(value) = value.downcast_mut::<Self>() else {
                    return false;
                };
                *value = match index {
                    #(#write_arms)*
                    _ => return false,
                };
                true
            },
        ))
    })
}

// -----------------------------------------------------------------------------
// TypeMeta builder

fn builder_calls(
    vc_graph_path: &syn::Path,
    attrs: &TypeAttributes,
    forward: Option<LitStr>,
    is_enum: bool,
) -> TokenStream {
    let type_ = crate::path::type_(vc_graph_path);
    let override_ = crate::path::override_(vc_graph_path);
    let default_instance_ = crate::path::default_instance_(vc_graph_path);
    let default_ = crate::path::default_();

    let mut calls = quote! {
        .with_constructor(#default_instance_::<Self>)
    };

    if let Some(name) = &attrs.name {
        calls.extend(quote! { .with_name(#name) });
    }

    // Enums are values: no other type can stand in for one.
    if let Some(span) = attrs.sealed {
        calls.extend(quote_spanned! { span => .sealed() });
    } else if is_enum {
        calls.extend(quote! { .sealed() });
    }

    for base in &attrs.extends {
        calls.extend(quote_spanned! { base.span() =>
            .with_extends(#type_::of::<#base>())
        });
    }

    if let Some(version) = &attrs.version {
        let ancestors = &attrs.ancestors;
        let count = ancestors.len();
        calls.extend(quote! {
            .with_version(#version, {
                let ancestors: [#type_; #count] = [#(#type_::of::<#ancestors>()),*];
                ancestors
            })
        });
    }

    if let Some(member) = forward {
        calls.extend(quote! { .with_override(#override_::Forward(#member)) });
    } else if let Some(converter) = &attrs.converter {
        calls.extend(quote_spanned! { converter.span() =>
            .with_override(#override_::converter(<#converter as #default_>::default()))
        });
    }

    calls
}

fn register_calls(
    vc_graph_path: &syn::Path,
    attrs: &TypeAttributes,
    dependencies: &[&syn::Type],
) -> TokenStream {
    let type_registry_ = crate::path::type_registry_(vc_graph_path);

    let types = dependencies
        .iter()
        .copied()
        .chain(&attrs.extends)
        .chain(&attrs.ancestors);

    quote! {
        #(#type_registry_::register::<#types>(registry);)*
    }
}

#[cfg(test)]
mod tests {
    use syn::{DeriveInput, parse_quote};

    use super::impl_describe;

    fn expand(input: DeriveInput) -> syn::Result<String> {
        impl_describe(&input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn struct_members_and_dependencies() {
        let out = expand(parse_quote! {
            #[graph(name = "Monster", version = "2", ancestors(MonsterV1))]
            struct Monster {
                #[graph(rename = "hp")]
                hit_points: u32,
                #[graph(skip)]
                cache: f32,
            }
        })
        .unwrap();

        assert!(out.contains("\"hp\""));
        assert!(!out.contains("cache"));
        assert!(out.contains("with_name (\"Monster\")"));
        assert!(out.contains("with_version"));
        assert!(out.contains("register :: < MonsterV1 >"));
    }

    #[test]
    fn forward_uses_member_name() {
        let out = expand(parse_quote! {
            #[graph(forward = "inner")]
            struct Wrapper {
                #[graph(rename = "value")]
                inner: u32,
            }
        })
        .unwrap();
        assert!(out.contains("Forward (\"value\")"));

        let missing = expand(parse_quote! {
            #[graph(forward = "nothing")]
            struct Wrapper {
                inner: u32,
            }
        });
        assert!(missing.is_err());
    }

    #[test]
    fn enums_are_sealed() {
        let out = expand(parse_quote! {
            enum Mood {
                Calm,
                #[graph(rename = "angry")]
                Furious,
            }
        })
        .unwrap();
        assert!(out.contains("\"Calm\" , \"angry\""));
        assert!(out.contains("sealed"));
    }

    #[test]
    fn rejected_shapes() {
        assert!(expand(parse_quote! { struct Pair(u8, u8); }).is_err());
        assert!(expand(parse_quote! { enum Empty {} }).is_err());
        assert!(expand(parse_quote! { enum Shape { Circle(f32) } }).is_err());
        assert!(expand(parse_quote! { struct Borrowed<'a> { name: &'a str } }).is_err());
    }
}
