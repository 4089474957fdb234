use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Generics, Lifetime, LifetimeParam, Type, parse_quote};

use super::core;

pub fn expand_derive_decode(input: &DeriveInput) -> syn::Result<TokenStream> {
    core::expand_type_derive(input, &expand_struct, &expand_repr_enum, &expand_enum)
}

/// The container's generics with the decode lifetime `'r` prepended.
fn with_decode_lifetime(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let lifetime = LifetimeParam::new(Lifetime::new("'r", proc_macro2::Span::call_site()));
    generics.params.insert(0, lifetime.into());
    generics
}

fn expand_enum(
    container: &core::TypeContainer,
    variants: &[core::TypeVariant],
) -> syn::Result<TokenStream> {
    let ident = &container.ident;
    let type_name = ident.to_string();
    let (_, ty_generics, _) = container.generics.split_for_impl();
    let generics = with_decode_lifetime(&container.generics);
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    let arms = variants.iter().map(|v| {
        let id = &v.ident;
        let name = core::variant_name(container, v);
        quote!(#name => ::std::result::Result::Ok(#ident :: #id),)
    });

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::decode::Decode<'r> for #ident #ty_generics #where_clause {
            fn decode(
                value: upsertlite::StorageValue<'r>,
            ) -> ::std::result::Result<Self, upsertlite::ConversionError> {
                let text = <::std::borrow::Cow<'r, ::std::primitive::str> as upsertlite::decode::Decode<'r>>::decode(value)?;
                match text.as_ref() {
                    #(#arms)*
                    other => ::std::result::Result::Err(upsertlite::ConversionError::Custom(
                        ::std::format!("invalid value {:?} for enum {}", other, #type_name),
                    )),
                }
            }
        }
    ))
}

fn expand_repr_enum(
    container: &core::TypeContainer,
    variants: &[core::TypeVariant],
    repr: &Type,
) -> syn::Result<TokenStream> {
    let ident = &container.ident;
    let type_name = ident.to_string();
    let (_, ty_generics, _) = container.generics.split_for_impl();
    let mut generics = with_decode_lifetime(&container.generics);
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#repr: upsertlite::decode::Decode<'r>));
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    let checks = variants.iter().map(|v| {
        let id = &v.ident;
        quote!(
            if value == (#ident :: #id as #repr) {
                return ::std::result::Result::Ok(#ident :: #id);
            }
        )
    });

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::decode::Decode<'r> for #ident #ty_generics #where_clause {
            fn decode(
                value: upsertlite::StorageValue<'r>,
            ) -> ::std::result::Result<Self, upsertlite::ConversionError> {
                let value = <#repr as upsertlite::decode::Decode<'r>>::decode(value)?;
                #(#checks)*
                ::std::result::Result::Err(upsertlite::ConversionError::Custom(
                    ::std::format!("invalid value {:?} for enum {}", value, #type_name),
                ))
            }
        }
    ))
}

fn expand_struct(
    container: &core::TypeContainer,
    field: &core::TypeField,
) -> syn::Result<TokenStream> {
    let ident = &container.ident;
    let ty = &field.ty;

    let (_, ty_generics, _) = container.generics.split_for_impl();
    let mut generics = with_decode_lifetime(&container.generics);
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#ty: upsertlite::decode::Decode<'r>));
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::decode::Decode<'r> for #ident #ty_generics
        #where_clause
        {
            fn decode(
                value: upsertlite::StorageValue<'r>,
            ) -> ::std::result::Result<Self, upsertlite::ConversionError> {
                <#ty as upsertlite::decode::Decode<'r>>::decode(value).map(Self)
            }
        }
    ))
}
