use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type, parse_quote};

use super::core;

pub fn expand_derive_encode(input: &DeriveInput) -> syn::Result<TokenStream> {
    core::expand_type_derive(input, &expand_struct, &expand_repr_enum, &expand_enum)
}

fn expand_enum(
    container: &core::TypeContainer,
    variants: &[core::TypeVariant],
) -> syn::Result<TokenStream> {
    let ident = &container.ident;
    let (impl_generics, ty_generics, where_clause) = container.generics.split_for_impl();

    let value_arms = variants.iter().map(|v| {
        let id = &v.ident;
        let name = core::variant_name(container, v);
        quote!(#ident :: #id => #name,)
    });

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::encode::Encode for #ident #ty_generics #where_clause {
            fn encode(
                &self,
            ) -> ::std::result::Result<upsertlite::StorageValue<'_>, upsertlite::ConversionError> {
                let name: &'static ::std::primitive::str = match self {
                    #(#value_arms)*
                };
                ::std::result::Result::Ok(upsertlite::StorageValue::from(name))
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
    let mut generics = container.generics.clone();
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#repr: upsertlite::encode::Encode));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let values = variants.iter().map(|v| {
        let id = &v.ident;
        quote!(#ident :: #id => (#ident :: #id as #repr),)
    });

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::encode::Encode for #ident #ty_generics #where_clause {
            fn encode(
                &self,
            ) -> ::std::result::Result<upsertlite::StorageValue<'_>, upsertlite::ConversionError> {
                let value: #repr = match self {
                    #(#values)*
                };
                <#repr as upsertlite::encode::Encode>::encode(&value)
                    .map(upsertlite::StorageValue::into_owned)
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
    let mut generics = container.generics.clone();
    generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(#ty: upsertlite::encode::Encode));
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    Ok(quote!(
        #[automatically_derived]
        impl #impl_generics upsertlite::encode::Encode for #ident #ty_generics
        #where_clause
        {
            fn encode(
                &self,
            ) -> ::std::result::Result<upsertlite::StorageValue<'_>, upsertlite::ConversionError> {
                <#ty as upsertlite::encode::Encode>::encode(&self.0)
            }
        }
    ))
}
