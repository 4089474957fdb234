//! Derive macros for the upsertlite crate.
//!
//! `Encode`, `Decode` and `Codec` support two shapes:
//!
//! * Newtype structs, which convert exactly like their inner type.
//! * Fieldless enums, stored as TEXT by variant name (see `rename_all` and `rename`), or as
//!   integers with `#[upsertlite(repr = "i32")]`.

/// Shared attribute parsing.
mod core;
/// Derive support for reading types from columns.
mod decode;
/// Derive support for binding types to parameters.
mod encode;

/// Build combined encode/decode tokens for the `Codec` derive.
fn derive_codec_tokens(input: &syn::DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let encode_tts = encode::expand_derive_encode(input)?;
    let decode_tts = decode::expand_derive_decode(input)?;
    Ok(proc_macro2::TokenStream::from_iter(
        encode_tts.into_iter().chain(decode_tts),
    ))
}

#[proc_macro_derive(Codec, attributes(upsertlite))]
/// Derive combined `Encode` and `Decode` implementations.
pub fn derive_codec(tokenstream: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(tokenstream as syn::DeriveInput);
    match derive_codec_tokens(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(Encode, attributes(upsertlite))]
/// Derive an `Encode` implementation.
pub fn derive_encode(tokenstream: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(tokenstream as syn::DeriveInput);
    match encode::expand_derive_encode(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(Decode, attributes(upsertlite))]
/// Derive a `Decode` implementation.
pub fn derive_decode(tokenstream: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(tokenstream as syn::DeriveInput);
    match decode::expand_derive_decode(&input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[cfg(test)]
mod tests;
