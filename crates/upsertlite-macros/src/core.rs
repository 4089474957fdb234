use darling::{self, FromDeriveInput, FromField, FromMeta, ast, util};
use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use proc_macro2::TokenStream;
use syn::{DeriveInput, Type};

/// Create a `syn::Error` from a spanned token.
macro_rules! span_err {
    ($t:expr, $err:expr) => {
        Err(syn::Error::new_spanned($t, $err))
    };
}

#[allow(unused)]
/// Assert that a `syn::Result` error contains the expected message.
macro_rules! assert_errors_with {
    ($e:expr, $m:expr) => {
        assert!(&$e.is_err());
        let e = $e.unwrap_err();
        assert!(
            format!("{}", e).contains($m),
            "expected error containing \"{}\" got \"{}\"",
            $m,
            e
        );
    };
}

/// Re-exported for use in tests.
#[allow(unused)]
pub(crate) use assert_errors_with;

/// Case conversion rules for rename attributes.
#[derive(Default, Debug, Copy, Clone, FromMeta)]
pub enum RenameAll {
    #[default]
    SnakeCase,
    LowerCase,
    UpperCase,
    ScreamingSnakeCase,
    KebabCase,
    /// lowerCamelCase.
    CamelCase,
    /// UpperCamelCase.
    PascalCase,
    /// Keep the variant name as written.
    Verbatim,
}

impl RenameAll {
    pub(crate) fn rename(self, s: &str) -> String {
        match self {
            Self::LowerCase => s.to_lowercase(),
            Self::SnakeCase => s.to_snake_case(),
            Self::UpperCase => s.to_uppercase(),
            Self::ScreamingSnakeCase => s.to_shouty_snake_case(),
            Self::KebabCase => s.to_kebab_case(),
            Self::CamelCase => s.to_lower_camel_case(),
            Self::PascalCase => s.to_upper_camel_case(),
            Self::Verbatim => s.to_owned(),
        }
    }
}

/// Container attributes for the codec derives.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(upsertlite))]
pub struct TypeContainer {
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    pub data: ast::Data<TypeVariant, TypeField>,

    /// Rename rule applied to variant names of TEXT enums.
    #[darling(default = "Default::default")]
    pub rename_all: RenameAll,
    /// Integer type for enums stored by discriminant.
    pub repr: Option<Type>,
}

#[derive(darling::FromVariant, Debug)]
#[darling(attributes(upsertlite))]
pub struct TypeVariant {
    pub ident: syn::Ident,
    pub fields: ast::Fields<util::Ignored>,

    /// Stored name, overriding `rename_all`.
    pub rename: Option<String>,
}

/// The stored name of an enum variant after applying any `rename` attribute or the container's
/// `rename_all` rule.
pub fn variant_name(container: &TypeContainer, variant: &TypeVariant) -> String {
    variant
        .rename
        .clone()
        .unwrap_or_else(|| container.rename_all.rename(&variant.ident.to_string()))
}

#[derive(Debug, FromField)]
#[darling(attributes(upsertlite))]
pub struct TypeField {
    pub ident: Option<syn::Ident>,
    pub ty: Type,
}

fn check_fieldless(variants: &[TypeVariant]) -> syn::Result<()> {
    for v in variants {
        if !v.fields.is_empty() {
            return span_err!(&v.ident, "only enums with fieldless variants are supported");
        }
    }
    Ok(())
}

/// Signature for repr enum expansion callbacks.
type ExpandReprEnumFn = dyn Fn(&TypeContainer, &[TypeVariant], &Type) -> syn::Result<TokenStream>;

/// Check the shape of the input and hand it to the matching expansion.
pub fn expand_type_derive(
    input: &DeriveInput,
    expand_struct: &dyn Fn(&TypeContainer, &TypeField) -> syn::Result<TokenStream>,
    expand_repr_enum: &ExpandReprEnumFn,
    expand_enum: &dyn Fn(&TypeContainer, &[TypeVariant]) -> syn::Result<TokenStream>,
) -> syn::Result<TokenStream> {
    let attrs = TypeContainer::from_derive_input(input)?;
    match &attrs.data {
        ast::Data::Struct(fields) => {
            if fields.is_empty() {
                return span_err!(input, "structs with zero fields are not supported");
            }
            let mut unnamed = fields.iter().filter(|f| f.ident.is_none());
            match (unnamed.next(), unnamed.next(), fields.len()) {
                (Some(field), None, 1) => expand_struct(&attrs, field),
                _ => span_err!(input, "structs must have exactly one unnamed field"),
            }
        }
        ast::Data::Enum(variants) => {
            if variants.is_empty() {
                return span_err!(input, "enums with no variants are not supported");
            }
            check_fieldless(variants)?;
            match &attrs.repr {
                Some(repr) => expand_repr_enum(&attrs, variants, repr),
                None => expand_enum(&attrs, variants),
            }
        }
    }
}
