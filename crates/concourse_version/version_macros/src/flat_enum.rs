//! Derive macro for `Flat` on fieldless enums.

use darling::ast::Data;
use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Parsed attributes for the macro.
#[derive(FromDeriveInput)]
#[darling(attributes(flat), supports(enum_unit))]
struct FlatEnumArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<FlatVariant, ()>,
}

#[derive(FromVariant)]
#[darling(attributes(flat))]
struct FlatVariant {
    ident: syn::Ident,

    /// Member name, if different from the variant name.
    #[darling(default)]
    rename: Option<String>,
}

/// Implementation of the `#[derive(FlatEnum)]` macro.
pub(crate) fn derive_flat_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match FlatEnumArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    let variants = match &args.data {
        Data::Enum(variants) if !variants.is_empty() => variants,
        _ => {
            return darling::Error::custom("FlatEnum needs at least one variant")
                .with_span(&args.ident)
                .write_errors()
                .into();
        }
    };

    let krate = concourse_macro_utils::version_crate_path();

    let name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    let idents: Vec<_> = variants.iter().map(|variant| &variant.ident).collect();
    let members: Vec<String> = variants
        .iter()
        .map(|variant| {
            variant
                .rename
                .clone()
                .unwrap_or_else(|| variant.ident.to_string())
        })
        .collect();

    let expanded = quote! {
        impl #impl_generics #krate::Flat for #name #ty_generics #where_clause {
            fn ancestors() -> ::std::vec::Vec<#krate::TypeKey> {
                ::std::vec![#krate::TypeKey::enumeration()]
            }

            fn flatten_default(&self) -> ::std::string::String {
                let member = match self {
                    #( Self::#idents => #members, )*
                };
                ::std::string::String::from(member)
            }

            fn unflatten_default(
                flat: &str,
            ) -> ::core::result::Result<Self, #krate::FlatError> {
                Self::from_member_name(flat).ok_or_else(|| #krate::FlatError::UnknownMember {
                    type_name: ::core::any::type_name::<Self>(),
                    name: ::std::string::String::from(flat),
                })
            }

            fn member_name(&self) -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(match self {
                    #( Self::#idents => #members, )*
                })
            }

            fn from_member_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #( #members => ::core::option::Option::Some(Self::#idents), )*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    expanded.into()
}
