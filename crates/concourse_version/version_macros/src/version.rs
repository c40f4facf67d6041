//! Derive macros for `Version` and `TypedVersion`.

use darling::ast::Data;
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DeriveInput, parse_macro_input};

/// Which trait is being derived.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Default codecs, no schema.
    Plain,
    /// Registry codecs and a schema.
    Typed,
}

/// Parsed attributes for the macro.
#[derive(FromDeriveInput)]
#[darling(attributes(version), supports(struct_named))]
struct VersionArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), VersionField>,

    /// Function returning the codec registry. Typed versions only.
    #[darling(default)]
    codecs: Option<syn::Path>,
}

#[derive(FromField)]
struct VersionField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
}

/// A field resolved to its flat key.
struct Field<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
    private: bool,
}

/// Implementation of `#[derive(Version)]` and `#[derive(TypedVersion)]`.
pub(crate) fn derive_version(input: TokenStream, mode: Mode) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match VersionArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    match expand(&args, mode) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(args: &VersionArgs, mode: Mode) -> darling::Result<TokenStream2> {
    if mode == Mode::Plain
        && let Some(codecs) = &args.codecs
    {
        return Err(darling::Error::custom(
            "`codecs` only applies to #[derive(TypedVersion)]",
        )
        .with_span(codecs));
    }

    let fields: Vec<Field<'_>> = match &args.data {
        Data::Struct(fields) => fields
            .fields
            .iter()
            .filter_map(|field| {
                let ident = field.ident.as_ref()?;
                let name = ident.unraw().to_string();
                Some(Field {
                    ident,
                    ty: &field.ty,
                    private: name.starts_with('_'),
                    name,
                })
            })
            .collect(),
        Data::Enum(_) => return Err(darling::Error::unsupported_shape("enum")),
    };

    if fields.iter().all(|field| field.private) {
        return Err(darling::Error::custom(
            "a version needs at least one public field to carry its identity",
        )
        .with_span(&args.ident));
    }

    let krate = concourse_macro_utils::version_crate_path();

    let name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    let public: Vec<&Field<'_>> = fields.iter().filter(|field| !field.private).collect();
    let private_idents = fields
        .iter()
        .filter(|field| field.private)
        .map(|field| field.ident);
    let public_idents: Vec<_> = public.iter().map(|field| field.ident).collect();
    let public_names: Vec<_> = public.iter().map(|field| field.name.as_str()).collect();
    let public_types: Vec<_> = public.iter().map(|field| field.ty).collect();

    let (flatten, unflatten, setup, typed_impl) = match mode {
        Mode::Plain => (
            public_idents
                .iter()
                .map(|ident| quote!(#krate::Flat::flatten_default(&self.#ident)))
                .collect::<Vec<_>>(),
            public_types
                .iter()
                .zip(&public_names)
                .map(|(ty, key)| {
                    quote!(#krate::typed::take_default_field::<Self, #ty>(config, #key)?)
                })
                .collect::<Vec<_>>(),
            TokenStream2::new(),
            TokenStream2::new(),
        ),
        Mode::Typed => {
            let schema_fields = fields.iter().map(|field| {
                let key = &field.name;
                let ty = field.ty;
                let private = field.private;
                quote! {
                    #krate::FieldSchema {
                        name: #key,
                        type_key: #krate::TypeKey::of::<#ty>(),
                        private: #private,
                    }
                }
            });
            let codecs_fn = args.codecs.as_ref().map(|path| {
                quote! {
                    fn codecs() -> &'static #krate::CodecRegistry {
                        #path()
                    }
                }
            });
            let typed_impl = quote! {
                impl #impl_generics #krate::TypedVersion for #name #ty_generics #where_clause {
                    fn schema() -> #krate::VersionSchema {
                        #krate::VersionSchema {
                            type_name: ::core::any::type_name::<Self>(),
                            fields: ::std::vec![#(#schema_fields),*],
                        }
                    }

                    #codecs_fn
                }
            };
            (
                public_idents
                    .iter()
                    .map(|ident| quote!(codecs.flatten(&self.#ident)))
                    .collect(),
                public_types
                    .iter()
                    .zip(&public_names)
                    .map(|(ty, key)| {
                        quote!(#krate::typed::take_field::<Self, #ty>(codecs, config, #key)?)
                    })
                    .collect(),
                quote!(let codecs = <Self as #krate::TypedVersion>::codecs();),
                typed_impl,
            )
        }
    };

    let expanded = quote! {
        #typed_impl

        impl #impl_generics #krate::Version for #name #ty_generics #where_clause {
            fn to_flat_dict(&self) -> #krate::VersionConfig {
                #setup
                let mut config = #krate::VersionConfig::new();
                #(
                    config.insert(::std::string::String::from(#public_names), #flatten);
                )*
                config
            }

            fn from_flat_dict(
                config: &#krate::VersionConfig,
            ) -> ::core::result::Result<Self, #krate::FlatError> {
                #krate::typed::reject_unexpected::<Self>(config, &[#(#public_names),*])?;
                #setup
                ::core::result::Result::Ok(Self {
                    #( #public_idents: #unflatten, )*
                    #( #private_idents: ::core::default::Default::default(), )*
                })
            }
        }

        impl #impl_generics ::core::cmp::PartialEq for #name #ty_generics #where_clause {
            fn eq(&self, other: &Self) -> bool {
                #krate::flat_eq(self, other)
            }
        }

        impl #impl_generics ::core::cmp::Eq for #name #ty_generics #where_clause {}

        impl #impl_generics ::core::hash::Hash for #name #ty_generics #where_clause {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                #krate::flat_hash(self, state);
            }
        }
    };

    Ok(expanded)
}
