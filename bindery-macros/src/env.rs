mod attr;

use crate::env::attr::{parse_container_attrs, parse_field_attrs};

use proc_macro2::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{spanned::Spanned as _, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Type};

/// `T` for `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(&input.generics, "#[derive(Env)] doesn't support generic types"));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(Error::new_spanned(ident, "#[derive(Env)] requires a struct with named fields")),
        },
        _ => return Err(Error::new_spanned(ident, "#[derive(Env)] can only be used on structs")),
    };

    let container_args = parse_container_attrs(&input.attrs)?;
    let prefix = match &container_args.prefix {
        Some((_, prefix)) => quote! { ::core::option::Option::Some(#prefix) },
        None => quote! { ::core::option::Option::None },
    };

    let field_values = fields
        .iter()
        .map(|field| {
            let field_ident = field
                .ident
                .as_ref()
                .ok_or_else(|| Error::new_spanned(field, "field must be named"))?;
            let field_args = parse_field_attrs(&field.attrs)?;

            let name = match field_args.rename {
                Some((_, rename)) => rename.value(),
                None => field_ident.to_string(),
            };

            let ty = &field.ty;
            Ok(match option_inner(ty) {
                Some(inner) => quote_spanned! { ty.span() =>
                    #field_ident: vars.optional::<#inner>(#name)?
                },
                None => quote_spanned! { ty.span() =>
                    #field_ident: vars.required::<#ty>(#name)?
                },
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let static_name = format_ident!("__BINDERY_ENV_{}", ident.to_string().to_uppercase());

    Ok(quote! {
        impl ::bindery::env::Env for #ident {
            const PREFIX: ::core::option::Option<&'static str> = #prefix;

            fn from_env(vars: &::bindery::env::EnvVars<'_>) -> ::core::result::Result<Self, ::bindery::EnvErrorKind> {
                ::core::result::Result::Ok(Self {
                    #( #field_values, )*
                })
            }
        }

        #[doc(hidden)]
        #[::bindery::autowired::distributed_slice(::bindery::autowired::__CONSTRUCTORS)]
        #[linkme(crate = ::bindery::autowired::linkme)]
        static #static_name: fn() -> (::bindery::TypeInfo, ::bindery::autowired::Constructor) =
            ::bindery::macros_utils::make_env_constructor::<#ident>;
    })
}
