use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens as _};
use syn::{spanned::Spanned as _, Error, FnArg, Ident, ImplItem, ImplItemFn, Item, ItemImpl, ReturnType, Type};

const CONSTRUCTOR_ATTR: &str = "constructor";

fn expand_constructor(impl_item_fn: &ImplItemFn, self_ty: &Type) -> syn::Result<TokenStream> {
    let fn_name = &impl_item_fn.sig.ident;
    let impl_span = impl_item_fn.span();

    if let Some(asyncness) = &impl_item_fn.sig.asyncness {
        return Err(Error::new_spanned(asyncness, "async constructors are not supported"));
    }
    if !impl_item_fn.sig.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &impl_item_fn.sig.generics,
            "generic constructors are not supported",
        ));
    }

    let returns_result = match &impl_item_fn.sig.output {
        ReturnType::Default => {
            return Err(Error::new_spanned(
                &impl_item_fn.sig,
                "constructor must return `Self` or `Result<Self, E>`",
            ))
        }
        ReturnType::Type(_, ty) => is_result(ty),
    };

    let types_with_spans = impl_item_fn
        .sig
        .inputs
        .iter()
        .map(|input| match input {
            FnArg::Typed(pat_type) => Ok((pat_type.ty.as_ref(), pat_type.ty.span())),
            FnArg::Receiver(_) => Err(Error::new_spanned(input, "constructors with `self` are not supported")),
        })
        .collect::<syn::Result<Box<[_]>>>()?;

    let idents = (0..types_with_spans.len())
        .map(|i| Ident::new(&format!("arg{i}"), Span::call_site()))
        .collect::<Box<[_]>>();
    let quoted_types = types_with_spans.iter().map(|(ty, span)| quote_spanned! { *span => #ty });
    let deps_ty = quote! { ( #( #quoted_types, )* ) };
    let deps_pat = quote! { ( #( #idents, )* ) };

    let call = quote_spanned! { impl_span => <#self_ty>::#fn_name( #( #idents ),* ) };
    let body = if returns_result {
        quote! { #call.map_err(::core::convert::Into::into) }
    } else {
        quote! { ::core::result::Result::Ok(#call) }
    };

    let (struct_name, static_name) = generate_identifiers(self_ty);

    Ok(quote_spanned! { impl_span =>
        #[doc(hidden)]
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy)]
        struct #struct_name;

        impl ::bindery::Instantiator<#deps_ty> for #struct_name {
            type Provides = #self_ty;
            type Error = ::bindery::InstantiateErrorKind;

            #[inline]
            fn instantiate(&mut self, #deps_pat: #deps_ty) -> ::core::result::Result<Self::Provides, Self::Error> {
                #body
            }
        }

        #[doc(hidden)]
        #[::bindery::autowired::distributed_slice(::bindery::autowired::__CONSTRUCTORS)]
        #[linkme(crate = ::bindery::autowired::linkme)]
        static #static_name: fn() -> (::bindery::TypeInfo, ::bindery::autowired::Constructor) =
            || ::bindery::macros_utils::make_constructor(#struct_name);
    })
}

/// `Result<..>`, `std::result::Result<..>`, `anyhow::Result<..>` and the like
fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        Type::Paren(paren) => is_result(&paren.elem),
        Type::Group(group) => is_result(&group.elem),
        _ => false,
    }
}

fn generate_identifiers(self_ty: &Type) -> (Ident, Ident) {
    let sanitized = self_ty
        .into_token_stream()
        .to_string()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>();

    (
        format_ident!("__BinderyConstructor{}", sanitized),
        format_ident!("__BINDERY_CONSTRUCTOR_{}", sanitized.to_uppercase()),
    )
}

pub(crate) fn expand(mut item: Item) -> syn::Result<TokenStream> {
    match item {
        Item::Impl(ItemImpl { trait_: Some(_), .. }) => Err(Error::new_spanned(
            item,
            "#[injectable] can't be used on trait implementations",
        )),
        Item::Impl(ItemImpl { ref generics, .. }) if !generics.params.is_empty() => Err(Error::new_spanned(
            generics,
            "#[injectable] can't be used on generic types",
        )),
        Item::Impl(ItemImpl {
            trait_: None,
            ref mut items,
            ref self_ty,
            ..
        }) => {
            let mut constructors = items
                .iter_mut()
                .filter_map(|item| {
                    if let ImplItem::Fn(impl_item_fn) = item {
                        Some(impl_item_fn)
                    } else {
                        None
                    }
                })
                .filter(|impl_item_fn| impl_item_fn.attrs.iter().any(|attr| attr.path().is_ident(CONSTRUCTOR_ATTR)))
                .collect::<Box<[_]>>();

            let impl_item_fn = match &mut *constructors {
                [impl_item_fn] => impl_item_fn,
                [] => {
                    return Err(Error::new_spanned(
                        &**self_ty,
                        "#[injectable] requires a method marked with #[constructor]",
                    ))
                }
                [_, second, ..] => {
                    return Err(Error::new_spanned(
                        &**second,
                        "#[constructor] can only be used once per type",
                    ))
                }
            };

            if let Some(attr) = impl_item_fn.attrs.iter().find(|attr| attr.path().is_ident(CONSTRUCTOR_ATTR)) {
                if attr.meta.require_path_only().is_err() {
                    return Err(Error::new_spanned(attr, "#[constructor] takes no arguments"));
                }
            }

            // Remove `constructor` attribute from final code
            impl_item_fn.attrs.retain(|attr| !attr.path().is_ident(CONSTRUCTOR_ATTR));

            let tokens = expand_constructor(impl_item_fn, self_ty)?;

            Ok(quote! {
                #item
                #tokens
            })
        }
        _ => Err(Error::new_spanned(item, "#[injectable] can only be used on `impl` blocks")),
    }
}
