use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use std::env::var_os;
use syn::parse::Parse;

mod attr_parsing;
mod env;
mod injectable;

/// Registers the `#[constructor]` method of an inherent `impl` block as the type's constructor,
/// used by containers when the type has no explicit binding.
///
/// The method's parameters are resolved from the container. It returns `Self` or `Result<Self, E>`
/// with `E: Into<bindery::InstantiateErrorKind>`.
///
/// ```rust,ignore
/// #[injectable]
/// impl UserService {
///     #[constructor]
///     fn new(Inject(repo): Inject<dyn UserRepo>) -> Self {
///         Self { repo }
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn injectable(_attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_with(item, injectable::expand)
}

/// Implements `bindery::env::Env`, reading every field from an environment variable,
/// and registers the type to be constructed from the process environment.
///
/// Attributes: `#[env(prefix = "APPNAME")]` on the struct, `#[env(rename = "name")]` on fields.
/// `Option<T>` fields are optional, others are required.
#[proc_macro_derive(Env, attributes(env))]
pub fn derive_env(item: TokenStream) -> TokenStream {
    expand_with(item, env::expand)
}

fn expand_with<F, I, K>(input: TokenStream, f: F) -> TokenStream
where
    F: FnOnce(I) -> syn::Result<K>,
    I: Parse,
    K: ToTokens,
{
    expand(syn::parse(input).and_then(f))
}

fn expand<T>(result: syn::Result<T>) -> TokenStream
where
    T: ToTokens,
{
    match result {
        Ok(tokens) => {
            let tokens = quote! { #tokens };
            if var_os("MACROS_DEBUG").is_some() {
                match syn::parse2::<syn::File>(tokens.clone()) {
                    Ok(file) => eprintln!("{}", prettyplease::unparse(&file)),
                    Err(_) => eprintln!("{tokens}"),
                }
            }
            tokens.into()
        }
        Err(err) => err.into_compile_error().into(),
    }
}
