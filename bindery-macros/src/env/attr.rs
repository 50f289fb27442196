use syn::{
    parse::{Parse, ParseStream},
    Attribute, LitStr, Token,
};

use crate::attr_parsing::{combine_attribute, parse_assignment_attribute, parse_attrs, Combine};

pub(crate) mod kw {
    syn::custom_keyword!(prefix);
    syn::custom_keyword!(rename);
}

/// `#[env(prefix = "APPNAME")]` on the struct
#[derive(Default)]
pub(crate) struct ContainerArgs {
    pub(super) prefix: Option<(kw::prefix, LitStr)>,
}

impl Parse for ContainerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut prefix = None;

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::prefix) {
                parse_assignment_attribute(input, &mut prefix)?;
            } else {
                return Err(lh.error());
            }

            let _ = input.parse::<Token![,]>();
        }

        Ok(Self { prefix })
    }
}

impl Combine for ContainerArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        let Self { prefix } = other;
        combine_attribute(&mut self.prefix, prefix)?;
        Ok(self)
    }
}

/// `#[env(rename = "name")]` on a field
#[derive(Default)]
pub(crate) struct FieldArgs {
    pub(super) rename: Option<(kw::rename, LitStr)>,
}

impl Parse for FieldArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut rename = None;

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::rename) {
                parse_assignment_attribute(input, &mut rename)?;
            } else {
                return Err(lh.error());
            }

            let _ = input.parse::<Token![,]>();
        }

        Ok(Self { rename })
    }
}

impl Combine for FieldArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        let Self { rename } = other;
        combine_attribute(&mut self.rename, rename)?;
        Ok(self)
    }
}

pub(crate) fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerArgs> {
    parse_attrs("env", attrs).unwrap_or_else(|| Ok(ContainerArgs::default()))
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldArgs> {
    parse_attrs("env", attrs).unwrap_or_else(|| Ok(FieldArgs::default()))
}
