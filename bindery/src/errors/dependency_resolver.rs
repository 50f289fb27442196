use alloc::{boxed::Box, string::String};
use core::{any::TypeId, fmt::Write as _};

use super::instantiator::InstantiateErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No binding for `{}` and no constructor registered for it", type_info.name)]
    NoBinding { type_info: TypeInfo },
    #[error("Failed to resolve a dependency of `{}`: {source}", type_info.name)]
    Dependency {
        type_info: TypeInfo,
        source: Box<ResolveErrorKind>,
    },
    #[error("Cyclic dependency detected: {}", format_path(path))]
    CyclicDependency { path: Box<[TypeInfo]> },
    /// The value stored for `expected` is of another type.
    /// [`crate::Binding`] ties every value to its key, so this is reported only if that invariant is broken.
    #[error("Incorrect binding provides type. Actual: {actual:?}, expected: `{}`", expected.name)]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error("Failed to construct `{}`: {source}", type_info.name)]
    Instantiate {
        type_info: TypeInfo,
        source: InstantiateErrorKind,
    },
    #[error("Parameter of type `{}` must be supplied by the caller", type_info.name)]
    NotSupplied { type_info: TypeInfo },
}

impl ResolveErrorKind {
    /// Innermost cause, skipping [`ResolveErrorKind::Dependency`] wrappers
    #[must_use]
    pub fn root(&self) -> &ResolveErrorKind {
        let mut err = self;
        while let ResolveErrorKind::Dependency { source, .. } = err {
            err = source;
        }
        err
    }

    /// Whether resolution failed only because some type along the path can't be resolved at all
    #[inline]
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        matches!(self.root(), ResolveErrorKind::NoBinding { .. })
    }
}

fn format_path(path: &[TypeInfo]) -> String {
    let mut out = String::new();
    for (index, type_info) in path.iter().enumerate() {
        if index > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{}", type_info.name);
    }
    out
}
