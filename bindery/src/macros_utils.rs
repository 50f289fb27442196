//! Support for code generated by `bindery-macros`. Not a public API.

use crate::{
    any::TypeInfo,
    autowired::Constructor,
    dependency_resolver::DependencyResolver,
    instantiator::{boxed_instantiator, Instantiator},
};

#[inline]
#[must_use]
#[doc(hidden)]
pub fn make_constructor<Inst, Deps>(instantiator: Inst) -> (TypeInfo, Constructor)
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver + 'static,
{
    (
        TypeInfo::of::<Inst::Provides>(),
        Constructor {
            dependencies: Inst::dependencies(),
            instantiator: boxed_instantiator(instantiator),
        },
    )
}

#[cfg(feature = "std")]
#[inline]
#[must_use]
#[doc(hidden)]
pub fn make_env_constructor<T: crate::env::Env>() -> (TypeInfo, Constructor) {
    make_constructor(|| T::load())
}
