#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

// Lets code generated by `bindery-macros` refer to `::bindery` from inside this crate
extern crate self as bindery;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod binding;
pub(crate) mod bound;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod dependency;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod registry;
pub(crate) mod scope;

pub mod autowired;
pub mod macros_utils;

#[cfg(feature = "std")]
pub mod env;

pub use any::TypeInfo;
pub use binding::Binding;
pub use bound::{Bound, Handler, Parameters};
pub use container::Container;
pub use context::Context;
pub use dependency::Dependency;
pub use dependency_resolver::DependencyResolver;
pub use errors::{DefineErrorKind, EnvErrorKind, InstantiateErrorKind, ResolveErrorKind};
pub use inject::{Inject, Supplied};
pub use instantiator::Instantiator;

#[cfg(feature = "macros")]
pub use bindery_macros::{injectable, Env};
