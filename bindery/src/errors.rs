mod container;
mod dependency_resolver;
mod env;
mod instantiator;

pub use container::DefineErrorKind;
pub use dependency_resolver::ResolveErrorKind;
pub use env::EnvErrorKind;
pub use instantiator::InstantiateErrorKind;
