//! Constructors registered at compile time by `#[injectable]` and `#[derive(Env)]`.
//!
//! Every [`Container`](crate::Container) collects them when created and uses them
//! for types that have no explicit binding.

use alloc::{collections::BTreeMap, vec::Vec};

use crate::{any::TypeInfo, dependency::Dependency, instantiator::BoxedInstantiator};

pub use linkme::{self, distributed_slice};

#[distributed_slice]
pub static __CONSTRUCTORS: [fn() -> (TypeInfo, Constructor)];

/// Type-erased constructor of an auto-constructible type
#[derive(Clone)]
pub struct Constructor {
    pub(crate) instantiator: BoxedInstantiator,
    pub(crate) dependencies: Vec<Dependency>,
}

impl Constructor {
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}

pub(crate) fn collect() -> BTreeMap<TypeInfo, Constructor> {
    __CONSTRUCTORS.iter().map(|getter| getter()).collect()
}
