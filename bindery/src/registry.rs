use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use parking_lot::{Condvar, Mutex};

use crate::{
    any::{Erased, TypeInfo},
    dependency::Dependency,
    instantiator::BoxedInstantiator,
    Context, ResolveErrorKind,
};

pub(crate) type BoxedAlias = Arc<dyn Fn(&mut Context<'_>) -> Result<Erased, ResolveErrorKind> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Strategy {
    Instance(Erased),
    Singleton {
        instantiator: BoxedInstantiator,
        cell: Arc<SingletonCell>,
    },
    Transient(BoxedInstantiator),
    Alias(BoxedAlias),
}

impl Strategy {
    #[inline]
    #[must_use]
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Strategy::Instance(_) => "instance",
            Strategy::Singleton { .. } => "singleton",
            Strategy::Transient(_) => "transient",
            Strategy::Alias(_) => "alias",
        }
    }
}

#[derive(Default)]
struct SingletonState {
    value: Option<Erased>,
    building: bool,
}

/// Value of a singleton binding.
///
/// The lock only guards the state, the factory runs without it.
/// Threads that find the value being built wait on `ready`.
#[derive(Default)]
pub(crate) struct SingletonCell {
    state: Mutex<SingletonState>,
    ready: Condvar,
}

pub(crate) enum Claim<'a> {
    Built(Erased),
    /// The caller builds the value and passes it to [`BuildGuard::finish`]
    Build(BuildGuard<'a>),
}

impl SingletonCell {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self) -> Option<Erased> {
        self.state.lock().value.clone()
    }

    /// Returns the value if it's built, otherwise makes the caller its builder.
    /// Waits while another thread is building it.
    ///
    /// Without `std` threads can't be told apart and `None` is returned instead of waiting,
    /// since the builder can only be the caller itself.
    pub(crate) fn claim(&self) -> Option<Claim<'_>> {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.value.as_ref() {
                return Some(Claim::Built(value.clone()));
            }
            if !state.building {
                break;
            }

            #[cfg(feature = "std")]
            self.ready.wait(&mut state);
            #[cfg(not(feature = "std"))]
            return None;
        }
        state.building = true;

        Some(Claim::Build(BuildGuard { cell: self }))
    }

    /// Cell for a forked registry: a built value is kept, an unbuilt one is built again by the fork
    #[must_use]
    pub(crate) fn fork(&self) -> Self {
        Self {
            state: Mutex::new(SingletonState {
                value: self.state.lock().value.clone(),
                building: false,
            }),
            ready: Condvar::new(),
        }
    }
}

/// Releases the claim on drop, so a failed (or panicked) build lets the next resolution try again
pub(crate) struct BuildGuard<'a> {
    cell: &'a SingletonCell,
}

impl BuildGuard<'_> {
    pub(crate) fn finish(self, value: Erased) {
        self.cell.state.lock().value = Some(value);
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.cell.state.lock().building = false;
        self.cell.ready.notify_all();
    }
}

#[derive(Clone)]
pub(crate) struct BindingData {
    pub(crate) strategy: Strategy,
    pub(crate) dependencies: Vec<Dependency>,
}

impl BindingData {
    #[must_use]
    fn fork(&self) -> Self {
        let strategy = match &self.strategy {
            Strategy::Singleton { instantiator, cell } => Strategy::Singleton {
                instantiator: instantiator.clone(),
                cell: Arc::new(cell.fork()),
            },
            strategy => strategy.clone(),
        };
        Self {
            strategy,
            dependencies: self.dependencies.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct Registry {
    bindings: BTreeMap<TypeInfo, BindingData>,
}

impl Registry {
    /// Returns the replaced binding, if any
    #[inline]
    pub(crate) fn insert(&mut self, type_info: TypeInfo, data: BindingData) -> Option<BindingData> {
        self.bindings.insert(type_info, data)
    }

    #[inline]
    pub(crate) fn remove(&mut self, type_info: &TypeInfo) -> Option<BindingData> {
        self.bindings.remove(type_info)
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, type_info: &TypeInfo) -> bool {
        self.bindings.contains_key(type_info)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, type_info: &TypeInfo) -> Option<&BindingData> {
        self.bindings.get(type_info)
    }

    #[inline]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &TypeInfo> {
        self.bindings.keys()
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Copy of the bindings that doesn't share unbuilt singletons
    #[must_use]
    pub(crate) fn fork(&self) -> Self {
        Self {
            bindings: self
                .bindings
                .iter()
                .map(|(type_info, data)| (*type_info, data.fork()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingData, Claim, Registry, SingletonCell, Strategy};
    use crate::any::{erase, unerase, TypeInfo};

    use alloc::{sync::Arc, vec::Vec};

    fn instance(value: u8) -> BindingData {
        BindingData {
            strategy: Strategy::Instance(erase(Arc::new(value))),
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = Registry::default();

        assert!(registry.insert(TypeInfo::of::<u8>(), instance(1)).is_none());
        let replaced = registry.insert(TypeInfo::of::<u8>(), instance(2)).unwrap();

        let Strategy::Instance(replaced) = replaced.strategy else {
            panic!("expected instance");
        };
        assert_eq!(*unerase::<u8>(&replaced).unwrap(), 1);
        assert_eq!(registry.len(), 1);

        let Strategy::Instance(current) = &registry.get(&TypeInfo::of::<u8>()).unwrap().strategy else {
            panic!("expected instance");
        };
        assert_eq!(*unerase::<u8>(current).unwrap(), 2);
    }

    #[test]
    fn test_remove() {
        let mut registry = Registry::default();
        registry.insert(TypeInfo::of::<u8>(), instance(1));

        assert!(registry.contains(&TypeInfo::of::<u8>()));
        assert!(registry.remove(&TypeInfo::of::<u8>()).is_some());
        assert!(!registry.contains(&TypeInfo::of::<u8>()));
        assert!(registry.remove(&TypeInfo::of::<u8>()).is_none());
    }

    #[test]
    fn test_singleton_cell_claim() {
        let cell = SingletonCell::default();

        let Some(Claim::Build(guard)) = cell.claim() else {
            panic!("expected build claim");
        };
        drop(guard);

        // A dropped claim without value leaves the cell unbuilt
        let Some(Claim::Build(guard)) = cell.claim() else {
            panic!("expected build claim");
        };
        guard.finish(erase(Arc::new(1u8)));

        let Some(Claim::Built(value)) = cell.claim() else {
            panic!("expected built value");
        };
        assert_eq!(*unerase::<u8>(&value).unwrap(), 1);
    }

    #[test]
    fn test_fork_keeps_built_values_only() {
        let built = SingletonCell::default();
        let Some(Claim::Build(guard)) = built.claim() else {
            panic!("expected build claim");
        };
        guard.finish(erase(Arc::new(1u8)));

        assert!(matches!(built.fork().claim(), Some(Claim::Built(_))));
        assert!(matches!(SingletonCell::default().fork().claim(), Some(Claim::Build(_))));
    }
}
