use alloc::{sync::Arc, vec, vec::Vec};
use core::marker::PhantomData;
use tracing::debug;

use crate::{
    any::{erase, TypeInfo},
    dependency::Dependency,
    dependency_resolver::DependencyResolver,
    instantiator::{boxed_instantiator, Instantiator},
    registry::{BindingData, SingletonCell, Strategy},
    Context,
};

/// How the container produces values of `T`.
///
/// ```rust
/// use bindery::{Binding, Container, Inject, InstantiateErrorKind};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock(u64);
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         self.0
///     }
/// }
///
/// struct Scheduler(Arc<dyn Clock>);
///
/// let container = Container::new();
/// container.set(Binding::instance(FixedClock(42)));
/// container.set(Binding::alias(|clock: Arc<FixedClock>| clock as Arc<dyn Clock>));
/// container.set(Binding::singleton(|Inject(clock): Inject<dyn Clock>| {
///     Ok::<_, InstantiateErrorKind>(Scheduler(clock))
/// }));
///
/// let scheduler = container.resolve::<Scheduler>().unwrap();
/// assert_eq!(scheduler.0.now(), 42);
/// ```
pub struct Binding<T: ?Sized> {
    pub(crate) data: BindingData,
    _provides: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Binding<T> {
    #[inline]
    #[must_use]
    fn new(strategy: Strategy, dependencies: Vec<Dependency>) -> Self {
        Self {
            data: BindingData { strategy, dependencies },
            _provides: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn into_data(self) -> BindingData {
        self.data
    }
}

impl<T: Send + Sync + 'static> Binding<T> {
    /// Value built outside the container, returned as the same `Arc` on every resolution
    #[inline]
    #[must_use]
    pub fn instance(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Factory that runs at the first resolution only; its result is reused for the lifetime of the binding.
    /// Concurrent first resolutions run the factory once.
    #[inline]
    #[must_use]
    pub fn singleton<Inst, Deps>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T>,
        Deps: DependencyResolver + 'static,
    {
        Self::new(
            Strategy::Singleton {
                instantiator: boxed_instantiator(instantiator),
                cell: Arc::new(SingletonCell::default()),
            },
            Inst::dependencies(),
        )
    }

    /// Factory that runs on every resolution
    #[inline]
    #[must_use]
    pub fn transient<Inst, Deps>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T>,
        Deps: DependencyResolver + 'static,
    {
        Self::new(Strategy::Transient(boxed_instantiator(instantiator)), Inst::dependencies())
    }
}

impl<T: ?Sized + Send + Sync + 'static> Binding<T> {
    /// Like [`Binding::instance`], for values already behind an `Arc`, including trait objects
    #[inline]
    #[must_use]
    pub fn shared(value: Arc<T>) -> Self {
        Self::new(Strategy::Instance(erase(value)), Vec::new())
    }

    /// Resolves `C` instead and converts it.
    /// This is how an abstract type (usually a trait object) is mapped to its implementation:
    /// `Binding::<dyn Repo>::alias(|repo: Arc<PostgresRepo>| repo as Arc<dyn Repo>)`.
    ///
    /// `C` is resolved through its own binding, so a singleton `C` gives a singleton `T`.
    #[inline]
    #[must_use]
    pub fn alias<C, F>(convert: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let target = TypeInfo::of::<C>();
        Self::new(
            Strategy::Alias(Arc::new(move |context: &mut Context<'_>| {
                debug!(target = target.name, "Resolving alias target");
                let concrete = context.resolve::<C>()?;
                Ok(erase(convert(concrete)))
            })),
            vec![Dependency::required(target)],
        )
    }
}
