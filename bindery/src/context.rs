use alloc::{sync::Arc, vec::Vec};
use tracing::{debug, debug_span, error};

use crate::{
    any::{unerase, Erased, TypeInfo},
    cache::Cache,
    registry::{Claim, Strategy},
    Container, ResolveErrorKind,
};

#[cfg(feature = "std")]
std::thread_local! {
    /// Types being built on this thread by every context, keyed by container.
    /// Resolutions started from inside a factory (through an injected or captured container)
    /// get a new context, so their cycles are only visible here.
    static BUILDING: core::cell::RefCell<Vec<(usize, TypeInfo)>> = const { core::cell::RefCell::new(Vec::new()) };
}

/// Marks a type as being built on this thread until dropped
#[cfg(feature = "std")]
struct Building;

#[cfg(feature = "std")]
impl Building {
    fn enter(container: usize, type_info: TypeInfo) -> Self {
        BUILDING.with(|building| building.borrow_mut().push((container, type_info)));
        Self
    }

    /// Types built on this thread since `type_info`, if it's being built
    fn path_since(container: usize, type_info: TypeInfo) -> Option<Vec<TypeInfo>> {
        BUILDING.with(|building| {
            let building = building.borrow();
            let start = building.iter().position(|entry| *entry == (container, type_info))?;
            Some(
                building[start..]
                    .iter()
                    .filter(|(id, _)| *id == container)
                    .map(|(_, type_info)| *type_info)
                    .collect(),
            )
        })
    }
}

#[cfg(feature = "std")]
impl Drop for Building {
    fn drop(&mut self) {
        BUILDING.with(|building| {
            building.borrow_mut().pop();
        });
    }
}

/// State of one resolution request: the path of types being built (for cycle detection)
/// and, for calls of bound functions, the cache of shared instances.
///
/// Passed to every [`crate::DependencyResolver`], so custom resolvers can ask the container for more.
pub struct Context<'a> {
    container: &'a Container,
    path: Vec<TypeInfo>,
    cache: Option<Cache>,
}

impl<'a> Context<'a> {
    #[inline]
    #[must_use]
    pub(crate) fn new(container: &'a Container) -> Self {
        Self {
            container,
            path: Vec::new(),
            cache: None,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn with_cache(container: &'a Container, cache: Option<Cache>) -> Self {
        Self {
            container,
            path: Vec::new(),
            cache,
        }
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Types currently being built, outermost first
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[TypeInfo] {
        &self.path
    }

    /// Resolves `T` within this request.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoBinding`] if `T` has no binding and no constructor
    /// - [`ResolveErrorKind::CyclicDependency`] if `T` is already being built in this request (or, with `std`, on this thread)
    /// - [`ResolveErrorKind::Dependency`] or [`ResolveErrorKind::Instantiate`] if building `T` failed
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, ResolveErrorKind> {
        let type_info = TypeInfo::of::<T>();

        let span = debug_span!("resolve", dependency = type_info.name, depth = self.path.len());
        let _guard = span.enter();

        if let Some(dependency) = self.cache.as_ref().and_then(|cache| cache.get::<T>(&type_info)) {
            debug!("Found in shared cache");
            return Ok(dependency);
        }

        let erased = self.resolve_erased(type_info)?;
        let Some(dependency) = unerase::<T>(&erased) else {
            let err = ResolveErrorKind::IncorrectType {
                expected: type_info,
                actual: (*erased).type_id(),
            };
            error!("{}", err);
            return Err(err);
        };

        if let Some(cache) = self.cache.as_mut() {
            if cache.insert(type_info, erased) {
                debug!("Shared for the call");
            }
        }

        Ok(dependency)
    }

    fn resolve_erased(&mut self, type_info: TypeInfo) -> Result<Erased, ResolveErrorKind> {
        if let Some(mut path) = self.active_path(type_info) {
            path.push(type_info);
            return Err(Self::cyclic(path));
        }

        self.path.push(type_info);
        #[cfg(feature = "std")]
        let building = Building::enter(self.container.id(), type_info);
        let result = self.build(type_info);
        #[cfg(feature = "std")]
        drop(building);
        self.path.pop();

        result
    }

    /// Types being built since `type_info`, if it's being built by this request
    /// or, with `std`, by any request on this thread
    fn active_path(&self, type_info: TypeInfo) -> Option<Vec<TypeInfo>> {
        if let Some(start) = self.path.iter().position(|entry| *entry == type_info) {
            return Some(self.path[start..].to_vec());
        }

        #[cfg(feature = "std")]
        return Building::path_since(self.container.id(), type_info);
        #[cfg(not(feature = "std"))]
        None
    }

    fn cyclic(path: Vec<TypeInfo>) -> ResolveErrorKind {
        let err = ResolveErrorKind::CyclicDependency {
            path: path.into_boxed_slice(),
        };
        error!("{}", err);
        err
    }

    fn build(&mut self, type_info: TypeInfo) -> Result<Erased, ResolveErrorKind> {
        let inner = &self.container.inner;

        let Some(strategy) = inner.strategy(&type_info) else {
            let Some(constructor) = inner.constructor(&type_info) else {
                let err = ResolveErrorKind::NoBinding { type_info };
                error!("{}", err);
                return Err(err);
            };

            debug!("No binding, constructing");
            return constructor.call(self);
        };

        debug!(kind = strategy.kind(), "Found binding");

        match strategy {
            Strategy::Instance(value) => Ok(value),
            Strategy::Singleton { instantiator, cell } => {
                if let Some(value) = cell.get() {
                    debug!("Found in singleton cache");
                    return Ok(value);
                }
                // Checked before claiming: threads holding claims in one cycle would wait on each other
                if let Some(cycle) = inner.declared_cycle(type_info) {
                    let mut path = self.path.clone();
                    path.extend(cycle);
                    return Err(Self::cyclic(path));
                }

                match cell.claim() {
                    Some(Claim::Built(value)) => {
                        debug!("Found in singleton cache");
                        Ok(value)
                    }
                    Some(Claim::Build(guard)) => {
                        let value = instantiator.call(self)?;
                        guard.finish(value.clone());
                        debug!("Cached");

                        Ok(value)
                    }
                    None => {
                        let mut path = self.path.clone();
                        path.push(type_info);
                        Err(Self::cyclic(path))
                    }
                }
            }
            Strategy::Transient(instantiator) => instantiator.call(self),
            Strategy::Alias(convert) => convert(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::{
        any::{erase, TypeInfo},
        registry::{BindingData, Strategy},
        Container, ResolveErrorKind,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec::Vec,
    };
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_value_of_another_type() {
        let container = Container::explicit();
        container.inner.registry.write().insert(
            TypeInfo::of::<u16>(),
            BindingData {
                strategy: Strategy::Instance(erase(Arc::new(1u8))),
                dependencies: Vec::new(),
            },
        );

        let err = container.resolve::<u16>().err().unwrap();
        assert!(matches!(err, ResolveErrorKind::IncorrectType { expected, .. } if expected == TypeInfo::of::<u16>()));
        assert!(logs_contain("Incorrect binding provides type"));
    }

    #[test]
    fn test_path_is_empty_after_resolution() {
        let container = Container::explicit();
        container.set(crate::Binding::instance(1u8));

        let mut context = Context::new(&container);
        assert_eq!(*context.resolve::<u8>().unwrap(), 1);
        assert!(context.path().is_empty());

        // Nothing is left marked as being built, so resolving again isn't a cycle
        assert_eq!(*container.resolve::<u8>().unwrap(), 1);
    }
}
