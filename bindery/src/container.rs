use alloc::{
    boxed::Box,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    vec::Vec,
};
use core::any::type_name;
use parking_lot::RwLock;
use tracing::{debug, error, info_span};

use crate::{
    any::TypeInfo,
    autowired::{self, Constructor},
    binding::Binding,
    bound::{Bound, Handler},
    context::Context,
    dependency::Dependency,
    errors::{DefineErrorKind, ResolveErrorKind},
    instantiator::BoxedInstantiator,
    registry::{Registry, Strategy},
};

/// Type-keyed registry of bindings and resolver of instances.
///
/// `Container` is a handle: clones share the same bindings. Use [`Container::fork`] for an independent copy.
///
/// ```rust
/// use bindery::{Binding, Container, Inject, InstantiateErrorKind};
///
/// struct Database {
///     url: &'static str,
/// }
///
/// struct UserService {
///     database: std::sync::Arc<Database>,
/// }
///
/// let container = Container::new();
/// container.set(Binding::singleton(|| Ok::<_, InstantiateErrorKind>(Database { url: "postgres://localhost" })));
/// container.set(Binding::transient(|Inject(database): Inject<Database>| {
///     Ok::<_, InstantiateErrorKind>(UserService { database })
/// }));
///
/// let service = container.resolve::<UserService>().unwrap();
/// assert_eq!(service.database.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container that constructs types registered with `#[injectable]`
    /// (and `#[derive(Env)]`) when they have no explicit binding.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Registry::default(), Some(Arc::new(autowired::collect())))
    }

    /// Creates an empty container that only resolves explicitly bound types
    #[inline]
    #[must_use]
    pub fn explicit() -> Self {
        Self::with_registry(Registry::default(), None)
    }

    #[inline]
    #[must_use]
    fn with_registry(registry: Registry, constructors: Option<Arc<BTreeMap<TypeInfo, Constructor>>>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: RwLock::new(registry),
                constructors,
            }),
        }
    }

    /// Identity of the bindings shared by this handle and its clones
    #[inline]
    #[must_use]
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Registers or replaces the binding for `T`.
    /// A replaced singleton is discarded together with its cached value.
    pub fn set<T: ?Sized + 'static>(&self, binding: Binding<T>) {
        let type_info = TypeInfo::of::<T>();
        let data = binding.into_data();
        let kind = data.strategy.kind();

        if self.inner.registry.write().insert(type_info, data).is_some() {
            debug!(dependency = type_info.name, kind, "Binding replaced");
        } else {
            debug!(dependency = type_info.name, kind, "Binding set");
        }
    }

    /// Registers the binding for `T` only if `T` isn't bound yet.
    ///
    /// # Errors
    /// Returns [`DefineErrorKind::AlreadyDefined`] if `T` already has a binding
    pub fn define<T: ?Sized + 'static>(&self, binding: Binding<T>) -> Result<(), DefineErrorKind> {
        let type_info = TypeInfo::of::<T>();

        let mut registry = self.inner.registry.write();
        if registry.contains(&type_info) {
            let err = DefineErrorKind::AlreadyDefined { type_info };
            error!("{}", err);
            return Err(err);
        }
        registry.insert(type_info, binding.into_data());
        debug!(dependency = type_info.name, "Binding defined");

        Ok(())
    }

    /// Removes the binding for `T`, returns `true` if there was one
    pub fn remove<T: ?Sized + 'static>(&self) -> bool {
        let removed = self.inner.registry.write().remove(&TypeInfo::of::<T>()).is_some();
        if removed {
            debug!(dependency = type_name::<T>(), "Binding removed");
        }
        removed
    }

    /// Whether `T` has an explicit binding. Auto-constructible types without a binding aren't counted.
    #[inline]
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.read().contains(&TypeInfo::of::<T>())
    }

    /// Resolves `T`, building it and its dependencies as their bindings say.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoBinding`] if `T` has no binding and can't be constructed automatically
    /// - [`ResolveErrorKind::Dependency`] if a dependency of `T` (at any depth) can't be resolved
    /// - [`ResolveErrorKind::CyclicDependency`] if `T` depends on itself
    /// - [`ResolveErrorKind::Instantiate`] if a factory failed
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let span = info_span!("resolve", dependency = type_name::<T>());
        let _guard = span.enter();

        Context::new(self).resolve()
    }

    /// Like [`Container::resolve`], but returns `None` when `T` or something it needs can't be resolved.
    ///
    /// # Errors
    /// Cycles and factory failures are still returned as errors
    pub fn resolve_optional<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ResolveErrorKind> {
        match self.resolve() {
            Ok(dependency) => Ok(Some(dependency)),
            Err(err) if err.is_unresolvable() => {
                debug!(dependency = type_name::<T>(), "Unresolvable, skipped");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Wraps `handler`, so its parameters are resolved from this container at call time.
    /// See [`Bound`].
    #[inline]
    #[must_use]
    pub fn bind<F, Deps>(&self, handler: F) -> Bound<F, Deps>
    where
        F: Handler<Deps>,
    {
        Bound::new(self.clone(), handler)
    }

    /// Creates an independent container with a copy of the bindings.
    ///
    /// Singletons already built are shared with the fork until one of the containers replaces the binding.
    /// Singletons not built yet are built separately by each container, from its own bindings.
    #[must_use]
    pub fn fork(&self) -> Container {
        let registry = self.inner.registry.read().clone();
        // Cells are locked only after the registry lock is released
        let registry = registry.fork();
        debug!(bindings = registry.len(), "Container forked");

        Self::with_registry(registry, self.inner.constructors.clone())
    }

    /// Checks that every binding's required dependencies can be resolved, without building anything.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::Dependency`] wrapping [`ResolveErrorKind::NoBinding`] for the first missing dependency
    /// - [`ResolveErrorKind::CyclicDependency`] for the first cycle
    pub fn validate(&self) -> Result<(), ResolveErrorKind> {
        let span = info_span!("validate");
        let _guard = span.enter();

        let registry = self.inner.registry.read().clone();
        debug!(bindings = registry.len(), "Validating");

        let mut visited = BTreeSet::new();
        for type_info in registry.keys() {
            if let Err(err) = self.visit(&registry, *type_info, &mut Vec::new(), &mut visited) {
                error!("{}", err);
                return Err(err);
            }
        }

        debug!("Valid");
        Ok(())
    }

    fn visit(
        &self,
        registry: &Registry,
        type_info: TypeInfo,
        path: &mut Vec<TypeInfo>,
        visited: &mut BTreeSet<TypeInfo>,
    ) -> Result<(), ResolveErrorKind> {
        if visited.contains(&type_info) {
            return Ok(());
        }
        if path.contains(&type_info) {
            let mut path = path.clone();
            path.push(type_info);
            return Err(ResolveErrorKind::CyclicDependency {
                path: path.into_boxed_slice(),
            });
        }

        let Some(dependencies) = self.inner.declared_dependencies(registry, &type_info) else {
            return Err(ResolveErrorKind::NoBinding { type_info });
        };

        path.push(type_info);
        let result = dependencies
            .iter()
            .filter(|dependency| dependency.required)
            .try_for_each(|dependency| {
                self.visit(registry, dependency.type_info, path, visited)
                    .map_err(|err| ResolveErrorKind::Dependency {
                        type_info,
                        source: Box::new(err),
                    })
            });
        path.pop();
        result?;

        visited.insert(type_info);
        Ok(())
    }
}

pub(crate) struct ContainerInner {
    pub(crate) registry: RwLock<Registry>,
    /// `None` for explicit containers
    pub(crate) constructors: Option<Arc<BTreeMap<TypeInfo, Constructor>>>,
}

impl ContainerInner {
    /// Dependencies of `type_info` as declared by its binding or constructor
    #[must_use]
    fn declared_dependencies<'a>(&'a self, registry: &'a Registry, type_info: &TypeInfo) -> Option<&'a [Dependency]> {
        match registry.get(type_info) {
            Some(data) => Some(&data.dependencies),
            None => self
                .constructors
                .as_ref()
                .and_then(|constructors| constructors.get(type_info))
                .map(Constructor::dependencies),
        }
    }

    /// Path from `start` back to `start` over declared dependencies, excluding the first `start`
    #[must_use]
    pub(crate) fn declared_cycle(&self, start: TypeInfo) -> Option<Vec<TypeInfo>> {
        let registry = self.registry.read();

        let mut path = Vec::new();
        let mut visited = BTreeSet::new();
        if self.reaches(&registry, start, start, &mut path, &mut visited) {
            Some(path)
        } else {
            None
        }
    }

    fn reaches(
        &self,
        registry: &Registry,
        current: TypeInfo,
        start: TypeInfo,
        path: &mut Vec<TypeInfo>,
        visited: &mut BTreeSet<TypeInfo>,
    ) -> bool {
        let Some(dependencies) = self.declared_dependencies(registry, &current) else {
            return false;
        };

        for dependency in dependencies {
            let type_info = dependency.type_info;
            path.push(type_info);
            if type_info == start || (visited.insert(type_info) && self.reaches(registry, type_info, start, path, visited)) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// The read lock is released before returning, factories never run under it
    #[inline]
    #[must_use]
    pub(crate) fn strategy(&self, type_info: &TypeInfo) -> Option<Strategy> {
        self.registry.read().get(type_info).map(|data| data.strategy.clone())
    }

    #[inline]
    #[must_use]
    pub(crate) fn constructor(&self, type_info: &TypeInfo) -> Option<BoxedInstantiator> {
        self.constructors
            .as_ref()
            .and_then(|constructors| constructors.get(type_info))
            .map(|constructor| constructor.instantiator.clone())
    }
}
