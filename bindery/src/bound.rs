use core::marker::PhantomData;
use tracing::{debug, error, info_span};

use crate::{
    any::TypeInfo, context::Context, dependency_resolver::DependencyResolver, scope::SharedScope, Container, ResolveErrorKind,
};

/// Function whose parameters are resolved from a container.
/// Implemented for closures and functions with up to 12 [`DependencyResolver`] parameters.
pub trait Handler<Deps> {
    type Output;

    fn call(&self, dependencies: Deps) -> Self::Output;
}

/// Parameter list of a [`Handler`] that can take values from the caller.
///
/// `Overrides` is a tuple of `Option`s, one per parameter: `Some` values are passed as is,
/// `None` parameters are resolved from the container.
pub trait Parameters: DependencyResolver {
    type Overrides: Default;

    #[allow(clippy::missing_errors_doc)]
    fn resolve_with(context: &mut Context<'_>, overrides: Self::Overrides) -> Result<Self, ResolveErrorKind>;
}

/// Function bound to a container, created by [`Container::bind`].
///
/// ```rust
/// use bindery::{Binding, Container, Inject, InstantiateErrorKind, Supplied};
///
/// struct Greeting(&'static str);
///
/// let container = Container::new();
/// container.set(Binding::instance(Greeting("hello")));
///
/// let greet = container.bind(|Inject(greeting): Inject<Greeting>, Supplied(name): Supplied<&'static str>| {
///     format!("{}, {name}", greeting.0)
/// });
///
/// assert_eq!(greet.call_with((None, Some(Supplied("world")))).unwrap(), "hello, world");
/// assert!(greet.call().is_err());
/// ```
pub struct Bound<F, Deps> {
    container: Container,
    handler: F,
    scope: SharedScope,
    _deps: PhantomData<fn() -> Deps>,
}

impl<F: Clone, Deps> Clone for Bound<F, Deps> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            handler: self.handler.clone(),
            scope: self.scope.clone(),
            _deps: PhantomData,
        }
    }
}

impl<F, Deps> Bound<F, Deps> {
    #[inline]
    #[must_use]
    pub(crate) fn new(container: Container, handler: F) -> Self {
        Self {
            container,
            handler,
            scope: SharedScope::default(),
            _deps: PhantomData,
        }
    }

    /// Declares `T` shared: within one call, every occurrence of `T` (including dependencies of dependencies)
    /// resolves to the same instance, even if its binding is transient. The next call gets a new one.
    #[inline]
    #[must_use]
    pub fn share<T: ?Sized + 'static>(mut self) -> Self {
        self.scope.share(TypeInfo::of::<T>());
        self
    }
}

impl<F, Deps> Bound<F, Deps>
where
    F: Handler<Deps>,
    Deps: Parameters,
{
    /// Calls the function with every parameter resolved from the container
    ///
    /// # Errors
    /// Returns the first resolution error, the function isn't called then
    #[inline]
    pub fn call(&self) -> Result<F::Output, ResolveErrorKind> {
        self.call_with(Deps::Overrides::default())
    }

    /// Calls the function with the caller's values for `Some` parameters and resolved values for the rest
    ///
    /// # Errors
    /// Returns the first resolution error, the function isn't called then
    pub fn call_with(&self, overrides: Deps::Overrides) -> Result<F::Output, ResolveErrorKind> {
        let span = info_span!("call", handler = core::any::type_name::<F>());
        let _guard = span.enter();

        let mut context = Context::with_cache(&self.container, self.scope.cache());
        let dependencies = match Deps::resolve_with(&mut context, overrides) {
            Ok(dependencies) => dependencies,
            Err(err) => {
                error!("{}", err);
                return Err(err);
            }
        };
        drop(context);

        debug!("Parameters resolved");
        Ok(self.handler.call(dependencies))
    }
}

macro_rules! impl_handler {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Output, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Output,
        {
            type Output = Output;

            #[inline]
            fn call(&self, ($($ty,)*): ($($ty,)*)) -> Self::Output {
                self($($ty,)*)
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<$($ty,)*> Parameters for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Overrides = ($(Option<$ty>,)*);

            fn resolve_with(context: &mut Context<'_>, ($($ty,)*): Self::Overrides) -> Result<Self, ResolveErrorKind> {
                Ok(($(
                    match $ty {
                        Some(value) => {
                            debug!(parameter = core::any::type_name::<$ty>(), "Supplied by caller");
                            value
                        }
                        None => <$ty as DependencyResolver>::resolve(context).map_err(Into::into)?,
                    },
                )*))
            }
        }
    };
}

all_the_tuples!(impl_handler);

#[cfg(test)]
mod tests {
    use crate::{any::TypeInfo, Binding, Container, Inject, InstantiateErrorKind, ResolveErrorKind, Supplied};

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    struct Config(u8);
    struct Session(u8);
    struct UserRepo(Arc<Session>);
    struct OrderRepo(Arc<Session>);

    fn session_counter(container: &Container) -> Arc<AtomicU8> {
        let count = Arc::new(AtomicU8::new(0));
        container.set(Binding::transient({
            let count = count.clone();
            move || Ok::<_, InstantiateErrorKind>(Session(count.fetch_add(1, Ordering::SeqCst)))
        }));
        container.set(Binding::transient(|session: Arc<Session>| Ok::<_, InstantiateErrorKind>(UserRepo(session))));
        container.set(Binding::transient(|session: Arc<Session>| Ok::<_, InstantiateErrorKind>(OrderRepo(session))));
        count
    }

    #[test]
    #[traced_test]
    fn test_call_resolves_parameters() {
        let container = Container::new();
        container.set(Binding::instance(Config(1)));

        let bound = container.bind(|Inject(config): Inject<Config>| config.0 + 1);
        assert_eq!(bound.call().unwrap(), 2);

        // Resolution happens at call time
        container.set(Binding::instance(Config(10)));
        assert_eq!(bound.call().unwrap(), 11);
        assert!(logs_contain("Parameters resolved"));
    }

    #[test]
    #[traced_test]
    fn test_overrides_take_precedence() {
        let container = Container::new();
        container.set(Binding::instance(Config(1)));

        let bound = container.bind(|Inject(config): Inject<Config>| config.0);

        let supplied = Arc::new(Config(42));
        assert_eq!(bound.call_with((Some(Inject(supplied.clone())),)).unwrap(), 42);
        assert_eq!(bound.call_with((None,)).unwrap(), 1);
        assert!(logs_contain("Supplied by caller"));
    }

    #[test]
    fn test_override_of_unresolvable_parameter() {
        let container = Container::explicit();

        let bound = container.bind(|config: Arc<Config>, Inject(session): Inject<Session>| config.0 + session.0);

        let err = bound.call().err().unwrap();
        assert!(err.is_unresolvable());

        let result = bound.call_with((Some(Arc::new(Config(2))), Some(Inject(Arc::new(Session(3))))));
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn test_not_supplied() {
        let container = Container::new();
        container.set(Binding::instance(Config(1)));

        let bound = container.bind(|Inject(config): Inject<Config>, Supplied(factor): Supplied<u8>| config.0 * factor);

        let err = bound.call().err().unwrap();
        assert!(matches!(err, ResolveErrorKind::NotSupplied { type_info } if type_info == TypeInfo::of::<u8>()));
        assert_eq!(bound.call_with((None, Some(Supplied(3)))).unwrap(), 3);
    }

    #[test]
    fn test_without_sharing_transients_are_distinct() {
        let container = Container::new();
        let count = session_counter(&container);

        let bound = container.bind(|users: Arc<UserRepo>, orders: Arc<OrderRepo>| (users.0 .0, orders.0 .0));

        let (users_session, orders_session) = bound.call().unwrap();
        assert_ne!(users_session, orders_session);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_shared_within_call() {
        let container = Container::new();
        let count = session_counter(&container);

        let bound = container
            .bind(|session: Arc<Session>, users: Arc<UserRepo>, orders: Arc<OrderRepo>| {
                Arc::ptr_eq(&session, &users.0) && Arc::ptr_eq(&users.0, &orders.0)
            })
            .share::<Session>();

        assert!(bound.call().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Found in shared cache"));

        // No leakage across calls
        assert!(bound.call().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shared_doesnt_leak_between_calls() {
        let container = Container::new();
        session_counter(&container);

        let bound = container.bind(|session: Arc<Session>| session).share::<Session>();

        let first = bound.call().unwrap();
        let second = bound.call().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // Outside of bound calls, transient stays transient
        let third = container.resolve::<Session>().unwrap();
        let fourth = container.resolve::<Session>().unwrap();
        assert!(!Arc::ptr_eq(&third, &fourth));
    }

    #[test]
    fn test_clone_keeps_shared_types() {
        let container = Container::new();
        let count = session_counter(&container);

        let bound = container
            .bind(|users: Arc<UserRepo>, orders: Arc<OrderRepo>| Arc::ptr_eq(&users.0, &orders.0))
            .share::<Session>();
        let cloned = bound.clone();

        assert!(cloned.call().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
