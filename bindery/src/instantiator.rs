use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::marker::PhantomData;
use tracing::debug;

use super::{
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, ResolveErrorKind},
};
use crate::{
    any::{erase, Erased, TypeInfo},
    dependency::Dependency,
    Context,
};

/// Factory of a value whose parameters are resolved from the container.
///
/// Implemented for closures and functions returning `Result<_, _>` with up to 12 parameters,
/// every parameter being a [`DependencyResolver`]:
/// ```rust
/// use bindery::{Inject, InstantiateErrorKind, Instantiator};
///
/// struct Config;
/// struct Client(std::sync::Arc<Config>);
///
/// fn assert_instantiator<Deps: bindery::DependencyResolver>(_: impl Instantiator<Deps>) {}
///
/// assert_instantiator(|Inject(config): Inject<Config>| Ok::<_, InstantiateErrorKind>(Client(config)));
/// ```
pub trait Instantiator<Deps>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;

    #[inline]
    #[must_use]
    fn dependencies() -> Vec<Dependency> {
        Deps::dependencies()
    }
}

pub(crate) trait ErasedInstantiator: Send + Sync {
    fn call(&self, context: &mut Context<'_>) -> Result<Erased, ResolveErrorKind>;
}

pub(crate) type BoxedInstantiator = Arc<dyn ErasedInstantiator>;

struct InstantiatorFn<Inst, Deps> {
    instantiator: Inst,
    _deps: PhantomData<fn() -> Deps>,
}

impl<Inst, Deps> ErasedInstantiator for InstantiatorFn<Inst, Deps>
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver,
{
    fn call(&self, context: &mut Context<'_>) -> Result<Erased, ResolveErrorKind> {
        let type_info = TypeInfo::of::<Inst::Provides>();

        let dependencies = match Deps::resolve(context) {
            Ok(dependencies) => dependencies,
            Err(err) => {
                return Err(ResolveErrorKind::Dependency {
                    type_info,
                    source: Box::new(err.into()),
                })
            }
        };
        let dependency = match self.instantiator.clone().instantiate(dependencies) {
            Ok(dependency) => dependency,
            Err(err) => {
                return Err(ResolveErrorKind::Instantiate {
                    type_info,
                    source: err.into(),
                })
            }
        };

        debug!("Instantiated");

        Ok(erase(Arc::new(dependency)))
    }
}

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedInstantiator
where
    Inst: Instantiator<Deps>,
    Deps: DependencyResolver + 'static,
{
    Arc::new(InstantiatorFn {
        instantiator,
        _deps: PhantomData,
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);
