use alloc::{sync::Arc, vec, vec::Vec};
use core::ops::Deref;

use crate::{any::TypeInfo, dependency::Dependency, dependency_resolver::DependencyResolver, Container, Context, ResolveErrorKind};

/// Dependency resolved from the container by its type.
///
/// Equivalent to asking for `Arc<Dep>` directly, but allows destructuring in parameter position:
/// `|Inject(repo): Inject<dyn UserRepo>| ...`
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: ?Sized> Deref for Inject<Dep> {
    type Target = Dep;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<Dep: ?Sized> Clone for Inject<Dep> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error> {
        context.resolve().map(Self)
    }

    #[inline]
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::required(TypeInfo::of::<Dep>())]
    }
}

impl<Dep: ?Sized + Send + Sync + 'static> DependencyResolver for Arc<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error> {
        context.resolve()
    }

    #[inline]
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::required(TypeInfo::of::<Dep>())]
    }
}

/// Resolves to `None` when the dependency (or anything it needs) can't be resolved.
/// Cycles and factory failures are still errors.
impl<Dep: DependencyResolver> DependencyResolver for Option<Dep> {
    type Error = ResolveErrorKind;

    fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error> {
        match Dep::resolve(context).map_err(Into::<ResolveErrorKind>::into) {
            Ok(dependency) => Ok(Some(dependency)),
            Err(err) if err.is_unresolvable() => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[inline]
    fn dependencies() -> Vec<Dependency> {
        Dep::dependencies()
            .into_iter()
            .map(|dependency| Dependency::optional(dependency.type_info))
            .collect()
    }
}

impl DependencyResolver for Container {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error> {
        Ok(context.container().clone())
    }
}

/// Parameter of a bound function that is never injected and must be passed by the caller
pub struct Supplied<T>(pub T);

impl<T: 'static> DependencyResolver for Supplied<T> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(_context: &mut Context<'_>) -> Result<Self, Self::Error> {
        Err(ResolveErrorKind::NotSupplied {
            type_info: TypeInfo::of::<T>(),
        })
    }
}
