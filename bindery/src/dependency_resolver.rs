use alloc::vec::Vec;

use super::errors::ResolveErrorKind;
use crate::{context::Context, dependency::Dependency};

/// A value that can be produced from a resolution [`Context`].
///
/// Parameters of factories, constructors and bound functions are dependency resolvers.
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error>;

    /// Types this resolver asks the container for
    #[inline]
    #[must_use]
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(context: &mut Context<'_>) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(context).map_err(Into::into)?,)*))
            }

            #[inline]
            fn dependencies() -> Vec<Dependency> {
                let mut dependencies = Vec::new();
                $( dependencies.extend($ty::dependencies()); )*
                dependencies
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

#[cfg(test)]
mod tests {
    use super::DependencyResolver;
    use crate::{
        any::TypeInfo,
        inject::{Inject, Supplied},
        Container,
    };

    use alloc::sync::Arc;

    struct Request;
    struct Response;

    #[test]
    #[allow(dead_code)]
    fn test_dependency_resolver_impls() {
        fn resolver<T: DependencyResolver>() {}
        fn resolver_with_dep<Dep: ?Sized + Send + Sync + 'static>() {
            resolver::<Inject<Dep>>();
            resolver::<Arc<Dep>>();
            resolver::<Option<Arc<Dep>>>();
            resolver::<(Inject<Dep>, Arc<Dep>, Container)>();
            resolver::<(Supplied<u8>, Inject<Dep>)>();
        }
    }

    #[test]
    fn test_tuple_dependencies() {
        let dependencies = <(Inject<Request>, Option<Arc<Response>>, Container, Supplied<u8>)>::dependencies();

        assert_eq!(dependencies.len(), 2);
        assert_eq!(dependencies[0].type_info, TypeInfo::of::<Request>());
        assert!(dependencies[0].required);
        assert_eq!(dependencies[1].type_info, TypeInfo::of::<Response>());
        assert!(!dependencies[1].required);
    }
}
