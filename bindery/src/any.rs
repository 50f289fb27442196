use alloc::{collections::BTreeMap, sync::Arc};
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

/// Lookup key of the container: identity of a type plus its name for diagnostics.
///
/// Keys are compared by [`TypeId`] only, so two newtypes over the same primitive
/// (`struct Port(u16)` and `struct Timeout(u16)`) are never confused.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

/// Type-erased resolved value.
/// The concrete value behind it is always an `Arc<T>`, which lets unsized `T` (trait objects) be stored too.
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

pub(crate) type Map = BTreeMap<TypeInfo, Erased>;

#[inline]
#[must_use]
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Erased {
    Arc::new(value)
}

#[inline]
#[must_use]
pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(erased: &Erased) -> Option<Arc<T>> {
    erased.downcast_ref::<Arc<T>>().cloned()
}
