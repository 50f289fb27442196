use alloc::{collections::BTreeSet, sync::Arc};

use crate::any::{self, unerase, Erased, TypeInfo};

/// Instances shared during one call of a bound function.
/// Created empty for every call and dropped with the call's context.
#[derive(Default)]
pub(crate) struct Cache {
    shared: BTreeSet<TypeInfo>,
    map: any::Map,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new(shared: BTreeSet<TypeInfo>) -> Self {
        Self {
            shared,
            map: any::Map::new(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_shared(&self, type_info: &TypeInfo) -> bool {
        self.shared.contains(type_info)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get<T: ?Sized + Send + Sync + 'static>(&self, type_info: &TypeInfo) -> Option<Arc<T>> {
        self.map.get(type_info).and_then(unerase)
    }

    /// Inserts only types declared as shared, returns `true` if the value was inserted
    #[inline]
    pub(crate) fn insert(&mut self, type_info: TypeInfo, value: Erased) -> bool {
        if !self.is_shared(&type_info) {
            return false;
        }
        self.map.insert(type_info, value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;
    use crate::any::{erase, TypeInfo};

    use alloc::{collections::BTreeSet, sync::Arc};

    struct Shared;
    struct NotShared;

    #[test]
    fn test_insert_only_shared() {
        let mut cache = Cache::new(BTreeSet::from([TypeInfo::of::<Shared>()]));

        let shared = Arc::new(Shared);
        assert!(cache.insert(TypeInfo::of::<Shared>(), erase(shared.clone())));
        assert!(!cache.insert(TypeInfo::of::<NotShared>(), erase(Arc::new(NotShared))));

        assert!(Arc::ptr_eq(&cache.get::<Shared>(&TypeInfo::of::<Shared>()).unwrap(), &shared));
        assert!(cache.get::<NotShared>(&TypeInfo::of::<NotShared>()).is_none());
    }
}
