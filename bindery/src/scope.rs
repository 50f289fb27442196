use alloc::collections::BTreeSet;

use crate::{any::TypeInfo, cache::Cache};

/// Types shared within one call of a bound function, even if their bindings are transient
#[derive(Clone, Default)]
pub(crate) struct SharedScope {
    types: BTreeSet<TypeInfo>,
}

impl SharedScope {
    #[inline]
    pub(crate) fn share(&mut self, type_info: TypeInfo) {
        self.types.insert(type_info);
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fresh cache for a single call
    #[inline]
    #[must_use]
    pub(crate) fn cache(&self) -> Option<Cache> {
        if self.is_empty() {
            None
        } else {
            Some(Cache::new(self.types.clone()))
        }
    }
}
