use crate::any::TypeInfo;

/// Declared dependency of a factory or constructor, used to check the graph without constructing anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependency {
    pub type_info: TypeInfo,
    /// `false` for dependencies that resolve to `None` instead of failing, e.g. `Option<Inject<T>>`
    pub required: bool,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn required(type_info: TypeInfo) -> Self {
        Self { type_info, required: true }
    }

    #[inline]
    #[must_use]
    pub fn optional(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            required: false,
        }
    }
}
