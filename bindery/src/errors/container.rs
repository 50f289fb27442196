use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum DefineErrorKind {
    #[error("`{}` is already defined in the container. Use `Container::set` to replace it", type_info.name)]
    AlreadyDefined { type_info: TypeInfo },
}
