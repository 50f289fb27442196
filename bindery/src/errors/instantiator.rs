use super::env::EnvErrorKind;

/// Error of a factory or constructor itself, as opposed to a failure to resolve its dependencies.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
    #[error(transparent)]
    Env(#[from] EnvErrorKind),
}
