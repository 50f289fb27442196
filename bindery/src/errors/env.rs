use alloc::string::String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvErrorKind {
    #[error("Required environment variable `{name}` is not set")]
    Missing { name: String },
    #[error("Environment variable `{name}` has invalid value `{value}`: {message}")]
    Invalid { name: String, value: String, message: String },
}
