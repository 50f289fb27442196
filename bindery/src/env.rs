//! Configuration objects populated from environment variables at resolution time.
//!
//! A field `example_value` is read from `EXAMPLE_VALUE`, or from `APPNAME_EXAMPLE_VALUE`
//! when the schema has the `APPNAME` prefix.
//!
//! ```rust
//! use bindery::{env::Env, Binding, Container};
//! use std::collections::BTreeMap;
//!
//! #[derive(bindery::Env)]
//! #[env(prefix = "APPNAME")]
//! struct Settings {
//!     database_url: String,
//!     workers: Option<u16>,
//! }
//!
//! let vars = BTreeMap::from([("APPNAME_DATABASE_URL".to_owned(), "postgres://db".to_owned())]);
//!
//! let container = Container::new();
//! container.set(Binding::<Settings>::env_from(vars));
//!
//! let settings = container.resolve::<Settings>().unwrap();
//! assert_eq!(settings.database_url, "postgres://db");
//! assert_eq!(settings.workers, None);
//! ```

use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
    sync::Arc,
};
use core::{fmt::Display, str::FromStr};
use tracing::debug;

use crate::{Binding, EnvErrorKind, InstantiateErrorKind};

#[cfg(feature = "macros")]
pub use bindery_macros::Env;

/// Where variables come from
pub trait EnvSource: Send + Sync + 'static {
    fn var(&self, name: &str) -> Option<String>;
}

/// Variables of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for Arc<S> {
    #[inline]
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Declarative schema of a configuration object.
/// Usually derived with `#[derive(bindery::Env)]`.
pub trait Env: Sized + Send + Sync + 'static {
    const PREFIX: Option<&'static str> = None;

    /// # Errors
    /// Returns [`EnvErrorKind`] if a required variable is missing or a value can't be parsed
    fn from_env(vars: &EnvVars<'_>) -> Result<Self, EnvErrorKind>;

    /// Loads the schema from the process environment
    ///
    /// # Errors
    /// See [`Env::from_env`]
    #[inline]
    fn load() -> Result<Self, EnvErrorKind> {
        Self::load_from(&ProcessEnv)
    }

    /// # Errors
    /// See [`Env::from_env`]
    #[inline]
    fn load_from(source: &dyn EnvSource) -> Result<Self, EnvErrorKind> {
        Self::from_env(&EnvVars::new(Self::PREFIX, source))
    }
}

/// Variables of one schema, with its prefix applied
pub struct EnvVars<'a> {
    prefix: Option<&'a str>,
    source: &'a dyn EnvSource,
}

impl<'a> EnvVars<'a> {
    #[inline]
    #[must_use]
    pub fn new(prefix: Option<&'a str>, source: &'a dyn EnvSource) -> Self {
        Self { prefix, source }
    }

    /// Full variable name of a field: uppercased, with the prefix if any
    #[must_use]
    pub fn name(&self, field: &str) -> String {
        let field = field.to_uppercase();
        match self.prefix {
            Some(prefix) => [prefix, "_", field.as_str()].concat(),
            None => field,
        }
    }

    /// # Errors
    /// Returns [`EnvErrorKind::Invalid`] if the variable is set but can't be parsed
    pub fn optional<T>(&self, field: &str) -> Result<Option<T>, EnvErrorKind>
    where
        T: FromStr,
        T::Err: Display,
    {
        let name = self.name(field);
        let Some(value) = self.source.var(&name) else {
            debug!(name = name.as_str(), "Optional variable not set");
            return Ok(None);
        };

        match value.parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => Err(EnvErrorKind::Invalid {
                name,
                value,
                message: err.to_string(),
            }),
        }
    }

    /// # Errors
    /// - Returns [`EnvErrorKind::Missing`] if the variable isn't set
    /// - Returns [`EnvErrorKind::Invalid`] if the variable can't be parsed
    pub fn required<T>(&self, field: &str) -> Result<T, EnvErrorKind>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(field)?.ok_or_else(|| EnvErrorKind::Missing { name: self.name(field) })
    }
}

impl<T: Env> Binding<T> {
    /// Populates `T` from the process environment on every resolution.
    /// A missing required variable fails the resolution, not the registration.
    #[inline]
    #[must_use]
    pub fn env() -> Self {
        Self::env_from(ProcessEnv)
    }

    /// Populates `T` from `source` on every resolution
    #[inline]
    #[must_use]
    pub fn env_from<S: EnvSource>(source: S) -> Self {
        let source = Arc::new(source);
        Self::transient(move || T::load_from(&*source).map_err(InstantiateErrorKind::from))
    }
}

#[cfg(test)]
mod tests {
    use super::{Env, EnvSource, EnvVars};
    use crate::{Binding, Container, EnvErrorKind, InstantiateErrorKind, ResolveErrorKind};

    use alloc::{
        borrow::ToOwned as _,
        collections::BTreeMap,
        string::{String, ToString as _},
    };

    struct MyEnv {
        example_value: Option<String>,
    }

    impl Env for MyEnv {
        fn from_env(vars: &EnvVars<'_>) -> Result<Self, EnvErrorKind> {
            Ok(Self {
                example_value: vars.optional("example_value")?,
            })
        }
    }

    struct MyEnvWithPrefix {
        example_value: String,
        port: u16,
    }

    impl Env for MyEnvWithPrefix {
        const PREFIX: Option<&'static str> = Some("APPNAME");

        fn from_env(vars: &EnvVars<'_>) -> Result<Self, EnvErrorKind> {
            Ok(Self {
                example_value: vars.required("example_value")?,
                port: vars.required("port")?,
            })
        }
    }

    fn vars<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
        pairs.into_iter().map(|(name, value)| (name.to_owned(), value.to_owned())).collect()
    }

    #[test]
    fn test_names() {
        let source = vars([]);
        assert_eq!(EnvVars::new(None, &source).name("example_value"), "EXAMPLE_VALUE");
        assert_eq!(EnvVars::new(Some("APPNAME"), &source).name("example_value"), "APPNAME_EXAMPLE_VALUE");
    }

    #[test]
    fn test_env_can_be_loaded() {
        let env = MyEnv::load_from(&vars([])).unwrap();
        assert_eq!(env.example_value, None);

        let env = MyEnv::load_from(&vars([("EXAMPLE_VALUE", "from the environment")])).unwrap();
        assert_eq!(env.example_value.as_deref(), Some("from the environment"));
    }

    #[test]
    fn test_prefix() {
        let source = vars([("APPNAME_EXAMPLE_VALUE", "with a prefix"), ("APPNAME_PORT", "8080"), ("EXAMPLE_VALUE", "without")]);
        let env = MyEnvWithPrefix::load_from(&source).unwrap();

        assert_eq!(env.example_value, "with a prefix");
        assert_eq!(env.port, 8080);
    }

    #[test]
    fn test_missing_and_invalid() {
        let err = MyEnvWithPrefix::load_from(&vars([("APPNAME_PORT", "8080")])).err().unwrap();
        assert_eq!(
            err,
            EnvErrorKind::Missing {
                name: "APPNAME_EXAMPLE_VALUE".to_owned()
            }
        );

        let err = MyEnvWithPrefix::load_from(&vars([("APPNAME_EXAMPLE_VALUE", "value"), ("APPNAME_PORT", "http")]))
            .err()
            .unwrap();
        assert!(matches!(err, EnvErrorKind::Invalid { ref name, ref value, .. } if name == "APPNAME_PORT" && value == "http"));
    }

    #[test]
    fn test_missing_is_resolution_error() {
        let container = Container::new();
        // Registration never reads variables
        container.set(Binding::<MyEnvWithPrefix>::env_from(vars([])));

        let err = container.resolve::<MyEnvWithPrefix>().err().unwrap();
        assert!(matches!(
            err,
            ResolveErrorKind::Instantiate {
                source: InstantiateErrorKind::Env(EnvErrorKind::Missing { .. }),
                ..
            }
        ));
        assert!(err.to_string().contains("APPNAME_EXAMPLE_VALUE"));
    }

    #[test]
    fn test_source_read_on_every_resolution() {
        struct Counter(core::sync::atomic::AtomicU8);

        impl EnvSource for Counter {
            fn var(&self, _name: &str) -> Option<String> {
                let count = self.0.fetch_add(1, core::sync::atomic::Ordering::SeqCst) + 1;
                Some(count.to_string())
            }
        }

        let container = Container::new();
        container.set(Binding::<MyEnv>::env_from(Counter(core::sync::atomic::AtomicU8::new(0))));

        assert_eq!(container.resolve::<MyEnv>().unwrap().example_value.as_deref(), Some("1"));
        assert_eq!(container.resolve::<MyEnv>().unwrap().example_value.as_deref(), Some("2"));
    }
}
