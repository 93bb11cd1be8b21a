//! Environment variables as a provider.

use locus_core::{ConfigValue, Coordinates, Provider, ProviderError, Resolver};

/// Serves process environment variables.
///
/// Every answer carries empty coordinates (an environment variable knows
/// nothing about the caller's location) and never claims authority, so an
/// equally unspecific value from another source forces arbitration rather
/// than being silently shadowed.
///
/// # Example
///
/// ```
/// use locus_providers::EnvProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// std::env::set_var("LOCUS_DOCTEST_GREETING", "hello");
/// let resolver = Resolver::builder()
///     .with_provider(EnvProvider::new())
///     .build()
///     .unwrap();
///
/// let value = resolver.get("LOCUS_DOCTEST_GREETING").unwrap();
/// assert_eq!(value.as_deref(), Some("hello"));
/// std::env::remove_var("LOCUS_DOCTEST_GREETING");
/// ```
#[derive(Debug, Clone)]
pub struct EnvProvider {
    id: String,
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvProvider {
    /// Creates the provider with the id `"env"`.
    #[must_use]
    pub fn new() -> Self {
        Self { id: "env".into() }
    }

    /// Creates the provider with a custom id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Provider for EnvProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        _resolver: &Resolver,
        _caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        Ok(std::env::var(name)
            .ok()
            .map(|value| ConfigValue::new(self.id.clone(), None, name, Some(value))))
    }
}
