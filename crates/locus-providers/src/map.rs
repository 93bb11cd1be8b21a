//! In-memory map provider.

use locus_core::{ConfigValue, Coordinates, Provider, ProviderError, Resolver};
use std::collections::HashMap;

/// Serves a fixed set of entries at fixed coordinates.
///
/// The workhorse provider for layered setups: give each layer its own
/// `MapProvider` shaped by the coordinates it applies to, and the
/// resolver picks the most specific one for each request.
///
/// # Example
///
/// ```
/// use locus_providers::MapProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// let test_layer = Coordinates::from([("environment", "test")]);
/// let resolver = Resolver::builder()
///     .with_provider(
///         MapProvider::new("test-layer", Some(test_layer.clone()))
///             .with_entry("db.url", "jdbc:test"),
///     )
///     .build()
///     .unwrap();
///
/// let value = resolver.get_at(&test_layer, "db.url", None).unwrap();
/// assert_eq!(value.as_deref(), Some("jdbc:test"));
/// ```
#[derive(Debug, Clone)]
pub struct MapProvider {
    id: String,
    coordinates: Coordinates,
    entries: HashMap<String, String>,
    authoritative: bool,
}

impl MapProvider {
    /// Creates an empty provider shaped by `coordinates` (absent means
    /// the empty set).
    #[must_use]
    pub fn new(id: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            id: id.into(),
            coordinates: coordinates.unwrap_or_default(),
            entries: HashMap::new(),
            authoritative: false,
        }
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Adds every entry of `entries`.
    #[must_use]
    pub fn with_entries<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Marks every served value as authoritative at this layer's
    /// specificity.
    #[must_use]
    pub fn with_authority(mut self) -> Self {
        self.authoritative = true;
        self
    }

    /// Names of all entries this provider can answer.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Provider for MapProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        _resolver: &Resolver,
        _caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        Ok(self.entries.get(name).map(|value| {
            let config_value = ConfigValue::new(
                self.id.clone(),
                Some(self.coordinates.clone()),
                name,
                Some(value.clone()),
            );
            if self.authoritative {
                config_value.with_authority()
            } else {
                config_value
            }
        }))
    }
}
