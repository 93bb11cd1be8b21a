//! Acquisition of the process-wide coordinates.

use locus_core::{
    ConfigValue, Coordinates, Provider, ProviderError, Resolver, CONFIGURATION_COORDINATES,
};

/// Answers only the reserved `configurationCoordinates` property.
///
/// The payload is the `{k=v,…}` string the bootstrap feeds through the
/// coordinates converter. By default it is read from the
/// `configurationCoordinates` environment variable at lookup time; a
/// fixed string can be supplied instead for deployments that inject the
/// location some other way.
///
/// # Example
///
/// ```
/// use locus_providers::CoordinatesProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// let resolver = Resolver::builder()
///     .with_provider(CoordinatesProvider::fixed("{region=west,environment=test}"))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     resolver.coordinates(),
///     &Coordinates::from([("environment", "test"), ("region", "west")])
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatesProvider {
    id: String,
    source: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Env(String),
    Fixed(String),
}

impl CoordinatesProvider {
    /// Reads the `configurationCoordinates` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_var(CONFIGURATION_COORDINATES)
    }

    /// Reads a custom environment variable.
    #[must_use]
    pub fn from_env_var(variable: impl Into<String>) -> Self {
        Self {
            id: "coordinates".into(),
            source: Source::Env(variable.into()),
        }
    }

    /// Serves a fixed coordinate string.
    #[must_use]
    pub fn fixed(coordinates: impl Into<String>) -> Self {
        Self {
            id: "coordinates".into(),
            source: Source::Fixed(coordinates.into()),
        }
    }
}

impl Provider for CoordinatesProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        _resolver: &Resolver,
        _caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        if name != CONFIGURATION_COORDINATES {
            return Ok(None);
        }
        let payload = match &self.source {
            Source::Env(variable) => std::env::var(variable).ok(),
            Source::Fixed(coordinates) => Some(coordinates.clone()),
        };
        Ok(payload.map(|p| ConfigValue::new(self.id.clone(), None, name, Some(p))))
    }
}
