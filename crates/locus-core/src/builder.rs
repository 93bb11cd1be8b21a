//! Bootstrap — assembling and freezing a resolver.
//!
//! # Bootstrap order
//!
//! ```text
//! explicit registrations (with_provider / with_converter / with_arbiter)
//!          │
//!          ▼
//! discoverers, in registration order (each contributes providers,
//!          │  converters, arbiters)
//!          ▼
//! built-in default converters (appended last; first-wins keeps yours)
//!          │
//!          ▼
//! registries frozen, resolver marked initialized
//!          │
//!          ▼
//! "configurationCoordinates" resolved once against the empty coordinate
//! set and cached for the resolver's lifetime
//! ```

use crate::convert::{default_converters, ConverterRegistry, CoordinatesConverter};
use crate::{
    Arbiter, Convert, Discoverer, DiscardMalformed, ErasedConvert, MalformedValueSink, Provider,
    ResolveError, Resolver, CONFIGURATION_COORDINATES,
};
use tracing::debug;

/// Builder for [`Resolver`].
///
/// # Example
///
/// ```
/// use locus_core::testing::ScriptedProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// let resolver = Resolver::builder()
///     .with_provider(ScriptedProvider::fixed(
///         "bootstrap",
///         None,
///         locus_core::CONFIGURATION_COORDINATES,
///         "{region=west}",
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     resolver.coordinates(),
///     &Coordinates::from([("region", "west")])
/// );
/// ```
pub struct ResolverBuilder {
    providers: Vec<Box<dyn Provider>>,
    converters: Vec<Box<dyn ErasedConvert>>,
    arbiters: Vec<Box<dyn Arbiter>>,
    discoverers: Vec<Box<dyn Discoverer>>,
    sink: Box<dyn MalformedValueSink>,
    default_converters: bool,
}

impl ResolverBuilder {
    /// Creates an empty builder with default converters enabled and the
    /// discarding malformed-value sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            converters: Vec::new(),
            arbiters: Vec::new(),
            discoverers: Vec::new(),
            sink: Box::new(DiscardMalformed),
            default_converters: true,
        }
    }

    /// Registers a provider. Providers are consulted in registration
    /// order.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Registers a converter.
    ///
    /// At most one converter per output type; the first registration
    /// wins, and built-in defaults come last.
    #[must_use]
    pub fn with_converter(mut self, converter: impl Convert + Send + Sync + 'static) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// Registers an arbiter. Arbiters are consulted in registration
    /// order.
    #[must_use]
    pub fn with_arbiter(mut self, arbiter: impl Arbiter + 'static) -> Self {
        self.arbiters.push(Box::new(arbiter));
        self
    }

    /// Registers a discoverer, run at [`build()`](Self::build) after
    /// explicit registrations.
    #[must_use]
    pub fn with_discoverer(mut self, discoverer: impl Discoverer + 'static) -> Self {
        self.discoverers.push(Box::new(discoverer));
        self
    }

    /// Replaces the malformed-value sink (default: discard).
    #[must_use]
    pub fn with_malformed_sink(mut self, sink: impl MalformedValueSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Skips registration of the built-in converters.
    #[must_use]
    pub fn without_default_converters(mut self) -> Self {
        self.default_converters = false;
        self
    }

    /// Freezes the registries, then acquires the process-wide coordinates
    /// by resolving [`CONFIGURATION_COORDINATES`] against the empty
    /// coordinate set.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the coordinate acquisition itself
    /// fails (a provider fault, ambiguity among coordinate answers, or an
    /// unparseable coordinate string).
    pub fn build(mut self) -> Result<Resolver, ResolveError> {
        let mut providers = self.providers;
        let mut converters = self.converters;
        let mut arbiters = self.arbiters;

        for discoverer in &mut self.discoverers {
            let mut found = discoverer.discover();
            debug!(
                providers = found.providers.len(),
                converters = found.converters.len(),
                arbiters = found.arbiters.len(),
                "discoverer contributed registrations"
            );
            providers.append(&mut found.providers);
            converters.append(&mut found.converters);
            arbiters.append(&mut found.arbiters);
        }

        let mut registry = ConverterRegistry::new();
        for converter in converters {
            registry.register(converter);
        }
        if self.default_converters {
            for converter in default_converters() {
                registry.register(converter);
            }
        }

        debug!(
            providers = providers.len(),
            arbiters = arbiters.len(),
            conversion_types = registry.tokens().len(),
            "resolver assembled"
        );

        let mut resolver = Resolver::new(providers, arbiters, registry, self.sink);
        resolver.mark_initialized();

        // The canonical converter is used directly so a builder stripped
        // of default converters still bootstraps.
        let coordinates = resolver
            .resolve_with(None, CONFIGURATION_COORDINATES, &CoordinatesConverter, None)?
            .unwrap_or_default();
        debug!(coordinates = %coordinates, "process coordinates acquired");
        resolver.set_coordinates(coordinates);

        Ok(resolver)
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
