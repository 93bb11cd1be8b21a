//! Pluggable enumeration of providers, converters, and arbiters.
//!
//! The builder accepts explicit registrations, but deployments that
//! assemble their provider set elsewhere (a plugin directory, a host
//! platform registry, generated code) can hand the builder a
//! [`Discoverer`] instead. Discoverers run once, at
//! [`build()`](crate::ResolverBuilder::build), after explicit
//! registrations.

use crate::{Arbiter, ErasedConvert, Provider};

/// Everything one discoverer contributes.
#[derive(Default)]
pub struct Discovered {
    /// Providers, appended in this order to the registry.
    pub providers: Vec<Box<dyn Provider>>,
    /// Converters, subject to first-wins registration.
    pub converters: Vec<Box<dyn ErasedConvert>>,
    /// Arbiters, appended in this order to the chain.
    pub arbiters: Vec<Box<dyn Arbiter>>,
}

/// Enumerates registrations at bootstrap.
///
/// Called exactly once per builder; implementations may consume internal
/// state.
pub trait Discoverer {
    /// Yields this discoverer's contributions.
    fn discover(&mut self) -> Discovered;
}

/// Discoverer over a pre-assembled static set.
///
/// # Example
///
/// ```
/// use locus_core::testing::ScriptedProvider;
/// use locus_core::{Resolver, StaticDiscoverer};
///
/// let discoverer = StaticDiscoverer::new()
///     .with_provider(ScriptedProvider::fixed("fixture", None, "greeting", "hi"));
///
/// let resolver = Resolver::builder()
///     .with_discoverer(discoverer)
///     .build()
///     .unwrap();
/// assert_eq!(resolver.get("greeting").unwrap().as_deref(), Some("hi"));
/// ```
#[derive(Default)]
pub struct StaticDiscoverer {
    inner: Discovered,
}

impl StaticDiscoverer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider to the set.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.inner.providers.push(Box::new(provider));
        self
    }

    /// Adds a converter to the set.
    #[must_use]
    pub fn with_converter(mut self, converter: impl ErasedConvert + 'static) -> Self {
        self.inner.converters.push(Box::new(converter));
        self
    }

    /// Adds an arbiter to the set.
    #[must_use]
    pub fn with_arbiter(mut self, arbiter: impl Arbiter + 'static) -> Self {
        self.inner.arbiters.push(Box::new(arbiter));
        self
    }
}

impl Discoverer for StaticDiscoverer {
    fn discover(&mut self) -> Discovered {
        std::mem::take(&mut self.inner)
    }
}
