//! Coordinate-aware configuration resolution.
//!
//! # Architecture
//!
//! A caller lives at a logical location described by *coordinates* — a
//! small map like `{environment=test, region=west}`. Configuration values
//! come from a federation of independent *providers*, each free to answer
//! any property at any coordinate subset. The resolver reconciles those
//! answers into one deterministic result:
//!
//! ```text
//! caller ──▶ Resolver ──▶ Provider (each, in registry order)
//!                │             │
//!                │             ▼
//!                │        ConfigValue (coordinates, payload, authority)
//!                ▼
//!         classification ──▶ ranking by specificity ──▶ authority rule
//!                │                                          │
//!                │                                   tie remains?
//!                │                                          ▼
//!                │                                   Arbiter chain
//!                ▼
//!            Converter ──▶ typed result
//! ```
//!
//! Selection rules, in order:
//!
//! 1. A value whose coordinates equal the caller's (an *exact match*)
//!    wins outright — unless a second exact match appears.
//! 2. Otherwise the value with the most coordinate entries (highest
//!    *specificity*) among entry-wise subsets of the caller's wins.
//! 3. At equal specificity, a value marked *authoritative* beats one
//!    that is not.
//! 4. Any remaining tie goes to the arbiter chain; if every arbiter
//!    defers, the request fails as ambiguous.
//!
//! Values that cannot be trusted (wrong property name, coordinates that
//! are not a subset of the caller's) are set aside for a pluggable
//! malformed-value sink instead of competing.
//!
//! # Bootstrap
//!
//! [`ResolverBuilder`] assembles providers, converters, and arbiters
//! (explicitly or through [`Discoverer`]s), freezes the registries, and
//! resolves the reserved [`CONFIGURATION_COORDINATES`] property once to
//! learn the process-wide coordinates. After that the resolver is
//! immutable and any number of threads may query it concurrently.
//!
//! # Example
//!
//! ```
//! use locus_core::testing::ScriptedProvider;
//! use locus_core::{Coordinates, Resolver};
//!
//! let test_layer = Coordinates::from([("environment", "test")]);
//! let resolver = Resolver::builder()
//!     .with_provider(ScriptedProvider::fixed("defaults", None, "db.url", "jdbc:default"))
//!     .with_provider(ScriptedProvider::fixed(
//!         "test-layer",
//!         Some(test_layer.clone()),
//!         "db.url",
//!         "jdbc:test",
//!     ))
//!     .build()
//!     .unwrap();
//!
//! // The more specific layer wins inside the test environment…
//! let at_test = resolver.get_at(&test_layer, "db.url", None).unwrap();
//! assert_eq!(at_test.as_deref(), Some("jdbc:test"));
//!
//! // …and the unshaped default wins everywhere else.
//! let elsewhere = resolver.get_at(&Coordinates::new(), "db.url", None).unwrap();
//! assert_eq!(elsewhere.as_deref(), Some("jdbc:default"));
//! ```
//!
//! Concrete providers (environment variables, files, …) live in the
//! `locus-providers` crate; this crate only defines the contracts and the
//! engine.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod arbiter;
mod builder;
mod convert;
mod coordinates;
mod discovery;
mod error;
mod guard;
mod provider;
mod resolver;
mod sink;
mod value;

pub mod testing;

pub use arbiter::Arbiter;
pub use builder::ResolverBuilder;
pub use convert::{
    Convert, CoordinatesConverter, DurationConverter, ErasedConvert, FromStrConverter,
    PathConverter, StringConverter, StringListConverter, StringMapConverter, TypeToken,
};
pub use coordinates::{Coordinates, CoordinatesParseError};
pub use discovery::{Discovered, Discoverer, StaticDiscoverer};
pub use error::{ArbiterError, ConversionError, MalformedError, ProviderError, ResolveError};
pub use provider::Provider;
pub use resolver::{Resolver, CONFIGURATION_COORDINATES};
pub use sink::{DiscardMalformed, MalformedValueSink, RejectMalformed};
pub use value::ConfigValue;
