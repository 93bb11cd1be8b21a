//! Built-in providers and arbiters for the locus resolution engine.
//!
//! `locus-core` defines the contracts; this crate supplies the concrete
//! sources most deployments start from:
//!
//! | Type | Serves |
//! |------|--------|
//! | [`EnvProvider`] | process environment variables, empty coordinates |
//! | [`MapProvider`] | an in-memory map at fixed coordinates |
//! | [`TomlFileProvider`] | a TOML file flattened to dotted names |
//! | [`CoordinatesProvider`] | the reserved `configurationCoordinates` property |
//! | [`SourcePreferenceArbiter`] | tie-breaking by provider id |
//!
//! # Layered setup
//!
//! ```
//! use locus_providers::{CoordinatesProvider, EnvProvider, MapProvider};
//! use locus_core::{Coordinates, Resolver};
//!
//! let resolver = Resolver::builder()
//!     .with_provider(CoordinatesProvider::fixed("{environment=test}"))
//!     .with_provider(EnvProvider::new())
//!     .with_provider(
//!         MapProvider::new("defaults", None).with_entry("db.url", "jdbc:default"),
//!     )
//!     .with_provider(
//!         MapProvider::new("test-layer", Some(Coordinates::from([("environment", "test")])))
//!             .with_entry("db.url", "jdbc:test"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! // The process lives at {environment=test}, so the test layer is the
//! // most specific answer.
//! assert_eq!(resolver.get("db.url").unwrap().as_deref(), Some("jdbc:test"));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod arbiter;
mod coordinates;
mod env;
mod error;
mod file;
mod map;

pub use arbiter::SourcePreferenceArbiter;
pub use coordinates::CoordinatesProvider;
pub use env::EnvProvider;
pub use error::FileProviderError;
pub use file::TomlFileProvider;
pub use map::MapProvider;
