//! Resolution errors.

use crate::{ConfigValue, Coordinates};
use std::fmt;
use thiserror::Error;

/// Error raised by a resolution request.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requested property name was empty.
    #[error("property name must not be empty")]
    EmptyName,

    /// The resolver was used before bootstrap completed.
    #[error("resolver used before bootstrap completed")]
    NotInitialized,

    /// No converter is registered for the requested type.
    #[error("no converter registered for type '{type_name}'")]
    NoSuchConverter { type_name: &'static str },

    /// Ranking left a tie and no arbiter resolved it.
    #[error(
        "{} ambiguous values for property '{name}' at {coordinates}",
        .values.len()
    )]
    Ambiguous {
        coordinates: Coordinates,
        name: String,
        values: Vec<ConfigValue>,
    },

    /// A provider failed during lookup.
    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// An arbiter failed during arbitration.
    #[error("arbiter '{arbiter}' failed: {source}")]
    Arbiter {
        arbiter: String,
        #[source]
        source: ArbiterError,
    },

    /// Converting the selected value (or the default) failed.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// A strict malformed-value sink escalated.
    #[error(transparent)]
    Malformed(#[from] MalformedError),
}

impl ResolveError {
    /// Creates a converter-lookup failure for type `T`.
    #[must_use]
    pub fn no_such_converter<T>() -> Self {
        Self::NoSuchConverter {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Error raised by a [`Provider`](crate::Provider) implementation.
///
/// Providers are external collaborators; this wrapper carries their
/// message and an optional source error, and propagates unchanged through
/// the resolver (tagged with the provider id).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Error raised by an [`Arbiter`](crate::Arbiter) implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ArbiterError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ArbiterError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Error raised by a [`Convert`](crate::Convert) implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    /// Creates an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a parse failure for `raw` targeting `target`.
    pub fn parse(raw: &str, target: &str, detail: impl fmt::Display) -> Self {
        Self {
            message: format!("cannot convert '{raw}' to {target}: {detail}"),
        }
    }
}

/// Escalation raised by a strict malformed-value sink.
#[derive(Debug, Error)]
#[error("{count} malformed configuration value(s) rejected for property '{name}'")]
pub struct MalformedError {
    name: String,
    count: usize,
}

impl MalformedError {
    /// Creates an escalation for `count` malformed values of `name`.
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}
