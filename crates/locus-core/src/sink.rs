//! Handling of malformed provider answers.
//!
//! During the collection pass the resolver sets aside values that cannot
//! be trusted: wrong property name, coordinates more specific than the
//! caller's, same-arity-but-different coordinates, or coordinates that are
//! not a subset of the caller's. Those values are handed to a sink once
//! per request instead of silently vanishing inside the algorithm.
//!
//! The default sink discards them (the resolver has already logged the
//! count). A stricter deployment can install [`RejectMalformed`] or its
//! own sink at bootstrap to escalate.

use crate::{ConfigValue, Coordinates, MalformedError};

/// Receives the malformed values of one resolution request.
pub trait MalformedValueSink: Send + Sync {
    /// Handles malformed values; returning an error aborts the request
    /// with [`ResolveError::Malformed`](crate::ResolveError::Malformed).
    fn handle(
        &self,
        caller: &Coordinates,
        name: &str,
        values: Vec<ConfigValue>,
    ) -> Result<(), MalformedError>;
}

/// Default sink: malformed values are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardMalformed;

impl MalformedValueSink for DiscardMalformed {
    fn handle(
        &self,
        _caller: &Coordinates,
        _name: &str,
        _values: Vec<ConfigValue>,
    ) -> Result<(), MalformedError> {
        Ok(())
    }
}

/// Strict sink: any malformed value fails the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectMalformed;

impl MalformedValueSink for RejectMalformed {
    fn handle(
        &self,
        _caller: &Coordinates,
        name: &str,
        values: Vec<ConfigValue>,
    ) -> Result<(), MalformedError> {
        Err(MalformedError::new(name, values.len()))
    }
}
