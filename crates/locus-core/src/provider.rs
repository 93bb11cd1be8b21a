//! Provider contract.
//!
//! A provider is a pluggable source of configuration values. The resolver
//! consults every registered provider in registry order and reconciles
//! their answers; a provider only has to answer `(coordinates, name)`
//! queries, it never ranks or arbitrates.

use crate::{ConfigValue, Coordinates, ProviderError, Resolver};

/// A source of configuration values keyed by name and shaped by
/// coordinates.
///
/// # Contract
///
/// - [`lookup`](Self::lookup) either returns a value whose
///   [`name`](ConfigValue::name) equals the requested name, or `Ok(None)`.
/// - Returned coordinates should be a subset of the caller's; the resolver
///   tolerates violations and classifies them as malformed rather than
///   trusting the provider.
/// - Inputs must not be mutated.
/// - An `Err` aborts the current resolution and propagates, tagged with
///   this provider's [`id`](Self::id). The reentrancy guard is released on
///   every exit path.
///
/// # Nested queries
///
/// The resolver passes itself into `lookup`, so a provider may issue
/// nested queries (e.g. to read a derived coordinate). The per-thread
/// reentrancy guard prevents the provider from being re-entered by its own
/// nested query: from the provider's point of view, it simply does not
/// appear in the nested resolution.
///
/// # Example
///
/// ```
/// use locus_core::{ConfigValue, Coordinates, Provider, ProviderError, Resolver};
///
/// struct Fixed;
///
/// impl Provider for Fixed {
///     fn id(&self) -> &str {
///         "fixed"
///     }
///
///     fn lookup(
///         &self,
///         _resolver: &Resolver,
///         _caller: &Coordinates,
///         name: &str,
///     ) -> Result<Option<ConfigValue>, ProviderError> {
///         if name == "greeting" {
///             Ok(Some(ConfigValue::new(self.id(), None, name, Some("hello".into()))))
///         } else {
///             Ok(None)
///         }
///     }
/// }
/// ```
pub trait Provider: Send + Sync {
    /// Stable identity of this provider.
    ///
    /// Used for the reentrancy guard's diagnostics, error tagging, and
    /// source-based arbitration. Should be unique within a resolver.
    fn id(&self) -> &str;

    /// Answers a lookup for `name` in the context of `caller`, or returns
    /// `Ok(None)` when this provider has nothing to say.
    fn lookup(
        &self,
        resolver: &Resolver,
        caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError>;
}
