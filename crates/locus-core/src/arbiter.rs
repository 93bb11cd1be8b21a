//! Arbiter contract.
//!
//! When ranking leaves two or more candidates that neither specificity nor
//! authority can separate, the resolver hands the tied set to an ordered
//! chain of arbiters. The first arbiter to return a value wins; an arbiter
//! that returns `Ok(None)` defers to the next one. If every arbiter defers
//! (or none are registered), the request fails with
//! [`ResolveError::Ambiguous`](crate::ResolveError::Ambiguous).

use crate::{ArbiterError, ConfigValue, Coordinates};

/// Disambiguates a set of tied candidate values.
///
/// Arbiters must treat their arguments as read-only; the chosen value is
/// returned by clone, not by mutation of the slice.
///
/// # Example
///
/// ```
/// use locus_core::{Arbiter, ArbiterError, ConfigValue, Coordinates};
///
/// /// Picks whichever tied candidate was produced first.
/// struct FirstWins;
///
/// impl Arbiter for FirstWins {
///     fn id(&self) -> &str {
///         "first-wins"
///     }
///
///     fn arbitrate(
///         &self,
///         _caller: &Coordinates,
///         _name: &str,
///         values: &[ConfigValue],
///     ) -> Result<Option<ConfigValue>, ArbiterError> {
///         Ok(values.first().cloned())
///     }
/// }
/// ```
pub trait Arbiter: Send + Sync {
    /// Stable identity of this arbiter, used for error tagging and logs.
    fn id(&self) -> &str;

    /// Attempts to pick a single winner from `values`.
    ///
    /// Returns `Ok(None)` to defer to the next arbiter in the chain.
    /// An `Err` aborts the resolution and propagates.
    fn arbitrate(
        &self,
        caller: &Coordinates,
        name: &str,
        values: &[ConfigValue],
    ) -> Result<Option<ConfigValue>, ArbiterError>;
}
