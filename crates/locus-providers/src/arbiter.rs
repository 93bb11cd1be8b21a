//! Source-preference arbitration.

use locus_core::{Arbiter, ArbiterError, ConfigValue, Coordinates};

/// Resolves equal-specificity ties in favor of a named source.
///
/// The classic collision is a property defined both as an environment
/// variable and in another zero-coordinate source: both candidates have
/// specificity 0 and no authority, so ranking cannot separate them.
/// Registering this arbiter with the id of the source that should win
/// turns the ambiguity into a deterministic answer; it defers whenever
/// the preferred source is not among the candidates.
///
/// # Example
///
/// ```
/// use locus_providers::{EnvProvider, MapProvider, SourcePreferenceArbiter};
/// use locus_core::Resolver;
///
/// std::env::set_var("LOCUS_DOCTEST_PATHISH", "from-env");
/// let resolver = Resolver::builder()
///     .with_provider(EnvProvider::new())
///     .with_provider(
///         MapProvider::new("overrides", None)
///             .with_entry("LOCUS_DOCTEST_PATHISH", "from-overrides"),
///     )
///     .with_arbiter(SourcePreferenceArbiter::new("overrides"))
///     .build()
///     .unwrap();
///
/// let value = resolver.get("LOCUS_DOCTEST_PATHISH").unwrap();
/// assert_eq!(value.as_deref(), Some("from-overrides"));
/// std::env::remove_var("LOCUS_DOCTEST_PATHISH");
/// ```
#[derive(Debug, Clone)]
pub struct SourcePreferenceArbiter {
    id: String,
    preferred: String,
}

impl SourcePreferenceArbiter {
    /// Prefers candidates produced by the provider with id `preferred`.
    #[must_use]
    pub fn new(preferred: impl Into<String>) -> Self {
        let preferred = preferred.into();
        Self {
            id: format!("prefer:{preferred}"),
            preferred,
        }
    }
}

impl Arbiter for SourcePreferenceArbiter {
    fn id(&self) -> &str {
        &self.id
    }

    fn arbitrate(
        &self,
        _caller: &Coordinates,
        _name: &str,
        values: &[ConfigValue],
    ) -> Result<Option<ConfigValue>, ArbiterError> {
        Ok(values
            .iter()
            .find(|value| value.source() == self.preferred)
            .cloned())
    }
}
