//! The resolver — where conflicting provider answers become one value.
//!
//! # Architecture
//!
//! One resolution request flows through four stages:
//!
//! ```text
//! caller (coordinates, name)
//!          │
//!          ▼
//!   collection pass        consult every provider in registry order,
//!          │               classify each answer: exact / subset / malformed
//!          ▼
//!   ranking pass           drain the tie queue by descending specificity,
//!          │               apply the authority rule at equal rank
//!          ▼
//!   arbitration            ordered arbiter chain, first answer wins,
//!          │               all deferring → Ambiguous
//!          ▼
//!   conversion             selected payload (or the raw default) through
//!                          the chosen converter
//! ```
//!
//! # Classification
//!
//! A provider answer is matched against the caller's coordinates:
//!
//! - equal sets → exact match, the preferred candidate;
//! - proper entry-wise subset → ranked candidate, higher specificity wins;
//! - anything else (wrong name, more entries than the caller, same arity
//!   but different entries, not a subset) → malformed, set aside for the
//!   sink.
//!
//! # Concurrency
//!
//! All registries are frozen at bootstrap; any number of threads may
//! resolve concurrently. The only mutable state is the thread-local
//! reentrancy guard, which lets providers issue nested queries without
//! re-entering themselves.

use crate::convert::{ConverterRegistry, StringConverter};
use crate::guard::ActivationSet;
use crate::{
    Arbiter, ConfigValue, Convert, Coordinates, MalformedValueSink, Provider, ResolveError,
    TypeToken,
};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::{debug, trace};

/// Reserved property name whose value is the process-wide coordinate set.
///
/// Resolved once at bootstrap against the empty coordinate set, using the
/// canonical [`CoordinatesConverter`](crate::CoordinatesConverter), and
/// frozen for the resolver's lifetime.
pub const CONFIGURATION_COORDINATES: &str = "configurationCoordinates";

/// Resolves configuration values from a federation of providers.
///
/// Built by [`ResolverBuilder`](crate::ResolverBuilder); immutable
/// afterwards.
///
/// # Example
///
/// ```
/// use locus_core::testing::ScriptedProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// let resolver = Resolver::builder()
///     .with_provider(ScriptedProvider::fixed(
///         "test-layer",
///         Some(Coordinates::from([("environment", "test")])),
///         "db.url",
///         "jdbc:test",
///     ))
///     .build()
///     .unwrap();
///
/// let caller = Coordinates::from([("environment", "test")]);
/// let value = resolver.get_at(&caller, "db.url", None).unwrap();
/// assert_eq!(value.as_deref(), Some("jdbc:test"));
/// ```
pub struct Resolver {
    providers: Vec<Box<dyn Provider>>,
    arbiters: Vec<Box<dyn Arbiter>>,
    converters: ConverterRegistry,
    sink: Box<dyn MalformedValueSink>,
    guard: ActivationSet,
    coordinates: Coordinates,
    initialized: bool,
}

impl Resolver {
    /// Starts building a resolver.
    #[must_use]
    pub fn builder() -> crate::ResolverBuilder {
        crate::ResolverBuilder::new()
    }

    pub(crate) fn new(
        providers: Vec<Box<dyn Provider>>,
        arbiters: Vec<Box<dyn Arbiter>>,
        converters: ConverterRegistry,
        sink: Box<dyn MalformedValueSink>,
    ) -> Self {
        Self {
            providers,
            arbiters,
            converters,
            sink,
            guard: ActivationSet::new(),
            coordinates: Coordinates::new(),
            initialized: false,
        }
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub(crate) fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = coordinates;
    }

    /// The process-wide coordinates acquired at bootstrap.
    ///
    /// Stable for the resolver's lifetime; the default caller coordinates
    /// for [`get`](Self::get) and [`get_or`](Self::get_or).
    #[must_use]
    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Tokens of every type the converter registry can produce.
    #[must_use]
    pub fn conversion_types(&self) -> Vec<TypeToken> {
        self.converters.tokens()
    }

    /// Resolves `name` as a string at the process-wide coordinates.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub fn get(&self, name: &str) -> Result<Option<String>, ResolveError> {
        self.resolve_with(Some(&self.coordinates), name, &StringConverter, None)
    }

    /// Resolves `name` as a string at the process-wide coordinates, with a
    /// raw-string fallback.
    ///
    /// The default is fed through the converter like any provider payload.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub fn get_or(&self, name: &str, default: &str) -> Result<Option<String>, ResolveError> {
        self.resolve_with(Some(&self.coordinates), name, &StringConverter, Some(default))
    }

    /// Resolves `name` as a string at explicit coordinates.
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub fn get_at(
        &self,
        caller: &Coordinates,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        self.resolve_with(Some(caller), name, &StringConverter, default)
    }

    /// Resolves `name` as `T`, dispatching through the converter registry.
    ///
    /// The converter is looked up before any provider is consulted, so a
    /// missing converter fails fast.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoSuchConverter`] when no converter is registered
    /// for `T`; otherwise see [`ResolveError`].
    pub fn get_as<T: 'static>(
        &self,
        caller: &Coordinates,
        name: &str,
        default: Option<&str>,
    ) -> Result<Option<T>, ResolveError> {
        if !self.converters.contains::<T>() {
            return Err(ResolveError::no_such_converter::<T>());
        }
        let selected = self.select(caller, name)?;
        let raw = raw_payload(selected, default);
        self.converters.convert_to::<T>(raw.as_deref())
    }

    /// Resolves `name` with an explicit converter, bypassing the registry.
    ///
    /// `None` caller coordinates mean the empty set (not the process-wide
    /// coordinates).
    ///
    /// # Errors
    ///
    /// See [`ResolveError`].
    pub fn resolve_with<C: Convert>(
        &self,
        caller: Option<&Coordinates>,
        name: &str,
        converter: &C,
        default: Option<&str>,
    ) -> Result<Option<C::Output>, ResolveError> {
        let empty = Coordinates::new();
        let caller = caller.unwrap_or(&empty);
        let selected = self.select(caller, name)?;
        let raw = raw_payload(selected, default);
        Ok(converter.convert(raw.as_deref())?)
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Collection + ranking + arbitration; conversion is the caller's job.
    fn select(
        &self,
        caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ResolveError> {
        if name.is_empty() {
            return Err(ResolveError::EmptyName);
        }
        if !self.initialized {
            return Err(ResolveError::NotInitialized);
        }

        // Exact-match candidate, tracked with its provider slot so a
        // demotion into the tie queue keeps registry order.
        let mut selected: Option<(usize, ConfigValue)> = None;
        let mut ties: BinaryHeap<TieEntry> = BinaryHeap::new();
        let mut bad: Vec<ConfigValue> = Vec::new();

        for (slot, provider) in self.providers.iter().enumerate() {
            let value = {
                let Some(_active) = self.guard.try_activate(slot) else {
                    debug_assert!(self.guard.is_active(slot));
                    trace!(
                        provider = provider.id(),
                        property = name,
                        "provider active on this thread, skipped"
                    );
                    continue;
                };
                provider
                    .lookup(self, caller, name)
                    .map_err(|source| ResolveError::Provider {
                        provider: provider.id().to_string(),
                        source,
                    })?
            };
            let Some(value) = value else { continue };

            if value.name() != name {
                trace!(
                    provider = provider.id(),
                    answered = value.name(),
                    requested = name,
                    "provider answered a different property"
                );
                bad.push(value);
                continue;
            }

            let value_coordinates = value.coordinates();
            if value_coordinates.len() > caller.len() {
                // A value cannot be more specific than the caller.
                bad.push(value);
            } else if value_coordinates == caller {
                match selected.take() {
                    None if ties.is_empty() => selected = Some((slot, value)),
                    None => ties.push(TieEntry::new(slot, value)),
                    Some((previous_slot, previous)) => {
                        // A second exact match: neither is a candidate any
                        // more, both go to ranking/arbitration.
                        ties.push(TieEntry::new(previous_slot, previous));
                        ties.push(TieEntry::new(slot, value));
                    }
                }
            } else if value_coordinates.len() == caller.len() {
                // Same arity but equality failed above: disparate entries.
                bad.push(value);
            } else if selected.is_some() {
                // An exact match already won; subset answers are ignored,
                // but the scan continues to catch duplicate exact matches.
                trace!(
                    provider = provider.id(),
                    property = name,
                    "subset answer ignored, exact match already selected"
                );
            } else if value_coordinates.is_subset_of(caller) {
                ties.push(TieEntry::new(slot, value));
            } else {
                bad.push(value);
            }
        }

        debug_assert!(
            self.guard.is_clear(),
            "all providers must be inactive after the collection pass"
        );

        if !bad.is_empty() {
            debug!(
                count = bad.len(),
                property = name,
                "malformed configuration values set aside"
            );
            self.sink.handle(caller, name, bad)?;
        }

        let mut selected = selected.map(|(_, value)| value);

        if selected.is_none() && !ties.is_empty() {
            let mut arbitration: Vec<ConfigValue> = Vec::new();
            let mut top_specificity: Option<usize> = None;

            while let Some(entry) = ties.pop() {
                let specificity = entry.value.specificity();
                debug_assert!(top_specificity.map_or(true, |top| specificity <= top));

                match top_specificity {
                    Some(top) if specificity == top => match selected.take() {
                        // The rank is already under arbitration; the
                        // newcomer joins it.
                        None => arbitration.push(entry.value),
                        Some(current) => {
                            match (current.is_authoritative(), entry.value.is_authoritative()) {
                                // Authoritative beats non-authoritative.
                                (true, false) => selected = Some(current),
                                (false, true) => selected = Some(entry.value),
                                // Both or neither: arbitration required.
                                _ => {
                                    arbitration.push(current);
                                    arbitration.push(entry.value);
                                }
                            }
                        }
                    },
                    _ => {
                        // First value, or a strictly lower rank.
                        if selected.is_none() {
                            selected = Some(entry.value);
                            top_specificity = Some(specificity);
                        } else if arbitration.is_empty() {
                            // Unique strictly-best candidate; lower ranks
                            // cannot displace it.
                            break;
                        } else {
                            arbitration.push(entry.value);
                        }
                    }
                }
            }

            if !arbitration.is_empty() {
                selected = Some(self.perform_arbitration(caller, name, arbitration)?);
            }
        }

        if let Some(ref value) = selected {
            trace!(
                property = name,
                source = value.source(),
                specificity = value.specificity(),
                "value selected"
            );
        }
        Ok(selected)
    }

    fn perform_arbitration(
        &self,
        caller: &Coordinates,
        name: &str,
        values: Vec<ConfigValue>,
    ) -> Result<ConfigValue, ResolveError> {
        debug!(
            count = values.len(),
            property = name,
            "arbitration required"
        );
        for arbiter in &self.arbiters {
            match arbiter.arbitrate(caller, name, &values) {
                Ok(Some(winner)) => {
                    debug!(
                        arbiter = arbiter.id(),
                        source = winner.source(),
                        property = name,
                        "arbitration resolved"
                    );
                    return Ok(winner);
                }
                Ok(None) => continue,
                Err(source) => {
                    return Err(ResolveError::Arbiter {
                        arbiter: arbiter.id().to_string(),
                        source,
                    })
                }
            }
        }
        Err(ResolveError::Ambiguous {
            coordinates: caller.clone(),
            name: name.to_string(),
            values,
        })
    }

    #[cfg(test)]
    fn guard_is_clear(&self) -> bool {
        self.guard.is_clear()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field(
                "arbiters",
                &self.arbiters.iter().map(|a| a.id()).collect::<Vec<_>>(),
            )
            .field("converters", &self.converters)
            .field("coordinates", &self.coordinates)
            .finish_non_exhaustive()
    }
}

fn raw_payload(selected: Option<ConfigValue>, default: Option<&str>) -> Option<String> {
    match selected {
        // A selected value without a payload stays empty; the default is
        // only for the nothing-selected case.
        Some(value) => value.into_value(),
        None => default.map(str::to_string),
    }
}

/// Tie-queue entry: descending specificity, registry order within a rank.
struct TieEntry {
    slot: usize,
    value: ConfigValue,
}

impl TieEntry {
    fn new(slot: usize, value: ConfigValue) -> Self {
        Self { slot, value }
    }
}

impl PartialEq for TieEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TieEntry {}

impl PartialOrd for TieEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TieEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .specificity()
            .cmp(&other.value.specificity())
            .then_with(|| other.slot.cmp(&self.slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FailingProvider, NestedLookupProvider, RecordingSink, ScriptedArbiter, ScriptedProvider,
    };
    use crate::{ConversionError, FromStrConverter};
    use std::sync::atomic::Ordering as AtomicOrdering;

    fn coords(entries: &[(&str, &str)]) -> Coordinates {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    // ── Basic selection ──────────────────────────────────────

    #[test]
    fn all_none_returns_converted_default() {
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::silent("a"))
            .with_provider(ScriptedProvider::silent("b"))
            .build()
            .unwrap();

        let value = resolver.get_at(&Coordinates::new(), "key", Some("fallback"));
        assert_eq!(value.unwrap().as_deref(), Some("fallback"));

        let value = resolver.get_at(&Coordinates::new(), "key", None);
        assert_eq!(value.unwrap(), None);
    }

    #[test]
    fn single_well_formed_value_wins() {
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("only", None, "key", "v"))
            .build()
            .unwrap();

        let value = resolver.get_at(&Coordinates::new(), "key", Some("fallback"));
        assert_eq!(value.unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn exact_match_beats_subset() {
        let caller = coords(&[("environment", "test")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("base", None, "key", "from-base"))
            .with_provider(ScriptedProvider::fixed(
                "exact",
                Some(caller.clone()),
                "key",
                "from-exact",
            ))
            .build()
            .unwrap();

        let value = resolver.get_at(&caller, "key", None);
        assert_eq!(value.unwrap().as_deref(), Some("from-exact"));
    }

    #[test]
    fn highest_specificity_subset_wins() {
        let caller = coords(&[("environment", "test"), ("phase", "experimental")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "env-only",
                Some(coords(&[("environment", "test")])),
                "db.url",
                "jdbc:test",
            ))
            .with_provider(ScriptedProvider::fixed(
                "phase-only",
                Some(coords(&[("phase", "experimental")])),
                "db.url",
                "jdbc:experimental",
            ))
            .with_provider(ScriptedProvider::fixed(
                "both",
                Some(caller.clone()),
                "db.url",
                "jdbc:experimental:test",
            ))
            .build()
            .unwrap();

        // "both" is an exact match here; drop one coordinate to force
        // pure subset ranking below.
        let value = resolver.get_at(&caller, "db.url", None);
        assert_eq!(value.unwrap().as_deref(), Some("jdbc:experimental:test"));

        let wider = coords(&[
            ("environment", "test"),
            ("phase", "experimental"),
            ("region", "west"),
        ]);
        let value = resolver.get_at(&wider, "db.url", None);
        assert_eq!(value.unwrap().as_deref(), Some("jdbc:experimental:test"));
    }

    #[test]
    fn provider_order_is_irrelevant_for_exact_match() {
        let caller = coords(&[("environment", "test")]);
        let exact = || ScriptedProvider::fixed("exact", Some(coords(&[("environment", "test")])), "key", "winner");
        let subset = || ScriptedProvider::fixed("subset", None, "key", "loser");

        let forward = Resolver::builder()
            .with_provider(exact())
            .with_provider(subset())
            .build()
            .unwrap();
        let backward = Resolver::builder()
            .with_provider(subset())
            .with_provider(exact())
            .build()
            .unwrap();

        assert_eq!(
            forward.get_at(&caller, "key", None).unwrap().as_deref(),
            Some("winner")
        );
        assert_eq!(
            backward.get_at(&caller, "key", None).unwrap().as_deref(),
            Some("winner")
        );
    }

    // ── Malformed classification ─────────────────────────────

    #[test]
    fn wrong_name_goes_to_malformed_bucket() {
        let sink = RecordingSink::default();
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::new("confused", |_, name| {
                (name == "key")
                    .then(|| ConfigValue::new("confused", None, "other.key", Some("x".into())))
            }))
            .with_provider(ScriptedProvider::fixed("sane", None, "key", "good"))
            .with_malformed_sink(sink.clone())
            .build()
            .unwrap();

        let value = resolver.get_at(&Coordinates::new(), "key", None);
        assert_eq!(value.unwrap().as_deref(), Some("good"));

        let seen = sink.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), "other.key");
    }

    #[test]
    fn more_specific_than_caller_is_malformed() {
        let sink = RecordingSink::default();
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "overreaching",
                Some(coords(&[("a", "1"), ("b", "2")])),
                "key",
                "bad",
            ))
            .with_malformed_sink(sink.clone())
            .build()
            .unwrap();

        let value = resolver.get_at(&coords(&[("a", "1")]), "key", Some("fallback"));
        assert_eq!(value.unwrap().as_deref(), Some("fallback"));
        assert_eq!(sink.seen().len(), 1);
    }

    #[test]
    fn same_arity_different_entries_is_malformed() {
        let sink = RecordingSink::default();
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "sideways",
                Some(coords(&[("region", "east")])),
                "key",
                "bad",
            ))
            .with_malformed_sink(sink.clone())
            .build()
            .unwrap();

        let value = resolver.get_at(&coords(&[("region", "west")]), "key", None);
        assert_eq!(value.unwrap(), None);
        assert_eq!(sink.seen().len(), 1);
    }

    #[test]
    fn non_subset_is_never_selected() {
        let sink = RecordingSink::default();
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "foreign",
                Some(coords(&[("planet", "mars")])),
                "key",
                "bad",
            ))
            .with_malformed_sink(sink.clone())
            .build()
            .unwrap();

        let caller = coords(&[("region", "west"), ("environment", "test")]);
        let value = resolver.get_at(&caller, "key", None);
        assert_eq!(value.unwrap(), None);
        assert_eq!(sink.seen().len(), 1);
    }

    #[test]
    fn strict_sink_escalates() {
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::new("confused", |_, name| {
                (name == "key").then(|| ConfigValue::new("confused", None, "other.key", None))
            }))
            .with_malformed_sink(crate::RejectMalformed)
            .build()
            .unwrap();

        let err = resolver.get_at(&Coordinates::new(), "key", None).unwrap_err();
        assert!(matches!(err, ResolveError::Malformed(_)));
    }

    // ── Duplicate exact matches ──────────────────────────────

    #[test]
    fn duplicate_exact_matches_require_arbitration() {
        let caller = coords(&[("region", "west")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("a", Some(caller.clone()), "key", "va"))
            .with_provider(ScriptedProvider::fixed("b", Some(caller.clone()), "key", "vb"))
            .build()
            .unwrap();

        let err = resolver.get_at(&caller, "key", None).unwrap_err();
        match err {
            ResolveError::Ambiguous { values, name, .. } => {
                assert_eq!(name, "key");
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected Ambiguous, got: {other:?}"),
        }
    }

    #[test]
    fn later_subset_does_not_rescue_duplicate_exact_matches() {
        let caller = coords(&[("region", "west")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("a", Some(caller.clone()), "key", "va"))
            .with_provider(ScriptedProvider::fixed("b", Some(caller.clone()), "key", "vb"))
            .with_provider(ScriptedProvider::fixed("base", None, "key", "vbase"))
            .build()
            .unwrap();

        // The exact-match pair outranks the subset; the subset never
        // reaches arbitration thanks to the strict-leader break.
        let err = resolver.get_at(&caller, "key", None).unwrap_err();
        match err {
            ResolveError::Ambiguous { values, .. } => {
                assert_eq!(values.len(), 2);
                assert!(values.iter().all(|v| v.specificity() == 1));
            }
            other => panic!("expected Ambiguous, got: {other:?}"),
        }
    }

    // ── Authority ────────────────────────────────────────────

    #[test]
    fn authoritative_wins_tie_without_arbitration() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let layer = coords(&[("region", "west")]);
        let arbiter = ScriptedArbiter::pick_first("unused");
        let calls = arbiter.calls.clone();

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("meek", Some(layer.clone()), "key", "meek"))
            .with_provider(ScriptedProvider::authoritative(
                "boss",
                Some(layer),
                "key",
                "boss",
            ))
            .with_arbiter(arbiter)
            .build()
            .unwrap();

        let value = resolver.get_at(&caller, "key", None);
        assert_eq!(value.unwrap().as_deref(), Some("boss"));
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0, "no arbitration needed");
    }

    #[test]
    fn authoritative_first_still_wins() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let layer = coords(&[("region", "west")]);

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::authoritative(
                "boss",
                Some(layer.clone()),
                "key",
                "boss",
            ))
            .with_provider(ScriptedProvider::fixed("meek", Some(layer), "key", "meek"))
            .build()
            .unwrap();

        let value = resolver.get_at(&caller, "key", None);
        assert_eq!(value.unwrap().as_deref(), Some("boss"));
    }

    #[test]
    fn two_authoritative_values_go_to_arbitration() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let layer = coords(&[("region", "west")]);

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::authoritative("a", Some(layer.clone()), "key", "va"))
            .with_provider(ScriptedProvider::authoritative("b", Some(layer), "key", "vb"))
            .build()
            .unwrap();

        let err = resolver.get_at(&caller, "key", None).unwrap_err();
        assert!(matches!(err, ResolveError::Ambiguous { .. }));
    }

    #[test]
    fn three_way_tie_collects_all_for_arbitration() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let layer = coords(&[("region", "west")]);

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("a", Some(layer.clone()), "key", "va"))
            .with_provider(ScriptedProvider::fixed("b", Some(layer.clone()), "key", "vb"))
            .with_provider(ScriptedProvider::fixed("c", Some(layer), "key", "vc"))
            .build()
            .unwrap();

        let err = resolver.get_at(&caller, "key", None).unwrap_err();
        match err {
            ResolveError::Ambiguous { values, .. } => assert_eq!(values.len(), 3),
            other => panic!("expected Ambiguous, got: {other:?}"),
        }
    }

    #[test]
    fn strict_leader_breaks_before_lower_ranks() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "leader",
                Some(caller.clone()),
                "key",
                "leader",
            ))
            .with_provider(ScriptedProvider::fixed(
                "tied-1",
                Some(coords(&[("region", "west")])),
                "key",
                "t1",
            ))
            .with_provider(ScriptedProvider::fixed(
                "tied-2",
                Some(coords(&[("phase", "experimental")])),
                "key",
                "t2",
            ))
            .build()
            .unwrap();

        // Widen the caller so "leader" is a proper subset with
        // specificity 2, strictly above the tied pair at 1. The tie below
        // the leader must not cause arbitration.
        let wider = coords(&[
            ("region", "west"),
            ("phase", "experimental"),
            ("environment", "test"),
        ]);
        let value = resolver.get_at(&wider, "key", None);
        assert_eq!(value.unwrap().as_deref(), Some("leader"));
    }

    // ── Arbitration chain ────────────────────────────────────

    #[test]
    fn ambiguity_without_arbiters_fails() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "west",
                Some(coords(&[("region", "west")])),
                "db.url",
                "jdbc:west",
            ))
            .with_provider(ScriptedProvider::fixed(
                "experimental",
                Some(coords(&[("phase", "experimental")])),
                "db.url",
                "jdbc:experimental",
            ))
            .build()
            .unwrap();

        let err = resolver.get_at(&caller, "db.url", None).unwrap_err();
        match err {
            ResolveError::Ambiguous {
                coordinates,
                name,
                values,
            } => {
                assert_eq!(coordinates, caller);
                assert_eq!(name, "db.url");
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected Ambiguous, got: {other:?}"),
        }
    }

    #[test]
    fn first_non_deferring_arbiter_wins() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let deferring = ScriptedArbiter::deferring("deferring");
        let deferring_calls = deferring.calls.clone();
        let deciding = ScriptedArbiter::pick_source("deciding", "west");
        let unreached = ScriptedArbiter::pick_first("unreached");
        let unreached_calls = unreached.calls.clone();

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "west",
                Some(coords(&[("region", "west")])),
                "db.url",
                "jdbc:west",
            ))
            .with_provider(ScriptedProvider::fixed(
                "experimental",
                Some(coords(&[("phase", "experimental")])),
                "db.url",
                "jdbc:experimental",
            ))
            .with_arbiter(deferring)
            .with_arbiter(deciding)
            .with_arbiter(unreached)
            .build()
            .unwrap();

        let value = resolver.get_at(&caller, "db.url", None);
        assert_eq!(value.unwrap().as_deref(), Some("jdbc:west"));
        assert_eq!(deferring_calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(unreached_calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn arbiter_error_propagates() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "west",
                Some(coords(&[("region", "west")])),
                "key",
                "a",
            ))
            .with_provider(ScriptedProvider::fixed(
                "experimental",
                Some(coords(&[("phase", "experimental")])),
                "key",
                "b",
            ))
            .with_arbiter(ScriptedArbiter::failing("broken"))
            .build()
            .unwrap();

        let err = resolver.get_at(&caller, "key", None).unwrap_err();
        match err {
            ResolveError::Arbiter { arbiter, .. } => assert_eq!(arbiter, "broken"),
            other => panic!("expected Arbiter, got: {other:?}"),
        }
    }

    // ── Guard & reentrancy ───────────────────────────────────

    #[test]
    fn provider_error_propagates_and_releases_guard() {
        let resolver = Resolver::builder()
            .with_provider(FailingProvider::new("broken"))
            .build()
            .unwrap();

        let err = resolver.get_at(&Coordinates::new(), "key", None).unwrap_err();
        match err {
            ResolveError::Provider { provider, .. } => assert_eq!(provider, "broken"),
            other => panic!("expected Provider, got: {other:?}"),
        }
        assert!(resolver.guard_is_clear(), "guard released on the error path");

        // The resolver remains usable.
        let err = resolver.get_at(&Coordinates::new(), "key", None).unwrap_err();
        assert!(matches!(err, ResolveError::Provider { .. }));
    }

    #[test]
    fn guard_is_clear_after_success_and_ambiguity() {
        let caller = coords(&[("region", "west"), ("phase", "experimental")]);
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed(
                "west",
                Some(coords(&[("region", "west")])),
                "key",
                "a",
            ))
            .with_provider(ScriptedProvider::fixed(
                "experimental",
                Some(coords(&[("phase", "experimental")])),
                "key",
                "b",
            ))
            .build()
            .unwrap();

        assert!(resolver.get_at(&caller, "key", None).is_err());
        assert!(resolver.guard_is_clear());

        assert!(resolver
            .get_at(&coords(&[("region", "west")]), "key", None)
            .is_ok());
        assert!(resolver.guard_is_clear());
    }

    #[test]
    fn nested_lookup_reaches_other_providers() {
        let resolver = Resolver::builder()
            .with_provider(NestedLookupProvider::new("derived", "greeting.style", "greeting"))
            .with_provider(ScriptedProvider::fixed("base", None, "greeting", "hello"))
            .build()
            .unwrap();

        let value = resolver.get_at(&Coordinates::new(), "greeting.style", None);
        assert_eq!(value.unwrap().as_deref(), Some("derived:hello"));
    }

    #[test]
    fn self_recursive_provider_terminates() {
        // The provider derives "loop" from "loop"; the guard makes its
        // nested query skip itself, so the nested resolution sees no
        // providers and the outer one gets nothing to derive from.
        let resolver = Resolver::builder()
            .with_provider(NestedLookupProvider::new("ouroboros", "loop", "loop"))
            .build()
            .unwrap();

        let value = resolver.get_at(&Coordinates::new(), "loop", Some("fallback"));
        assert_eq!(value.unwrap().as_deref(), Some("fallback"));
        assert!(resolver.guard_is_clear());
    }

    // ── Entry contract & conversion ──────────────────────────

    #[test]
    fn empty_name_is_rejected() {
        let resolver = Resolver::builder().build().unwrap();
        let err = resolver.get_at(&Coordinates::new(), "", None).unwrap_err();
        assert!(matches!(err, ResolveError::EmptyName));
    }

    #[test]
    fn uninitialized_resolver_is_rejected() {
        let resolver = Resolver::new(
            Vec::new(),
            Vec::new(),
            ConverterRegistry::new(),
            Box::new(crate::DiscardMalformed),
        );
        let err = resolver.select(&Coordinates::new(), "key").unwrap_err();
        assert!(matches!(err, ResolveError::NotInitialized));
    }

    #[test]
    fn typed_default_goes_through_converter() {
        let resolver = Resolver::builder().build().unwrap();
        let value: Option<i64> = resolver
            .get_as(&Coordinates::new(), "retries", Some("42"))
            .unwrap();
        assert_eq!(value, Some(42));

        let err = resolver
            .get_as::<i64>(&Coordinates::new(), "retries", Some("not-a-number"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Conversion(_)));
    }

    #[test]
    fn missing_converter_fails_before_providers_run() {
        #[derive(Debug)]
        struct Unconvertible;
        let probe = ScriptedProvider::silent("probe");
        let calls = probe.calls.clone();
        let resolver = Resolver::builder().with_provider(probe).build().unwrap();

        let err = resolver
            .get_as::<Unconvertible>(&Coordinates::new(), "key", None)
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoSuchConverter { .. }));
        // One consultation happened at bootstrap for the coordinate
        // acquisition; the failed typed lookup added none.
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn selected_value_without_payload_is_not_defaulted() {
        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::new("present-empty", |_, name| {
                (name == "key").then(|| ConfigValue::new("present-empty", None, "key", None))
            }))
            .build()
            .unwrap();

        // A value was selected, so the default stays unused even though
        // the payload is empty.
        let value = resolver.get_at(&Coordinates::new(), "key", Some("fallback"));
        assert_eq!(value.unwrap(), None);
    }

    #[test]
    fn explicit_converter_bypasses_registry() {
        struct Shouting;
        impl Convert for Shouting {
            type Output = String;
            fn convert(&self, raw: Option<&str>) -> Result<Option<String>, ConversionError> {
                Ok(raw.map(str::to_uppercase))
            }
        }

        let resolver = Resolver::builder()
            .with_provider(ScriptedProvider::fixed("base", None, "key", "quiet"))
            .build()
            .unwrap();

        let value = resolver
            .resolve_with(None, "key", &Shouting, None)
            .unwrap();
        assert_eq!(value.as_deref(), Some("QUIET"));

        // The registry still serves the stock conversion.
        let value = resolver
            .resolve_with(None, "key", &FromStrConverter::<String>::new(), None)
            .unwrap();
        assert_eq!(value.as_deref(), Some("quiet"));
    }
}
