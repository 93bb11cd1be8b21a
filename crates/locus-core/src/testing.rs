//! Test doubles for resolver composition.
//!
//! Scripted providers, arbiters, and a recording sink for exercising the
//! resolution algorithm without real configuration sources. Call counts
//! are shared `Arc<AtomicUsize>` handles so tests can keep observing them
//! after the double has moved into a resolver.
//!
//! # Example
//!
//! ```
//! use locus_core::testing::ScriptedProvider;
//! use locus_core::{Coordinates, Resolver};
//! use std::sync::atomic::Ordering;
//!
//! let provider = ScriptedProvider::fixed("fixture", None, "greeting", "hello");
//! let calls = provider.calls.clone();
//!
//! let resolver = Resolver::builder().with_provider(provider).build().unwrap();
//! assert_eq!(resolver.get("greeting").unwrap().as_deref(), Some("hello"));
//! // One consultation at bootstrap (coordinate acquisition), one now.
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! ```

use crate::{
    Arbiter, ArbiterError, ConfigValue, Coordinates, MalformedError, MalformedValueSink, Provider,
    ProviderError, Resolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Script = Box<dyn Fn(&Coordinates, &str) -> Option<ConfigValue> + Send + Sync>;

/// Provider whose answers come from a closure.
pub struct ScriptedProvider {
    id: String,
    /// Number of lookups received (including bootstrap's coordinate
    /// acquisition).
    pub calls: Arc<AtomicUsize>,
    script: Script,
}

impl ScriptedProvider {
    /// Creates a provider backed by `script`.
    pub fn new(
        id: impl Into<String>,
        script: impl Fn(&Coordinates, &str) -> Option<ConfigValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            script: Box::new(script),
        }
    }

    /// A provider that never answers.
    pub fn silent(id: impl Into<String>) -> Self {
        Self::new(id, |_, _| None)
    }

    /// A provider answering exactly one property at fixed coordinates.
    pub fn fixed(
        id: impl Into<String>,
        coordinates: Option<Coordinates>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let source = id.clone();
        let name = name.into();
        let value = value.into();
        Self::new(id, move |_, requested| {
            (requested == name).then(|| {
                ConfigValue::new(
                    source.clone(),
                    coordinates.clone(),
                    name.clone(),
                    Some(value.clone()),
                )
            })
        })
    }

    /// Like [`fixed`](Self::fixed), but the value claims authority.
    pub fn authoritative(
        id: impl Into<String>,
        coordinates: Option<Coordinates>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let source = id.clone();
        let name = name.into();
        let value = value.into();
        Self::new(id, move |_, requested| {
            (requested == name).then(|| {
                ConfigValue::new(
                    source.clone(),
                    coordinates.clone(),
                    name.clone(),
                    Some(value.clone()),
                )
                .with_authority()
            })
        })
    }
}

impl Provider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        _resolver: &Resolver,
        caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(caller, name))
    }
}

/// Provider that always fails.
pub struct FailingProvider {
    id: String,
}

impl FailingProvider {
    /// Creates a provider that fails every lookup.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Provider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        _resolver: &Resolver,
        _caller: &Coordinates,
        _name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        Err(ProviderError::new("scripted failure"))
    }
}

/// Provider that answers one property by resolving another through the
/// resolver it is handed — exercises nested queries and the reentrancy
/// guard.
///
/// Answers `answers` by reading `reads` at the caller's coordinates and
/// prefixing the result with `derived:`. Pointing `reads` at `answers`
/// makes the provider self-recursive; the guard turns that into a clean
/// "no answer".
pub struct NestedLookupProvider {
    id: String,
    answers: String,
    reads: String,
}

impl NestedLookupProvider {
    /// Creates a provider answering `answers` by resolving `reads`.
    pub fn new(
        id: impl Into<String>,
        answers: impl Into<String>,
        reads: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            answers: answers.into(),
            reads: reads.into(),
        }
    }
}

impl Provider for NestedLookupProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(
        &self,
        resolver: &Resolver,
        caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        if name != self.answers {
            return Ok(None);
        }
        let nested = resolver
            .get_at(caller, &self.reads, None)
            .map_err(|e| ProviderError::with_source("nested lookup failed", e))?;
        Ok(nested.map(|inner| {
            ConfigValue::new(
                self.id.clone(),
                None,
                name,
                Some(format!("derived:{inner}")),
            )
        }))
    }
}

/// Arbiter with a fixed strategy.
pub struct ScriptedArbiter {
    id: String,
    /// Number of arbitrations received.
    pub calls: Arc<AtomicUsize>,
    behavior: ArbiterBehavior,
}

enum ArbiterBehavior {
    Defer,
    PickFirst,
    PickSource(String),
    Fail,
}

impl ScriptedArbiter {
    fn with_behavior(id: impl Into<String>, behavior: ArbiterBehavior) -> Self {
        Self {
            id: id.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            behavior,
        }
    }

    /// Always defers to the next arbiter.
    pub fn deferring(id: impl Into<String>) -> Self {
        Self::with_behavior(id, ArbiterBehavior::Defer)
    }

    /// Picks the first tied candidate.
    pub fn pick_first(id: impl Into<String>) -> Self {
        Self::with_behavior(id, ArbiterBehavior::PickFirst)
    }

    /// Picks the candidate produced by `source`, deferring when absent.
    pub fn pick_source(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::with_behavior(id, ArbiterBehavior::PickSource(source.into()))
    }

    /// Always fails.
    pub fn failing(id: impl Into<String>) -> Self {
        Self::with_behavior(id, ArbiterBehavior::Fail)
    }
}

impl Arbiter for ScriptedArbiter {
    fn id(&self) -> &str {
        &self.id
    }

    fn arbitrate(
        &self,
        _caller: &Coordinates,
        _name: &str,
        values: &[ConfigValue],
    ) -> Result<Option<ConfigValue>, ArbiterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ArbiterBehavior::Defer => Ok(None),
            ArbiterBehavior::PickFirst => Ok(values.first().cloned()),
            ArbiterBehavior::PickSource(source) => {
                Ok(values.iter().find(|v| v.source() == source).cloned())
            }
            ArbiterBehavior::Fail => Err(ArbiterError::new("scripted failure")),
        }
    }
}

/// Sink that records every malformed value it is handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    seen: Arc<Mutex<Vec<ConfigValue>>>,
}

impl RecordingSink {
    /// Copies of everything recorded so far.
    #[must_use]
    pub fn seen(&self) -> Vec<ConfigValue> {
        self.seen.lock().expect("sink lock poisoned").clone()
    }
}

impl MalformedValueSink for RecordingSink {
    fn handle(
        &self,
        _caller: &Coordinates,
        _name: &str,
        values: Vec<ConfigValue>,
    ) -> Result<(), MalformedError> {
        self.seen.lock().expect("sink lock poisoned").extend(values);
        Ok(())
    }
}
