//! String-to-typed-value conversion.
//!
//! Every value a provider hands back is a raw string (or nothing). A
//! [`Convert`] implementation turns that raw string into a typed value;
//! the registry keys type-erased converters by the `TypeId` of their
//! output so the resolver can dispatch on the requested type.
//!
//! # Registration semantics
//!
//! At most one converter per output type. The first registration wins;
//! later duplicates are dropped with a debug log. The builder appends the
//! built-in defaults after explicit registrations, so user converters
//! shadow them.

use crate::{ConversionError, Coordinates};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Converts an optional raw string into a typed value.
///
/// `None` input means the request produced no raw string (no value was
/// selected and no default was given, or the selected value carried no
/// payload); built-in converters map it to `Ok(None)`.
pub trait Convert {
    /// The conversion target.
    type Output: 'static;

    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when the raw string cannot be
    /// converted.
    fn convert(&self, raw: Option<&str>) -> Result<Option<Self::Output>, ConversionError>;
}

/// Opaque, equality-comparable identity of a conversion target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// The token for type `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human-readable name of the type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe form of [`Convert`], produced by a blanket impl.
///
/// The registry stores these; the resolver downcasts the boxed output back
/// to the requested type.
pub trait ErasedConvert: Send + Sync {
    /// Token of the conversion target.
    fn token(&self) -> TypeToken;

    /// Converts and boxes the output.
    fn convert_erased(&self, raw: Option<&str>) -> Result<Option<Box<dyn Any>>, ConversionError>;
}

impl<C> ErasedConvert for C
where
    C: Convert + Send + Sync,
{
    fn token(&self) -> TypeToken {
        TypeToken::of::<C::Output>()
    }

    fn convert_erased(&self, raw: Option<&str>) -> Result<Option<Box<dyn Any>>, ConversionError> {
        Ok(self
            .convert(raw)?
            .map(|value| Box::new(value) as Box<dyn Any>))
    }
}

/// Registry of type-erased converters, keyed by output type.
///
/// Immutable once the resolver is built.
#[derive(Default)]
pub(crate) struct ConverterRegistry {
    converters: HashMap<TypeId, Box<dyn ErasedConvert>>,
}

impl ConverterRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a converter; first registration per type wins.
    ///
    /// Returns `false` (and keeps the existing converter) on duplicate.
    pub(crate) fn register(&mut self, converter: Box<dyn ErasedConvert>) -> bool {
        let token = converter.token();
        if self.converters.contains_key(&token.id) {
            debug!(target_type = %token, "duplicate converter registration dropped");
            return false;
        }
        self.converters.insert(token.id, converter);
        true
    }

    pub(crate) fn contains<T: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    /// Converts `raw` to `T` via the registered converter.
    pub(crate) fn convert_to<T: 'static>(
        &self,
        raw: Option<&str>,
    ) -> Result<Option<T>, crate::ResolveError> {
        let converter = self
            .converters
            .get(&TypeId::of::<T>())
            .ok_or_else(crate::ResolveError::no_such_converter::<T>)?;
        match converter.convert_erased(raw)? {
            None => Ok(None),
            Some(boxed) => boxed.downcast::<T>().map(|value| Some(*value)).map_err(|_| {
                ConversionError::new(format!(
                    "converter registered for {} produced a value of a different type",
                    std::any::type_name::<T>()
                ))
                .into()
            }),
        }
    }

    /// Tokens of all registered conversion targets, sorted by name.
    pub(crate) fn tokens(&self) -> Vec<TypeToken> {
        let mut tokens: Vec<TypeToken> = self.converters.values().map(|c| c.token()).collect();
        tokens.sort_by_key(TypeToken::name);
        tokens
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.tokens())
            .finish()
    }
}

// ── Built-in converters ────────────────────────────────────────────────

/// Identity conversion to `String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Convert for StringConverter {
    type Output = String;

    fn convert(&self, raw: Option<&str>) -> Result<Option<String>, ConversionError> {
        Ok(raw.map(str::to_string))
    }
}

/// Conversion through [`FromStr`], with the input trimmed first.
///
/// Covers booleans, integers, and floats in the default registry.
#[derive(Debug)]
pub struct FromStrConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    /// Creates a converter targeting `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Convert for FromStrConverter<T>
where
    T: FromStr + 'static,
    T::Err: fmt::Display,
{
    type Output = T;

    fn convert(&self, raw: Option<&str>) -> Result<Option<T>, ConversionError> {
        raw.map(|s| {
            s.trim()
                .parse::<T>()
                .map_err(|e| ConversionError::parse(s, std::any::type_name::<T>(), e))
        })
        .transpose()
    }
}

/// Conversion to [`PathBuf`]. Never fails on non-empty input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathConverter;

impl Convert for PathConverter {
    type Output = PathBuf;

    fn convert(&self, raw: Option<&str>) -> Result<Option<PathBuf>, ConversionError> {
        Ok(raw.map(PathBuf::from))
    }
}

/// Conversion to `Vec<String>`: comma-separated, entries trimmed, empty
/// entries dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringListConverter;

impl Convert for StringListConverter {
    type Output = Vec<String>;

    fn convert(&self, raw: Option<&str>) -> Result<Option<Vec<String>>, ConversionError> {
        Ok(raw.map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        }))
    }
}

/// Conversion to [`Duration`].
///
/// Accepts an integer with an optional `ms`, `s`, `m`, or `h` suffix;
/// a bare integer means seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationConverter;

impl Convert for DurationConverter {
    type Output = Duration;

    fn convert(&self, raw: Option<&str>) -> Result<Option<Duration>, ConversionError> {
        raw.map(|s| parse_duration(s.trim()).ok_or_else(|| {
            ConversionError::parse(s, "Duration", "expected <int>[ms|s|m|h]")
        }))
        .transpose()
    }
}

fn parse_duration(s: &str) -> Option<Duration> {
    let (digits, unit): (&str, fn(u64) -> Duration) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, Duration::from_millis)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, Duration::from_secs)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, |n| Duration::from_secs(n * 60))
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, |n| Duration::from_secs(n * 3600))
    } else {
        (s, Duration::from_secs)
    };
    digits.trim().parse::<u64>().ok().map(unit)
}

/// Conversion to [`Coordinates`] via the `{k=v,…}` syntax.
///
/// This is the canonical converter for the reserved
/// `configurationCoordinates` property.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinatesConverter;

impl Convert for CoordinatesConverter {
    type Output = Coordinates;

    fn convert(&self, raw: Option<&str>) -> Result<Option<Coordinates>, ConversionError> {
        raw.map(|s| Coordinates::parse(s).map_err(|e| ConversionError::new(e.to_string())))
            .transpose()
    }
}

/// Conversion to `HashMap<String, String>` via the `{k=v,…}` syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMapConverter;

impl Convert for StringMapConverter {
    type Output = HashMap<String, String>;

    fn convert(
        &self,
        raw: Option<&str>,
    ) -> Result<Option<HashMap<String, String>>, ConversionError> {
        raw.map(|s| {
            Coordinates::parse(s)
                .map(|coords| coords.into_iter().collect())
                .map_err(|e| ConversionError::new(e.to_string()))
        })
        .transpose()
    }
}

/// The default converter set, appended by the builder after explicit
/// registrations.
pub(crate) fn default_converters() -> Vec<Box<dyn ErasedConvert>> {
    vec![
        Box::new(StringConverter),
        Box::new(FromStrConverter::<bool>::new()),
        Box::new(FromStrConverter::<i32>::new()),
        Box::new(FromStrConverter::<i64>::new()),
        Box::new(FromStrConverter::<u32>::new()),
        Box::new(FromStrConverter::<u64>::new()),
        Box::new(FromStrConverter::<usize>::new()),
        Box::new(FromStrConverter::<f64>::new()),
        Box::new(PathConverter),
        Box::new(StringListConverter),
        Box::new(DurationConverter),
        Box::new(CoordinatesConverter),
        Box::new(StringMapConverter),
    ]
}
