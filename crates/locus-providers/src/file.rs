//! TOML-file-backed provider.

use crate::{FileProviderError, MapProvider};
use locus_core::{ConfigValue, Coordinates, Provider, ProviderError, Resolver};
use std::path::Path;
use tracing::debug;

/// Serves the entries of a TOML file at fixed coordinates.
///
/// The file is read once, at construction; there is no reload. Nested
/// tables flatten to dotted property names (`[db] url = "…"` becomes
/// `db.url`), scalars render with their natural string form, and arrays
/// of scalars join with commas (ready for the stock `Vec<String>`
/// converter).
///
/// # Example
///
/// ```no_run
/// use locus_providers::TomlFileProvider;
/// use locus_core::{Coordinates, Resolver};
///
/// let provider = TomlFileProvider::load(
///     "conf/test.toml",
///     Some(Coordinates::from([("environment", "test")])),
/// )?;
/// let resolver = Resolver::builder().with_provider(provider).build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TomlFileProvider {
    inner: MapProvider,
}

impl TomlFileProvider {
    /// Reads `path` and builds the provider, using the file name as id.
    ///
    /// # Errors
    ///
    /// Returns [`FileProviderError`] when the file cannot be read or
    /// parsed.
    pub fn load(
        path: impl AsRef<Path>,
        coordinates: Option<Coordinates>,
    ) -> Result<Self, FileProviderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| FileProviderError::read_file(path, e))?;
        let table: toml::Table =
            content.parse().map_err(|e| FileProviderError::parse_toml(path, e))?;

        let id = format!("file:{}", path.display());
        let mut entries = Vec::new();
        flatten_table(&table, None, &mut entries);
        debug!(path = %path.display(), entries = entries.len(), "configuration file loaded");

        Ok(Self {
            inner: MapProvider::new(id, coordinates).with_entries(entries),
        })
    }

    /// Names of all entries loaded from the file.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.names()
    }
}

impl Provider for TomlFileProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn lookup(
        &self,
        resolver: &Resolver,
        caller: &Coordinates,
        name: &str,
    ) -> Result<Option<ConfigValue>, ProviderError> {
        self.inner.lookup(resolver, caller, name)
    }
}

fn flatten_table(table: &toml::Table, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_table(nested, Some(&name), out),
            other => {
                if let Some(rendered) = render_scalar(other) {
                    out.push((name, rendered));
                }
            }
        }
    }
}

fn render_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(dt) => Some(dt.to_string()),
        toml::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().filter_map(render_scalar).collect();
            Some(rendered.join(","))
        }
        // Tables are handled by the caller; arrays of tables have no
        // property-name rendition and are skipped.
        toml::Value::Table(_) => None,
    }
}
