use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use toml::map::Entry;
use toml::{Table, Value};

/// Provides a layered builder for deserializing configuration files.
#[must_use]
pub struct Builder {
    table: Result<Table>,
}

impl Builder {
    /// Creates a new empty builder.
    pub fn new() -> Self {
        Self {
            table: Ok(Table::new()),
        }
    }

    /// Adds a layer of configuration.
    ///
    /// Layers added later take precedence over earlier ones.
    pub fn add_layer<L: Layer>(mut self, source: L) -> Self {
        self.table = self.table.and_then(|mut t| {
            source.extend_table(&mut t)?;
            Ok(t)
        });
        self
    }

    /// Deserializes the configuration from the provided layers.
    pub fn build<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.table.and_then(deserialize_table)
    }
}

/// A configuration layer.
pub trait Layer {
    /// Extends a TOML table by this layer.
    fn extend_table(&self, table: &mut Table) -> Result<()>;
}

impl<L: Layer> Layer for Option<L> {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        match self {
            Some(layer) => layer.extend_table(table),
            None => Ok(()),
        }
    }
}

/// A TOML file configuration layer.
#[must_use]
pub struct File {
    path: PathBuf,
    required: bool,
}

impl File {
    /// Creates a new layer, loading TOML from the file at the given path.
    ///
    /// The file is required by default.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required: true,
        }
    }

    /// Sets whether the file is required.
    ///
    /// If it is not required and does not exist, this layer is treated as
    /// empty. If it is required and does not exist, an error is raised.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A TOML text configuration layer.
#[must_use]
pub struct TomlText<'a> {
    text: &'a str,
}

impl<'a> TomlText<'a> {
    /// Creates a new layer, parsing the text as TOML.
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

/// An environment variable configuration layer.
///
/// This loads every environment variable whose name starts with the prefix.
/// The prefix is removed and the rest of the name is lowercased. Nested
/// values can be specified by using `__` (two underscores) as a separator,
/// (i.e. `BASE94_CODEC__WRAP` will refer to `codec.wrap`).
///
/// Values that parse as integers or booleans are inserted as such, everything
/// else is treated as a string. Values that are not fully valid UTF-8 may be
/// converted to UTF-8 with a lossy conversion.
#[must_use]
pub struct Env {
    prefix: &'static str,
}

impl Env {
    /// Creates a new layer for variables starting with `prefix`.
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    fn extend_table_from<I>(&self, table: &mut Table, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(key) = key.strip_prefix(self.prefix) else {
                continue;
            };

            let key = key.to_ascii_lowercase();
            let segments = key.split("__").collect::<SmallVec<[&str; 8]>>();

            // wrap the value in one table per segment, innermost last
            let nested = segments.iter().rev().fold(env_value(value), |inner, &segment| {
                Value::Table([(segment.to_owned(), inner)].into_iter().collect())
            });

            if let Value::Table(nested) = nested {
                merge_tables(table, nested);
            }
        }
    }
}

impl Layer for File {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        let file = match fs::read_to_string(&self.path) {
            Ok(content) => deserialize_str_to_table(&content)
                .with_context(|| format!("failed to load config {:?}", self.path))?,
            Err(why) => {
                // on error, we definitely return and don't merge tables
                if !self.required && why.kind() == io::ErrorKind::NotFound {
                    return Ok(());
                }

                return Err(why).context(format!("cannot read required config {:?}", self.path));
            },
        };

        merge_tables(table, file);
        Ok(())
    }
}

impl Layer for TomlText<'_> {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        let toml = deserialize_str_to_table(self.text).context("toml str literal invalid")?;
        merge_tables(table, toml);
        Ok(())
    }
}

impl Layer for Env {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        // non-utf8 keys cannot possibly refer to anything that serde or toml allows as
        // keys so they can just be excluded. values use lossy conversion so that at
        // least the error gets seen.
        let vars = env::vars_os().filter_map(|(key, value)| {
            let key = key.into_string().ok()?;
            let value = value
                .into_string()
                .unwrap_or_else(|o| o.to_string_lossy().into_owned());
            Some((key, value))
        });

        self.extend_table_from(table, vars);
        Ok(())
    }
}

fn env_value(value: String) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        Value::Integer(int)
    } else if let Ok(flag) = value.parse::<bool>() {
        Value::Boolean(flag)
    } else {
        Value::String(value)
    }
}

fn deserialize_str_to_table(text: &str) -> Result<Table> {
    toml::from_str(text).context("config toml is invalid")
}

fn deserialize_table<T>(table: Table) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(table).context("cannot deserialize config")
}

fn merge_tables(target: &mut Table, consume: Table) {
    for (key, value) in consume {
        match target.entry(key) {
            Entry::Vacant(entry) => _ = entry.insert(value),
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (Value::Table(a), Value::Table(b)) => merge_tables(a, b),
                (a, b) => *a = b,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(text: &str) -> Table {
        deserialize_str_to_table(text).expect("test toml must be valid")
    }

    #[test]
    fn later_layers_win() {
        let merged: Table = Builder::new()
            .add_layer(TomlText::new("[codec]\nwrap = 0\n[log.root]\nlevel = \"warn\"\n"))
            .add_layer(TomlText::new("[codec]\nwrap = 76\n"))
            .build()
            .expect("layers must merge");

        assert_eq!(merged, table("[codec]\nwrap = 76\n[log.root]\nlevel = \"warn\"\n"));
    }

    #[test]
    fn missing_optional_file_is_empty() {
        let merged: Table = Builder::new()
            .add_layer(TomlText::new("a = 1\n"))
            .add_layer(File::new("this/file/does/not/exist.toml").required(false))
            .build()
            .expect("optional file may be missing");

        assert_eq!(merged, table("a = 1\n"));
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Builder::new()
            .add_layer(File::new("this/file/does/not/exist.toml"))
            .build::<Table>();

        let err = result.expect_err("required file must exist");
        assert!(format!("{err:#}").contains("cannot read required config"), "unexpected error: {err:#}");
    }

    #[test]
    fn env_vars_nest_and_type() {
        let vars = [
            ("BASE94_CODEC__WRAP", "76"),
            ("BASE94_LOG__ROOT__LEVEL", "debug"),
            ("BASE94_FLAG", "true"),
            ("PATH", "/usr/bin"),
        ]
        .map(|(k, v)| (k.to_owned(), v.to_owned()));

        let mut merged = table("[codec]\nwrap = 0\nalphabet = \"x\"\n");
        Env::new("BASE94_").extend_table_from(&mut merged, vars);

        assert_eq!(
            merged,
            table("flag = true\n[codec]\nwrap = 76\nalphabet = \"x\"\n[log.root]\nlevel = \"debug\"\n")
        );
    }

    #[test]
    fn env_vars_keep_sibling_keys() {
        let vars = [("BASE94_LOG__ROOT__LEVEL".to_owned(), "info".to_owned())];

        let mut merged = table("[log.root]\nlevel = \"warn\"\nappenders = [\"stderr\"]\n");
        Env::new("BASE94_").extend_table_from(&mut merged, vars);

        assert_eq!(merged, table("[log.root]\nlevel = \"info\"\nappenders = [\"stderr\"]\n"));
    }
}
