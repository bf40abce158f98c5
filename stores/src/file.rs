//! # Configuration File Store
//!
//! Serves options from a TOML, YAML or JSON file.
//!
//! Nested tables are flattened to dotted keys, so
//!
//! ```toml
//! [database.pool]
//! size = 10
//! hosts = ["a", "b"]
//! ```
//!
//! yields `database.pool.size = "10"` and `database.pool.hosts = "a,b"`.
//! Null values are treated as absent.

use async_trait::async_trait;
use errors::StoreError;
use parking_lot::RwLock;
use resolver::Store;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigFileError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or(ConfigFileError::NoExtension)?;

        match extension.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse a document and flatten it to dotted keys.
    pub fn parse(self, contents: &str) -> Result<HashMap<String, String>, ConfigFileError> {
        let document: Value = match self {
            Self::Toml => {
                let table: toml::Table = toml::from_str(contents)
                    .map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;
                from_toml(toml::Value::Table(table))
            }
            Self::Yaml => serde_yaml::from_str(contents)
                .map_err(|e| ConfigFileError::YamlParse(e.to_string()))?,
            Self::Json => serde_json::from_str(contents)
                .map_err(|e| ConfigFileError::JsonParse(e.to_string()))?,
        };

        let mut values = HashMap::new();
        flatten(None, &document, &mut values);
        Ok(values)
    }
}

/// Datetimes become their RFC 3339 text; non-finite floats their display form.
fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map_or_else(|| Value::String(f.to_string()), Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, child)| (key, from_toml(child)))
                .collect(),
        ),
    }
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}.{key}"),
                    None => key.clone(),
                };
                flatten(Some(&path), child, out);
            }
        }
        Value::Null => {}
        scalar_or_array => {
            if let (Some(key), Some(raw)) = (prefix, to_raw(scalar_or_array)) {
                out.insert(key.to_string(), raw);
            }
        }
    }
}

fn to_raw(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) => item.to_string(),
                    other => to_raw(other).unwrap_or_default(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Read-only store over a configuration file.
///
/// The file is parsed once on [`FileStore::open`] and again on every
/// [`FileStore::reload`]; reads are served from the parsed snapshot.
#[derive(Debug)]
pub struct FileStore {
    name: String,
    path: PathBuf,
    format: FileFormat,
    values: RwLock<Arc<HashMap<String, String>>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref().to_path_buf();
        let format = FileFormat::from_path(&path)?;
        let values = load(&path, format)?;

        info!("Loaded {} options from {:?}", values.len(), path);

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            format,
            values: RwLock::new(Arc::new(values)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Re-read the file, replacing the snapshot atomically.
    ///
    /// On failure the previous snapshot keeps being served.
    pub fn reload(&self) -> Result<usize, ConfigFileError> {
        match load(&self.path, self.format) {
            Ok(values) => {
                let count = values.len();
                *self.values.write() = Arc::new(values);
                info!("Reloaded {} options from {:?}", count, self.path);
                Ok(count)
            }
            Err(e) => {
                warn!("Keeping previous snapshot of {:?}: {}", self.path, e);
                Err(e)
            }
        }
    }

    /// Keys of the current snapshot, sorted.
    pub fn keys(&self) -> Vec<String> {
        let snapshot = Arc::clone(&self.values.read());
        let mut keys: Vec<String> = snapshot.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn load(path: &Path, format: FileFormat) -> Result<HashMap<String, String>, ConfigFileError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigFileError::FileNotFound(path.display().to_string()),
        _ => ConfigFileError::Io(e),
    })?;

    format.parse(&contents)
}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }
}
