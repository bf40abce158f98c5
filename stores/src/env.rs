//! # Environment Variable Store
//!
//! Reads options from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! Option names are upper-cased and `.`/`-` become `_`, behind an optional
//! prefix:
//! - `db.host` → `DB_HOST`
//! - `db.pool-size` with prefix `app` → `APP_DB_POOL_SIZE`

use async_trait::async_trait;
use errors::StoreError;
use resolver::Store;
use std::env::{self, VarError};

/// Read-only view of the process environment.
#[derive(Debug, Clone)]
pub struct EnvStore {
    name: String,
    prefix: Option<String>,
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvStore {
    pub fn new() -> Self {
        Self {
            name: "env".to_string(),
            prefix: None,
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            name: format!("env:{}", prefix.to_uppercase()),
            prefix: Some(normalize(prefix)),
        }
    }

    /// Environment variable consulted for `key`.
    pub fn variable_name(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, normalize(key)),
            None => normalize(key),
        }
    }
}

fn normalize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[async_trait]
impl Store for EnvStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let variable = self.variable_name(key);
        match env::var(&variable) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(StoreError::Parse {
                store: self.name.clone(),
                reason: format!("{} is not valid unicode", variable),
            }),
        }
    }
}
