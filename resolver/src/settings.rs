//! # Resolver Settings
//!
//! Engine-wide settings, loadable from a settings file section or from the
//! environment (12-factor style).
//!
//! # Environment Variables
//! - `CONFIG_RESOLVER_CACHE_TIMEOUT_MS`: cache timeout in milliseconds
//!   (default: 30000, `0` disables caching)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

pub const CACHE_TIMEOUT_ENV: &str = "CONFIG_RESOLVER_CACHE_TIMEOUT_MS";

const DEFAULT_CACHE_TIMEOUT_MS: u64 = 30_000;

/// Global defaults applied to every resolver built from them.
///
/// A builder may still override the cache timeout for its own container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub cache_timeout_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            cache_timeout_ms: DEFAULT_CACHE_TIMEOUT_MS,
        }
    }
}

impl ResolverSettings {
    /// Settings from the environment, falling back to defaults for missing
    /// or unparsable variables.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(raw) = env::var(CACHE_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => settings.cache_timeout_ms = ms,
                Err(e) => warn!(
                    variable = CACHE_TIMEOUT_ENV,
                    value = %raw,
                    "Ignoring invalid cache timeout: {}",
                    e
                ),
            }
        }

        settings
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_timeout() {
        let settings = ResolverSettings::default();
        assert_eq!(settings.cache_timeout(), Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_from_env_override() {
        unsafe {
            env::set_var(CACHE_TIMEOUT_ENV, "1500");
        }
        let settings = ResolverSettings::from_env();
        unsafe {
            env::remove_var(CACHE_TIMEOUT_ENV);
        }

        assert_eq!(settings.cache_timeout(), Duration::from_millis(1500));
    }

    #[test]
    #[serial]
    fn test_from_env_zero_disables_cache() {
        unsafe {
            env::set_var(CACHE_TIMEOUT_ENV, "0");
        }
        let settings = ResolverSettings::from_env();
        unsafe {
            env::remove_var(CACHE_TIMEOUT_ENV);
        }

        assert!(settings.cache_timeout().is_zero());
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_falls_back() {
        unsafe {
            env::set_var(CACHE_TIMEOUT_ENV, "soon");
        }
        let settings = ResolverSettings::from_env();
        unsafe {
            env::remove_var(CACHE_TIMEOUT_ENV);
        }

        assert_eq!(settings, ResolverSettings::default());
    }

    #[test]
    #[serial]
    fn test_from_env_missing() {
        unsafe {
            env::remove_var(CACHE_TIMEOUT_ENV);
        }
        assert_eq!(ResolverSettings::from_env(), ResolverSettings::default());
    }

    #[test]
    fn test_deserialize_settings_section() {
        let settings: ResolverSettings = toml::from_str("cache_timeout_ms = 250").unwrap();
        assert_eq!(settings.cache_timeout(), Duration::from_millis(250));

        let settings: ResolverSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ResolverSettings::default());
    }
}
