//! # Configuration Stores
//!
//! Store adapters for the configuration resolver.
//!
//! This crate provides:
//! - `MemoryStore`: writable in-process map, the usual write-back target
//! - `EnvStore`: read-only environment variables (12-factor app principles)
//! - `FileStore`: read-only TOML/YAML/JSON file flattened to dotted keys
//! - Hot reload: file watching that reloads a `FileStore` and clears the
//!   resolver cache
//!
//! # Typical Precedence
//! Add stores to the builder from highest to lowest priority:
//! 1. Environment variables
//! 2. Configuration file
//! 3. In-memory overrides (write target)

pub mod env;
pub mod file;
pub mod hot_reload;
pub mod memory;

pub use env::EnvStore;
pub use file::{ConfigFileError, FileFormat, FileStore};
pub use hot_reload::{ConfigReloadEvent, spawn_reloader, watch_config};
pub use memory::MemoryStore;
