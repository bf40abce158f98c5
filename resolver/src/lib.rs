//! # Configuration Resolver
//!
//! Typed configuration options resolved from an ordered list of pluggable
//! stores.
//!
//! This crate provides:
//! - Option descriptors declaring a name, a type, a default and an optional
//!   custom converter
//! - Canonical conversion between raw store text and Rust types
//! - A per-option value cache with a configurable timeout
//! - The resolution engine: first present value wins on reads, first
//!   accepting store wins on writes
//! - A diagnostic callback for every store interaction
//!
//! # Usage
//! ```rust,no_run
//! use resolver::{OptionDescriptor, ResolverBuilder};
//! use std::time::Duration;
//!
//! # async fn run(env: impl resolver::Store + 'static) -> Result<(), Box<dyn std::error::Error>> {
//! let port = OptionDescriptor::<u16>::new("server.port").with_default(8080);
//!
//! let resolver = ResolverBuilder::new()
//!     .store(env)
//!     .cache_timeout(Duration::from_secs(10))
//!     .declare(&port)?
//!     .build();
//!
//! let value = resolver.get(&port).await?;
//! println!("listening on {value}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod convert;
pub mod diagnostics;
pub mod engine;
pub mod option;
pub mod settings;
pub mod store;

pub use convert::OptionValue;
pub use diagnostics::{
    DiagnosticSink, NoopDiagnostics, StoreInteraction, StoreOperation, StoreOutcome,
    TracingDiagnostics,
};
pub use engine::{Resolved, Resolver, ResolverBuilder, WriteResult};
pub use errors::{ConfigureError, ConversionError, StoreError};
pub use option::{FnConverter, OptionDescriptor, OptionInfo, OptionKind, ValueConverter};
pub use settings::ResolverSettings;
pub use store::{Store, WriteStatus};

#[doc(hidden)]
pub mod __private {
    pub use strum::{VariantArray, VariantNames};
}
