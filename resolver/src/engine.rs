//! # Resolution Engine
//!
//! Answers `get` and `set` for declared options by combining the value
//! cache, the ordered store list and the type converter.
//!
//! # Store Order
//! Stores are consulted in the order they were added to the builder:
//! 1. Reads take the first store reporting a present value
//! 2. Writes go to the first writable store that accepts them
//!
//! Store failures never reach the caller. A failing store is treated as
//! absent on reads and skipped on writes; the failure is reported through
//! the [`DiagnosticSink`].

use crate::cache::ValueCache;
use crate::diagnostics::{
    DiagnosticSink, StoreInteraction, StoreOperation, StoreOutcome, TracingDiagnostics,
};
use crate::option::{OptionDescriptor, OptionInfo};
use crate::settings::ResolverSettings;
use crate::store::{Store, WriteStatus};
use errors::{ConfigureError, ConversionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    /// Whether a store supplied the value (as opposed to a default).
    pub found: bool,
    /// Index of the supplying store in priority order.
    pub source_index: Option<usize>,
}

/// Outcome of a write.
///
/// `applied == false` means no store accepted the value; the cache was left
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct WriteResult {
    pub applied: bool,
    pub store_index: Option<usize>,
}

impl WriteResult {
    fn applied(store_index: usize) -> Self {
        Self {
            applied: true,
            store_index: Some(store_index),
        }
    }

    fn rejected() -> Self {
        Self {
            applied: false,
            store_index: None,
        }
    }
}

struct StoreHandle {
    store: Arc<dyn Store>,
    writable: bool,
}

impl StoreHandle {
    fn name(&self) -> &str {
        self.store.name()
    }
}

/// Append-only configuration of a [`Resolver`].
///
/// ## Usage
/// ```rust,no_run
/// use resolver::{OptionDescriptor, ResolverBuilder, ResolverSettings};
///
/// # fn build(env: impl resolver::Store + 'static, file: impl resolver::Store + 'static) -> Result<(), resolver::ConfigureError> {
/// let level = OptionDescriptor::<String>::new("log.level").with_default("info".to_string());
///
/// let resolver = ResolverBuilder::from_settings(ResolverSettings::from_env())
///     .store(env)
///     .store(file)
///     .declare(&level)?
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct ResolverBuilder {
    stores: Vec<StoreHandle>,
    cache_timeout: Duration,
    diagnostics: Arc<dyn DiagnosticSink>,
    options: Vec<OptionInfo>,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self::from_settings(ResolverSettings::default())
    }

    pub fn from_settings(settings: ResolverSettings) -> Self {
        Self {
            stores: Vec::new(),
            cache_timeout: settings.cache_timeout(),
            diagnostics: Arc::new(TracingDiagnostics),
            options: Vec::new(),
        }
    }

    /// Add a store at the lowest current priority.
    pub fn store<S>(self, store: S) -> Self
    where
        S: Store + 'static,
    {
        self.shared_store(Arc::new(store))
    }

    /// Add an already shared store at the lowest current priority.
    pub fn shared_store(mut self, store: Arc<dyn Store>) -> Self {
        let writable = store.supports_write();
        debug!(
            store = store.name(),
            store_index = self.stores.len(),
            writable,
            "Store added"
        );
        self.stores.push(StoreHandle { store, writable });
        self
    }

    /// Freshness of cached values. Zero disables caching.
    pub fn cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub fn diagnostics<D>(mut self, sink: D) -> Self
    where
        D: DiagnosticSink + 'static,
    {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Register an option. Names are unique within one resolver.
    pub fn declare<T>(mut self, descriptor: &OptionDescriptor<T>) -> Result<Self, ConfigureError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let name = descriptor.name();
        if name.is_empty() {
            return Err(ConfigureError::EmptyOptionName);
        }
        if self.options.iter().any(|option| option.name == name) {
            return Err(ConfigureError::DuplicateOption {
                name: name.to_string(),
            });
        }

        self.options.push(descriptor.info());
        Ok(self)
    }

    pub fn build(self) -> Resolver {
        info!(
            stores = self.stores.len(),
            options = self.options.len(),
            cache_timeout_ms = self.cache_timeout.as_millis() as u64,
            "Configuration resolver ready"
        );

        Resolver {
            stores: self.stores,
            cache: ValueCache::new(self.cache_timeout),
            diagnostics: self.diagnostics,
            options: self.options,
        }
    }
}

/// Resolves typed options from an immutable, ordered store list.
///
/// Safe to share between tasks (`Arc<Resolver>`). Resolving or writing one
/// option never blocks another.
pub struct Resolver {
    stores: Vec<StoreHandle>,
    cache: ValueCache,
    diagnostics: Arc<dyn DiagnosticSink>,
    options: Vec<OptionInfo>,
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Current value of an option.
    ///
    /// Falls back to the declared default, then to the type's zero value,
    /// when no store holds the option. Fails only when a store supplies a
    /// value that cannot be converted.
    pub async fn get<T>(&self, descriptor: &OptionDescriptor<T>) -> Result<T, ConversionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve(descriptor).await.map(|resolved| resolved.value)
    }

    /// Like [`Resolver::get`], also reporting where the value came from.
    pub async fn resolve<T>(
        &self,
        descriptor: &OptionDescriptor<T>,
    ) -> Result<Resolved<T>, ConversionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let name = descriptor.name();
        let slot = self.cache.slot(name);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(Instant::now())) {
            if let Some(value) = cached.value::<T>() {
                trace!(option = name, "Cache hit");
                return Ok(Resolved {
                    value,
                    found: cached.source_index().is_some(),
                    source_index: cached.source_index(),
                });
            }
        }

        trace!(option = name, "Cache miss");
        let resolved = self.read_through(descriptor).await?;
        *entry = self
            .cache
            .entry(resolved.value.clone(), resolved.source_index);

        Ok(resolved)
    }

    /// Write an option to the first store that accepts it.
    ///
    /// On success the cache is updated in place, so an immediate `get`
    /// returns `value` without touching any store. When no store accepts
    /// the write the result reports `applied == false` and the cache keeps
    /// whatever it held.
    pub async fn set<T>(
        &self,
        descriptor: &OptionDescriptor<T>,
        value: T,
    ) -> Result<WriteResult, ConversionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let name = descriptor.name();
        let raw = descriptor.format(&value)?;

        let slot = self.cache.slot(name);
        let mut entry = slot.lock().await;

        for (index, handle) in self.stores.iter().enumerate() {
            if !handle.writable {
                trace!(option = name, store = handle.name(), "Skipping read-only store");
                continue;
            }

            let started = Instant::now();
            let result = handle.store.write(name, &raw).await;
            let outcome = match &result {
                Ok(WriteStatus::Written) => StoreOutcome::Written,
                Ok(WriteStatus::Unsupported) => StoreOutcome::Unsupported,
                Err(e) => StoreOutcome::Failed(e.to_string()),
            };
            self.report(name, index, handle, StoreOperation::Write, outcome, started);

            if let Ok(WriteStatus::Written) = result {
                debug!(
                    option = name,
                    store = handle.name(),
                    store_index = index,
                    "Option written"
                );
                *entry = self.cache.entry(value, Some(index));
                return Ok(WriteResult::applied(index));
            }
        }

        warn!(option = name, "No store accepted the write");
        Ok(WriteResult::rejected())
    }

    /// Drop the cached value of one option.
    pub async fn invalidate(&self, name: &str) {
        self.cache.invalidate(name).await;
    }

    /// Drop every cached value, e.g. after a backing store reloaded.
    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
        debug!("Configuration cache cleared");
    }

    pub fn cache_timeout(&self) -> Duration {
        self.cache.timeout()
    }

    /// Store names in priority order.
    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(StoreHandle::name).collect()
    }

    pub fn declared_options(&self) -> &[OptionInfo] {
        &self.options
    }

    async fn read_through<T>(
        &self,
        descriptor: &OptionDescriptor<T>,
    ) -> Result<Resolved<T>, ConversionError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let name = descriptor.name();

        for (index, handle) in self.stores.iter().enumerate() {
            let started = Instant::now();
            let result = handle.store.read(name).await;
            let outcome = match &result {
                Ok(Some(_)) => StoreOutcome::Present,
                Ok(None) => StoreOutcome::Absent,
                Err(e) => StoreOutcome::Failed(e.to_string()),
            };
            self.report(name, index, handle, StoreOperation::Read, outcome, started);

            if let Ok(Some(raw)) = result {
                debug!(
                    option = name,
                    store = handle.name(),
                    store_index = index,
                    "Option resolved"
                );
                let value = descriptor.parse(&raw)?;
                return Ok(Resolved {
                    value,
                    found: true,
                    source_index: Some(index),
                });
            }
        }

        debug!(
            option = name,
            has_default = descriptor.default_value().is_some(),
            "Option not found in any store, using fallback"
        );
        Ok(Resolved {
            value: descriptor.fallback(),
            found: false,
            source_index: None,
        })
    }

    fn report(
        &self,
        option: &str,
        store_index: usize,
        handle: &StoreHandle,
        operation: StoreOperation,
        outcome: StoreOutcome,
        started: Instant,
    ) {
        self.diagnostics.record(&StoreInteraction {
            option: option.to_string(),
            store_index,
            store_name: handle.name().to_string(),
            operation,
            outcome,
            elapsed: started.elapsed(),
        });
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("stores", &self.store_names())
            .field("cache_timeout", &self.cache.timeout())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
