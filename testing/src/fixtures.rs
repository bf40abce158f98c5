use async_trait::async_trait;
use dashmap::DashMap;
use errors::StoreError;
use parking_lot::{Mutex, RwLock};
use resolver::{DiagnosticSink, Store, StoreInteraction, WriteStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted answer to a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    Present(String),
    Absent,
    Fail(String),
}

/// How a [`MockStore`] answers writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Declares itself read-only; the resolver never calls `write`.
    ReadOnly,
    /// Accepts writes and serves them on later reads.
    Accept,
    /// Declares write support but answers `Unsupported`.
    Unsupported,
    /// Declares write support but fails every write.
    Fail,
}

/// Store with scripted reads and writes, counting every call.
pub struct MockStore {
    name: String,
    responses: RwLock<HashMap<String, MockRead>>,
    fail_all_reads: RwLock<Option<String>>,
    write_mode: WriteMode,
    latency: Option<Duration>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    reads_by_key: DashMap<String, usize>,
    written: Mutex<Vec<(String, String)>>,
}

impl MockStore {
    /// An empty read-only store.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: RwLock::new(HashMap::new()),
            fail_all_reads: RwLock::new(None),
            write_mode: WriteMode::ReadOnly,
            latency: None,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            reads_by_key: DashMap::new(),
            written: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_value(self, key: &str, raw: &str) -> Self {
        self.set_value(key, raw);
        self
    }

    /// Make reads of `key` fail.
    #[must_use]
    pub fn failing(self, key: &str, reason: &str) -> Self {
        self.responses
            .write()
            .insert(key.to_string(), MockRead::Fail(reason.to_string()));
        self
    }

    /// Make every read fail.
    #[must_use]
    pub fn unavailable(self, reason: &str) -> Self {
        *self.fail_all_reads.write() = Some(reason.to_string());
        self
    }

    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    #[must_use]
    pub fn writable(self) -> Self {
        self.with_write_mode(WriteMode::Accept)
    }

    /// Delay every call, to widen race windows in concurrency tests.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Change what the store holds, bypassing the resolver.
    pub fn set_value(&self, key: &str, raw: &str) {
        self.responses
            .write()
            .insert(key.to_string(), MockRead::Present(raw.to_string()));
    }

    pub fn remove_value(&self, key: &str) {
        self.responses.write().remove(key);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reads_of(&self, key: &str) -> usize {
        self.reads_by_key.get(key).map(|count| *count).unwrap_or(0)
    }

    /// Calls to `write`, whatever their outcome.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Accepted writes, oldest first.
    pub fn written(&self) -> Vec<(String, String)> {
        self.written.lock().clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Store for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_write(&self) -> bool {
        self.write_mode != WriteMode::ReadOnly
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self.reads_by_key.entry(key.to_string()).or_insert(0) += 1;
        self.simulate_latency().await;

        if let Some(reason) = self.fail_all_reads.read().clone() {
            return Err(StoreError::unavailable(&self.name, reason));
        }

        let response = self.responses.read().get(key).cloned();
        match response {
            Some(MockRead::Present(raw)) => Ok(Some(raw)),
            Some(MockRead::Fail(reason)) => Err(StoreError::unavailable(&self.name, reason)),
            Some(MockRead::Absent) | None => Ok(None),
        }
    }

    async fn write(&self, key: &str, raw: &str) -> Result<WriteStatus, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        match self.write_mode {
            WriteMode::Accept => {
                self.set_value(key, raw);
                self.written.lock().push((key.to_string(), raw.to_string()));
                tracing::debug!("MockStore {} accepted {} = {}", self.name, key, raw);
                Ok(WriteStatus::Written)
            }
            WriteMode::Unsupported | WriteMode::ReadOnly => Ok(WriteStatus::Unsupported),
            WriteMode::Fail => Err(StoreError::unavailable(&self.name, "write rejected")),
        }
    }
}

/// Diagnostic sink keeping every interaction. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<StoreInteraction>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreInteraction> {
        self.events.lock().clone()
    }

    pub fn failures(&self) -> Vec<StoreInteraction> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.outcome.is_failure())
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn record(&self, interaction: &StoreInteraction) {
        self.events.lock().push(interaction.clone());
    }
}
