//! # Store Diagnostics
//!
//! Callback invoked on every store interaction. Not required for
//! correctness: it exists so callers can log, count and time store access,
//! including the failures the resolver absorbs.

use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Read,
    Write,
}

impl StoreOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// What a single store call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Present,
    Absent,
    Written,
    Unsupported,
    /// The store failed; the resolver moved on to the next one.
    Failed(String),
}

impl StoreOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Written => "written",
            Self::Unsupported => "unsupported",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for StoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One call from the resolver into a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInteraction {
    pub option: String,
    pub store_index: usize,
    pub store_name: String,
    pub operation: StoreOperation,
    pub outcome: StoreOutcome,
    pub elapsed: Duration,
}

/// Receiver of store interactions.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, interaction: &StoreInteraction);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&StoreInteraction) + Send + Sync,
{
    fn record(&self, interaction: &StoreInteraction) {
        self(interaction);
    }
}

/// Default sink: structured logs plus `metrics` counters and latencies.
///
/// ## Metrics
/// - `config_resolver.store.interactions` (counter), labelled by `store`,
///   `operation` and `outcome`
/// - `config_resolver.store.latency_seconds` (histogram), labelled by
///   `store` and `operation`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&self, interaction: &StoreInteraction) {
        let store = interaction.store_name.clone();
        let operation = interaction.operation.as_str();

        metrics::counter!(
            "config_resolver.store.interactions",
            "store" => store.clone(),
            "operation" => operation,
            "outcome" => interaction.outcome.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "config_resolver.store.latency_seconds",
            "store" => store,
            "operation" => operation
        )
        .record(interaction.elapsed.as_secs_f64());

        if let StoreOutcome::Failed(reason) = &interaction.outcome {
            warn!(
                option = %interaction.option,
                store = %interaction.store_name,
                store_index = interaction.store_index,
                operation,
                elapsed_ms = interaction.elapsed.as_millis() as u64,
                "Store {} failed: {}",
                operation,
                reason
            );
        } else {
            debug!(
                option = %interaction.option,
                store = %interaction.store_name,
                store_index = interaction.store_index,
                operation,
                outcome = interaction.outcome.as_str(),
                elapsed_ms = interaction.elapsed.as_millis() as u64,
                "Store interaction"
            );
        }
    }
}

/// Sink that drops every interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn record(&self, _interaction: &StoreInteraction) {}
}
