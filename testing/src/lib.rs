//! Shared test tooling for the resolver workspace.
//!
//! Provides:
//! - `MockStore`: a scriptable store that counts every call
//! - `RecordingDiagnostics`: a diagnostic sink that keeps every interaction
//! - `unique_id`: collision-free names for tests sharing process state

mod fixtures;

pub use fixtures::*;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}
