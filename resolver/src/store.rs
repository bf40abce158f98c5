//! Store adapter capability interface.

use async_trait::async_trait;
use errors::StoreError;

/// Result of a write that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The store persisted the value.
    Written,
    /// The store does not accept this write.
    Unsupported,
}

/// A named backend that supplies, and optionally accepts, raw configuration
/// values.
///
/// Raw values are text; structured backends flatten their values before
/// handing them to the resolver. `read` and `write` may block on IO for as
/// long as the backend needs; the resolver imposes no timeout of its own.
#[async_trait]
pub trait Store: Send + Sync {
    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this store accepts writes at all.
    ///
    /// Queried once when the store is added to a resolver. Read-only stores
    /// are never asked to write.
    fn supports_write(&self) -> bool {
        false
    }

    /// Look up `key`. `Ok(None)` means the store does not hold the key.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Persist `raw` under `key`.
    async fn write(&self, _key: &str, _raw: &str) -> Result<WriteStatus, StoreError> {
        Ok(WriteStatus::Unsupported)
    }
}

#[async_trait]
impl<S> Store for std::sync::Arc<S>
where
    S: Store + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports_write(&self) -> bool {
        (**self).supports_write()
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, raw: &str) -> Result<WriteStatus, StoreError> {
        (**self).write(key, raw).await
    }
}
