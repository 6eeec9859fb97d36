//! Lock-guarded chain handle for concurrent hosts.
//!
//! The whole chain is one resource behind one `RwLock`. Mutations (`append`,
//! `seal`) take the write lock for their full duration; verification and
//! reads take the read lock, so they never observe a half-applied append.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::chain::{Chain, IntegrityReport, SealOutcome};
use super::record::Record;
use super::snapshot::ChainSnapshot;
use crate::error::LedgerResult;

/// Cloneable handle to a single [`Chain`]. Clones share the same chain.
#[derive(Clone, Debug)]
pub struct SharedChain {
    inner: Arc<RwLock<Chain>>,
}

impl Default for SharedChain {
    fn default() -> Self {
        Self::new(Chain::new())
    }
}

impl From<Chain> for SharedChain {
    fn from(chain: Chain) -> Self {
        Self::new(chain)
    }
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    /// Append under the write lock. Returns a copy of the new record.
    pub fn append(&self, payload: Value) -> LedgerResult<Record> {
        let mut chain = self.inner.write();
        let record = chain.append(payload)?.clone();
        Ok(record)
    }

    /// Append under the write lock, committing through `commit` before the
    /// record becomes visible. See [`Chain::append_committed`].
    ///
    /// `commit` runs while the write lock is held, so commits happen in
    /// chain order and never overwrite a newer snapshot with an older one.
    pub fn append_committed<F>(&self, payload: Value, commit: F) -> LedgerResult<Record>
    where
        F: FnOnce(&ChainSnapshot) -> LedgerResult<()>,
    {
        let mut chain = self.inner.write();
        let record = chain.append_committed(payload, commit)?.clone();
        Ok(record)
    }

    /// Seal under the write lock.
    pub fn seal(&self) -> SealOutcome {
        self.inner.write().seal()
    }

    /// Seal under the write lock, committing through `commit` first. See
    /// [`Chain::seal_committed`].
    pub fn seal_committed<F>(&self, commit: F) -> LedgerResult<SealOutcome>
    where
        F: FnOnce(&ChainSnapshot) -> LedgerResult<()>,
    {
        self.inner.write().seal_committed(commit)
    }

    /// Verify under the read lock.
    pub fn verify_integrity(&self) -> IntegrityReport {
        self.inner.read().verify_integrity()
    }

    /// Copy of every record.
    pub fn records(&self) -> Vec<Record> {
        self.inner.read().records().to_vec()
    }

    pub fn get(&self, index: u64) -> Option<Record> {
        self.inner.read().get(index).cloned()
    }

    pub fn tip(&self) -> Record {
        self.inner.read().tip().clone()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        self.inner.read().snapshot()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.read().is_sealed()
    }

    /// Run `f` with shared access to the chain, for reads that need several
    /// fields from one consistent view.
    pub fn with_read<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&self.inner.read())
    }
}
