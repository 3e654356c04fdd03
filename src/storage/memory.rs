//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! [`Storage`]. Ideal for unit tests and throwaway sessions where file I/O
//! is undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Slot, Storage};
use crate::error::{BudgetError, Result};

/// Thread-safe in-memory storage.
///
/// Documents live only as long as the value. A storage can be pre-filled
/// with [`InMemoryStorage::with_document`] to simulate state left behind
/// by an earlier session, including corrupt documents.
///
/// # Example
///
/// ```rust
/// use budget_pilot::ledger::LedgerStore;
/// use budget_pilot::storage::InMemoryStorage;
///
/// let store = LedgerStore::load(InMemoryStorage::new());
/// assert!(store.expenses().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Documents keyed by slot, behind a mutex for interior mutability.
    documents: Mutex<HashMap<Slot, String>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this storage with `contents` stored under `slot`.
    #[inline]
    #[must_use]
    pub fn with_document<T: Into<String>>(self, slot: Slot, contents: T) -> Self {
        let mut documents = self
            .documents
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _previous = documents.insert(slot, contents.into());
        Self {
            documents: Mutex::new(documents),
        }
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R>(&self, f: impl FnOnce(&mut HashMap<Slot, String>) -> R) -> Result<R> {
        let mut documents = self.documents.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut documents))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> BudgetError {
    BudgetError::Storage(err.to_string().into())
}

impl Storage for InMemoryStorage {
    #[inline]
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        self.with_lock(|documents| documents.get(&slot).cloned())
    }

    #[inline]
    fn write(&self, slot: Slot, contents: &str) -> Result<()> {
        self.with_lock(|documents| {
            let _previous = documents.insert(slot, contents.to_owned());
        })
    }
}
