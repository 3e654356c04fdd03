//! Pluggable key-value storage backends for the persisted ledger.
//!
//! The ledger is persisted as two independent JSON documents, one per
//! [`Slot`]. Backends store and return the raw document text; encoding and
//! the fallback to seed values live in [`crate::ledger`].

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use crate::error::Result;

/// One independently persisted ledger document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The expense collection (JSON array).
    Expenses,
    /// The budget configuration (JSON object).
    Budget,
}

impl Slot {
    /// Returns the storage key, shared with the browser ledger's
    /// `localStorage` keys.
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Expenses => "budgetpilot_expenses",
            Self::Budget => "budgetpilot_budget",
        }
    }
}

/// Storage backend for persisted ledger documents.
///
/// All methods take `&self`; implementations use interior mutability
/// (e.g. `Mutex`) for thread-safe mutation. A write replaces the whole
/// document for its slot.
pub trait Storage: core::fmt::Debug + Send + Sync {
    /// Returns the stored document for `slot`.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn read(&self, slot: Slot) -> Result<Option<String>>;

    /// Replaces the stored document for `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn write(&self, slot: Slot, contents: &str) -> Result<()>;
}
