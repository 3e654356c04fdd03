//! JSON-file-based storage backend.
//!
//! Stores each ledger slot in a separate JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/budget-pilot/`).

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{Slot, Storage};
use crate::error::{BudgetError, Result};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "budget-pilot";

/// File name for the expense collection.
const EXPENSES_FILE: &str = "expenses.json";
/// File name for the budget.
const BUDGET_FILE: &str = "budget.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed storage that persists each ledger slot as a JSON file.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock`: reads take a shared lock, writes an exclusive one.
/// Writes go to a temporary file that is then renamed over the target, so
/// a document is never observed half-written.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock          (cross-process lock sentinel)
///   expenses.json
///   budget.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist, and
    /// opens (or creates) the `storage.lock` sentinel file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/budget-pilot/` (typically
    /// `~/.local/share/budget-pilot/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                BudgetError::Storage("could not determine platform data directory".into())
            })
    }

    /// Returns the full path of the file backing `slot`.
    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(file_name(slot))
    }

    /// Acquires the in-process mutex and a shared file lock, runs `op`,
    /// then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires the in-process mutex and an exclusive file lock, runs
    /// `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads a slot file. Returns `None` if the file does not exist.
    fn read_file(&self, slot: Slot) -> Result<Option<String>> {
        match fs::read_to_string(self.path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes a slot file (write-to-tmp then rename).
    fn write_file(&self, slot: Slot, contents: &str) -> Result<()> {
        let path = self.path(slot);
        let tmp_path = self.dir.join(format!("{}.tmp", file_name(slot)));
        fs::write(&tmp_path, contents).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        tracing::trace!(path = %path.display(), bytes = contents.len(), "wrote slot file");
        Ok(())
    }
}

impl Storage for FileStorage {
    #[inline]
    fn read(&self, slot: Slot) -> Result<Option<String>> {
        self.with_shared_lock(|| self.read_file(slot))
    }

    #[inline]
    fn write(&self, slot: Slot, contents: &str) -> Result<()> {
        self.with_exclusive_lock(|| self.write_file(slot, contents))
    }
}

/// Maps a slot to its file name.
const fn file_name(slot: Slot) -> &'static str {
    match slot {
        Slot::Expenses => EXPENSES_FILE,
        Slot::Budget => BUDGET_FILE,
    }
}

/// Wraps an I/O error into a [`BudgetError::Storage`].
fn storage_io_error(err: std::io::Error) -> BudgetError {
    BudgetError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`BudgetError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> BudgetError {
    BudgetError::Storage(err.to_string().into())
}
