//! The ledger store: in-memory ledger state backed by a [`Storage`].
//!
//! [`LedgerStore`] is the only way to mutate a ledger. Every mutation
//! computes the next state, persists it, and installs it in memory only
//! after the write succeeded, so storage always reflects the last
//! completed mutation.

use serde::de::DeserializeOwned;

use crate::error::{BudgetError, Result};
use crate::models::{Budget, BudgetUpdate, Category, Expense, ExpenseId, Ledger, NaiveDate};
use crate::storage::{Slot, Storage};

/// Composable filter for querying expenses.
///
/// Use builder-style methods to chain multiple criteria. An expense must
/// satisfy every set criterion to pass.
///
/// # Examples
///
/// ```
/// use budget_pilot::ledger::ExpenseFilter;
/// use budget_pilot::models::{Category, NaiveDate};
///
/// let filter = ExpenseFilter::new()
///     .search("rome")
///     .category(Category::Restaurants)
///     .date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     );
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Substring of the title or location (case-insensitive).
    pub search: Option<String>,
    /// Category.
    pub category: Option<Category>,
    /// Start date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// End date (inclusive).
    pub date_to: Option<NaiveDate>,
}

impl ExpenseFilter {
    /// Creates an empty filter that matches all expenses.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to expenses whose title or location contains `text`
    /// (case-insensitive).
    #[inline]
    #[must_use]
    pub fn search<T: Into<String>>(mut self, text: T) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Restricts to expenses in the given category.
    #[inline]
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts to expenses within the given date range (inclusive).
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Returns `true` if the expense satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches(&self, expense: &Expense) -> bool {
        self.matches_search(expense) && self.matches_category(expense) && self.matches_date(expense)
    }

    /// Checks the search criterion.
    fn matches_search(&self, expense: &Expense) -> bool {
        self.search.as_ref().is_none_or(|text| {
            let needle = text.to_lowercase();
            expense.title.to_lowercase().contains(&needle)
                || expense
                    .location
                    .as_ref()
                    .is_some_and(|location| location.to_lowercase().contains(&needle))
        })
    }

    /// Checks the category criterion.
    fn matches_category(&self, expense: &Expense) -> bool {
        self.category.is_none_or(|category| expense.category == category)
    }

    /// Checks the date range criteria.
    fn matches_date(&self, expense: &Expense) -> bool {
        self.date_from.is_none_or(|from| expense.date >= from)
            && self.date_to.is_none_or(|to| expense.date <= to)
    }
}

/// Ledger state container owning its storage backend.
///
/// # Example
///
/// ```rust
/// use budget_pilot::ledger::LedgerStore;
/// use budget_pilot::models::{Category, Expense, NaiveDate, Valuation};
/// use budget_pilot::storage::InMemoryStorage;
///
/// let mut store = LedgerStore::load(InMemoryStorage::new());
/// let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
/// store
///     .add_expense(Expense::new(
///         "Coffee",
///         date,
///         Category::Restaurants,
///         Valuation::Native { amount: 12.0 },
///     ))
///     .unwrap();
/// assert_eq!(store.expenses().len(), 1);
/// ```
#[derive(Debug)]
pub struct LedgerStore<S> {
    /// Persistence backend.
    storage: S,
    /// Current in-memory ledger, always equal to what was last persisted.
    ledger: Ledger,
}

impl<S: Storage> LedgerStore<S> {
    /// Loads the ledger from `storage`, falling back to an empty ledger
    /// with the default budget.
    #[inline]
    pub fn load(storage: S) -> Self {
        Self::load_with_seed(storage, Ledger::default())
    }

    /// Loads the ledger from `storage`, falling back to `seed`.
    ///
    /// The budget and the expenses are read independently: each absent,
    /// unreadable, or corrupt document is replaced by the seed's
    /// corresponding part. A stored budget with a non-positive or
    /// non-finite limit counts as corrupt. Never fails.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn load_with_seed(storage: S, seed: Ledger) -> Self {
        let budget = load_slot::<S, Budget>(&storage, Slot::Budget)
            .filter(|stored| match stored.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "stored budget is invalid, using seed");
                    false
                }
            })
            .unwrap_or(seed.budget);
        let expenses = load_slot(&storage, Slot::Expenses).unwrap_or(seed.expenses);
        tracing::debug!(
            expenses = expenses.len(),
            currency = %budget.currency,
            "ledger loaded"
        );
        Self {
            storage,
            ledger: Ledger { budget, expenses },
        }
    }

    /// Returns the whole ledger.
    #[inline]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the budget.
    #[inline]
    pub const fn budget(&self) -> &Budget {
        &self.ledger.budget
    }

    /// Returns the expenses, most recently added first.
    #[inline]
    pub fn expenses(&self) -> &[Expense] {
        &self.ledger.expenses
    }

    /// Returns the first expense with the given id.
    #[inline]
    pub fn expense(&self, id: &ExpenseId) -> Option<&Expense> {
        self.ledger.expenses.iter().find(|expense| expense.id == *id)
    }

    /// Returns the expenses matching `filter`, preserving order.
    #[inline]
    pub fn filter_expenses(&self, filter: &ExpenseFilter) -> Vec<&Expense> {
        self.ledger
            .expenses
            .iter()
            .filter(|expense| filter.matches(expense))
            .collect()
    }

    /// Returns the storage backend.
    #[inline]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Prepends an expense and persists the collection.
    ///
    /// Identifiers are not checked for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NonFiniteAmount`] if the expense amount is
    /// not finite, or an error if the collection cannot be persisted; the
    /// in-memory state is then unchanged.
    #[inline]
    pub fn add_expense(&mut self, expense: Expense) -> Result<()> {
        tracing::debug!(id = %expense.id, amount = expense.amount(), "adding expense");
        let mut next = Vec::with_capacity(self.ledger.expenses.len().saturating_add(1));
        next.push(expense);
        next.extend(self.ledger.expenses.iter().cloned());
        self.commit_expenses(next)
    }

    /// Removes the first expense with the given id and persists the
    /// collection. Removing an unknown id leaves the collection as is.
    ///
    /// Returns the removed expense, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted; the
    /// in-memory state is then unchanged.
    #[inline]
    pub fn remove_expense(&mut self, id: &ExpenseId) -> Result<Option<Expense>> {
        let mut next = self.ledger.expenses.clone();
        let removed = next
            .iter()
            .position(|expense| expense.id == *id)
            .map(|index| next.remove(index));
        if removed.is_none() {
            tracing::debug!(id = %id, "no expense to remove");
        }
        self.commit_expenses(next)?;
        Ok(removed)
    }

    /// Merges `update` into the budget and persists it.
    ///
    /// Changing the currency here does not touch expense amounts; use
    /// [`crate::rebase::change_base_currency`] to rebase them as well.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::InvalidLimit`] for a
    /// non-positive or non-finite limit, or a storage error if the budget
    /// cannot be persisted. The in-memory state is unchanged on error.
    #[inline]
    pub fn update_budget(&mut self, update: BudgetUpdate) -> Result<()> {
        update.validate()?;
        let next = self.ledger.budget.merged(update);
        let contents = serde_json::to_string(&next)?;
        self.storage.write(Slot::Budget, &contents)?;
        tracing::debug!(limit = next.total_limit, currency = %next.currency, "budget updated");
        self.ledger.budget = next;
        Ok(())
    }

    /// Replaces the whole expense collection and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NonFiniteAmount`] if any amount is not
    /// finite, or an error if the collection cannot be persisted; the
    /// in-memory state is then unchanged.
    #[inline]
    pub fn replace_all_expenses(&mut self, expenses: Vec<Expense>) -> Result<()> {
        self.commit_expenses(expenses)
    }

    /// Removes every expense and persists the empty collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted; the
    /// in-memory state is then unchanged.
    #[inline]
    pub fn reset_expenses(&mut self) -> Result<()> {
        tracing::debug!(removed = self.ledger.expenses.len(), "resetting expenses");
        self.commit_expenses(Vec::new())
    }

    /// Persists `next` and installs it as the expense collection.
    ///
    /// Refuses collections holding a non-finite amount, which JSON would
    /// store as `null` and a later load could not read back.
    fn commit_expenses(&mut self, next: Vec<Expense>) -> Result<()> {
        if let Some(expense) = next.iter().find(|expense| !expense.valuation.is_finite()) {
            return Err(BudgetError::NonFiniteAmount(expense.id.clone()));
        }
        let contents = serde_json::to_string(&next)?;
        self.storage.write(Slot::Expenses, &contents)?;
        tracing::trace!(expenses = next.len(), bytes = contents.len(), "expenses persisted");
        self.ledger.expenses = next;
        Ok(())
    }
}

/// Reads and decodes one slot, or `None` if it is absent or unusable.
fn load_slot<S: Storage, T: DeserializeOwned>(storage: &S, slot: Slot) -> Option<T> {
    match storage.read(slot) {
        Ok(Some(contents)) => match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key = slot.key(), error = %err, "stored document is corrupt, using seed");
                None
            }
        },
        Ok(None) => {
            tracing::debug!(key = slot.key(), "nothing stored, using seed");
            None
        }
        Err(err) => {
            tracing::warn!(key = slot.key(), error = %err, "failed to read stored document, using seed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Valuation};
    use crate::storage::InMemoryStorage;
    use core::sync::atomic::{AtomicBool, Ordering};

    /// Storage whose writes fail while `broken` is set.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        /// Healthy backing store.
        inner: InMemoryStorage,
        /// Whether writes currently fail.
        broken: AtomicBool,
    }

    impl Storage for FlakyStorage {
        fn read(&self, slot: Slot) -> Result<Option<String>> {
            self.inner.read(slot)
        }

        fn write(&self, slot: Slot, contents: &str) -> Result<()> {
            if self.broken.load(Ordering::Relaxed) {
                return Err(BudgetError::Storage("disk full".into()));
            }
            self.inner.write(slot, contents)
        }
    }

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn native(title: &str, amount: f64) -> Expense {
        Expense::new(title, day(1), Category::Other, Valuation::Native { amount })
    }

    fn ids<S: Storage>(store: &LedgerStore<S>) -> Vec<String> {
        store
            .expenses()
            .iter()
            .map(|expense| expense.id.as_inner().to_owned())
            .collect()
    }

    /// Reloads a fresh store from the same storage contents.
    fn reload(store: &LedgerStore<InMemoryStorage>) -> Ledger {
        let mut copy = InMemoryStorage::new();
        for slot in [Slot::Expenses, Slot::Budget] {
            if let Some(contents) = store.storage().read(slot).unwrap() {
                copy = copy.with_document(slot, contents);
            }
        }
        LedgerStore::load(copy).ledger().clone()
    }

    #[test]
    fn load_empty_storage_uses_default() {
        let store = LedgerStore::load(InMemoryStorage::new());
        assert_eq!(*store.ledger(), Ledger::default());
    }

    #[test]
    fn load_with_seed_uses_seed_when_absent() {
        let seed = Ledger::demo(day(10));
        let store = LedgerStore::load_with_seed(InMemoryStorage::new(), seed.clone());
        assert_eq!(*store.ledger(), seed);
    }

    #[test]
    fn corrupt_document_falls_back_per_slot() {
        let storage = InMemoryStorage::new()
            .with_document(Slot::Expenses, "{not json")
            .with_document(Slot::Budget, r#"{"totalLimit":900,"currency":"EUR"}"#);
        let store = LedgerStore::load_with_seed(storage, Ledger::demo(day(10)));
        assert_eq!(store.expenses().len(), 5);
        assert_eq!(store.budget().currency, Currency::Eur);
        assert!((store.budget().total_limit - 900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn corrupt_budget_keeps_stored_expenses() {
        let storage = InMemoryStorage::new()
            .with_document(Slot::Expenses, "[]")
            .with_document(Slot::Budget, "null");
        let store = LedgerStore::load_with_seed(storage, Ledger::demo(day(10)));
        assert!(store.expenses().is_empty());
        assert_eq!(*store.budget(), Budget::default());
    }

    #[test]
    fn invalid_stored_limit_falls_back_to_seed_budget() {
        for stored in [
            r#"{"totalLimit":-5,"currency":"EUR"}"#,
            r#"{"totalLimit":0,"currency":"EUR"}"#,
        ] {
            let storage = InMemoryStorage::new()
                .with_document(Slot::Expenses, "[]")
                .with_document(Slot::Budget, stored);
            let store = LedgerStore::load_with_seed(storage, Ledger::demo(day(10)));
            assert!(store.expenses().is_empty());
            assert_eq!(*store.budget(), Budget::default());
        }
    }

    #[test]
    fn add_prepends_newest_first() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store.add_expense(native("a", 1.0).with_id("a")).unwrap();
        store.add_expense(native("b", 2.0).with_id("b")).unwrap();
        store.add_expense(native("c", 3.0).with_id("c")).unwrap();
        assert_eq!(ids(&store), ["c", "b", "a"]);
    }

    #[test]
    fn add_does_not_check_duplicate_ids() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store.add_expense(native("a", 1.0).with_id("x")).unwrap();
        store.add_expense(native("b", 2.0).with_id("x")).unwrap();
        assert_eq!(store.expenses().len(), 2);
        assert_eq!(store.expense(&ExpenseId::from("x")).unwrap().title, "b");
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store.add_expense(native("a", 1.0).with_id("a")).unwrap();
        store.add_expense(native("b", 2.0).with_id("b")).unwrap();

        let removed = store.remove_expense(&ExpenseId::from("a")).unwrap();
        assert_eq!(removed.map(|expense| expense.title), Some("a".to_owned()));
        let after_first = store.ledger().clone();

        assert!(store.remove_expense(&ExpenseId::from("a")).unwrap().is_none());
        assert_eq!(*store.ledger(), after_first);
        assert_eq!(reload(&store), after_first);
    }

    #[test]
    fn remove_only_first_match() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store.add_expense(native("old", 1.0).with_id("x")).unwrap();
        store.add_expense(native("new", 2.0).with_id("x")).unwrap();
        let _removed = store.remove_expense(&ExpenseId::from("x")).unwrap();
        assert_eq!(store.expenses().len(), 1);
        assert_eq!(store.expenses().first().unwrap().title, "old");
    }

    #[test]
    fn reset_clears_and_persists() {
        let mut store = LedgerStore::load_with_seed(InMemoryStorage::new(), Ledger::demo(day(10)));
        store.reset_expenses().unwrap();
        assert!(store.expenses().is_empty());
        assert_eq!(
            store.storage().read(Slot::Expenses).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn update_budget_merges_fields() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store
            .update_budget(BudgetUpdate::new().total_limit(1500.0))
            .unwrap();
        assert_eq!(store.budget().currency, Currency::Pln);
        store
            .update_budget(BudgetUpdate::new().currency(Currency::Gbp))
            .unwrap();
        assert!((store.budget().total_limit - 1500.0).abs() < f64::EPSILON);
        assert_eq!(store.budget().currency, Currency::Gbp);
    }

    #[test]
    fn update_budget_rejects_invalid_limit() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        let err = store
            .update_budget(BudgetUpdate::new().total_limit(-5.0))
            .unwrap_err();
        assert!(matches!(err, BudgetError::InvalidLimit(_)));
        assert_eq!(*store.budget(), Budget::default());
        assert!(store.storage().read(Slot::Budget).unwrap().is_none());
    }

    #[test]
    fn mutations_round_trip_through_storage() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store
            .add_expense(
                Expense::new(
                    "Museum",
                    day(3),
                    Category::Attractions,
                    Valuation::converted(20.0, Currency::Eur, 4.3),
                )
                .with_location("Vienna"),
            )
            .unwrap();
        assert_eq!(reload(&store), *store.ledger());

        store.add_expense(native("Tram", 4.6)).unwrap();
        assert_eq!(reload(&store), *store.ledger());

        store
            .update_budget(BudgetUpdate::new().total_limit(750.0).currency(Currency::Eur))
            .unwrap();
        assert_eq!(reload(&store), *store.ledger());

        let replacement = vec![native("Only", 1.0)];
        store.replace_all_expenses(replacement.clone()).unwrap();
        assert_eq!(store.expenses(), replacement.as_slice());
        assert_eq!(reload(&store), *store.ledger());

        store.reset_expenses().unwrap();
        assert_eq!(reload(&store), *store.ledger());
    }

    #[test]
    fn non_finite_amount_is_never_persisted() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store.add_expense(native("kept", 5.0)).unwrap();
        let before = store.ledger().clone();

        let overflow = Expense::new(
            "Villa",
            day(2),
            Category::Accommodation,
            Valuation::converted(1e308, Currency::Eur, 4.3),
        )
        .with_id("huge");
        let err = store.add_expense(overflow.clone()).unwrap_err();
        assert!(matches!(err, BudgetError::NonFiniteAmount(ref id) if *id == ExpenseId::from("huge")));
        assert!(store.replace_all_expenses(vec![overflow]).is_err());

        assert_eq!(*store.ledger(), before);
        assert_eq!(reload(&store), before);
    }

    #[cfg(feature = "storage-file")]
    #[test]
    fn file_storage_round_trip() {
        use crate::storage::FileStorage;

        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::load(FileStorage::new(dir.path().to_path_buf()).unwrap());
        store
            .add_expense(
                Expense::new(
                    "Gondola",
                    day(6),
                    Category::Attractions,
                    Valuation::converted(80.0, Currency::Eur, 4.25),
                )
                .with_location("Venice")
                .with_description("Evening ride."),
            )
            .unwrap();
        store.add_expense(native("Water", 3.5)).unwrap();
        store
            .update_budget(BudgetUpdate::new().total_limit(2500.0))
            .unwrap();
        let expected = store.ledger().clone();

        let reopened = LedgerStore::load_with_seed(
            FileStorage::new(dir.path().to_path_buf()).unwrap(),
            Ledger::demo(day(10)),
        );
        assert_eq!(*reopened.ledger(), expected);
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let mut store = LedgerStore::load(FlakyStorage::default());
        store.add_expense(native("kept", 1.0).with_id("kept")).unwrap();
        let before = store.ledger().clone();

        store.storage().broken.store(true, Ordering::Relaxed);
        assert!(store.add_expense(native("lost", 2.0)).is_err());
        assert!(store.remove_expense(&ExpenseId::from("kept")).is_err());
        assert!(store.reset_expenses().is_err());
        assert!(
            store
                .update_budget(BudgetUpdate::new().currency(Currency::Usd))
                .is_err()
        );
        assert_eq!(*store.ledger(), before);

        store.storage().broken.store(false, Ordering::Relaxed);
        let reloaded = LedgerStore::load(store.storage).ledger().clone();
        assert_eq!(reloaded.expenses, before.expenses);
    }

    #[test]
    fn filter_by_search_category_and_dates() {
        let mut store = LedgerStore::load(InMemoryStorage::new());
        store
            .add_expense(
                Expense::new(
                    "Pizza",
                    day(2),
                    Category::Restaurants,
                    Valuation::Native { amount: 40.0 },
                )
                .with_location("Rome"),
            )
            .unwrap();
        store
            .add_expense(Expense::new(
                "Metro to Roma Termini",
                day(5),
                Category::Transport,
                Valuation::Native { amount: 2.0 },
            ))
            .unwrap();
        store
            .add_expense(
                Expense::new(
                    "Museum",
                    day(8),
                    Category::Attractions,
                    Valuation::Native { amount: 15.0 },
                )
                .with_location("Florence"),
            )
            .unwrap();

        let titles = |filter: &ExpenseFilter| -> Vec<String> {
            store
                .filter_expenses(filter)
                .into_iter()
                .map(|expense| expense.title.clone())
                .collect()
        };

        assert_eq!(titles(&ExpenseFilter::new()).len(), 3);
        assert_eq!(titles(&ExpenseFilter::new().search("ROM")), ["Metro to Roma Termini", "Pizza"]);
        assert_eq!(titles(&ExpenseFilter::new().search("florence")), ["Museum"]);
        assert_eq!(
            titles(&ExpenseFilter::new().category(Category::Restaurants)),
            ["Pizza"]
        );
        assert_eq!(
            titles(&ExpenseFilter::new().date_range(day(2), day(5))),
            ["Metro to Roma Termini", "Pizza"]
        );
        assert!(
            titles(
                &ExpenseFilter::new()
                    .search("pizza")
                    .category(Category::Transport)
            )
            .is_empty()
        );
    }
}
