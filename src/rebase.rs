//! Currency rebasing.
//!
//! When the budget's base currency changes, every expense amount is
//! recomputed from the currency it was originally recorded in. Rates are
//! fetched concurrently, one task per expense; an expense whose rate
//! cannot be obtained keeps its previous values and is reported as
//! skipped, without affecting the others.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::models::{BudgetUpdate, Currency, Expense, ExpenseId};
use crate::rates::{RateProvider, RateQuery, lookup};
use crate::storage::Storage;

/// Counts of a rebase run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RebaseReport {
    /// Number of expenses re-expressed in the new base currency.
    pub converted: usize,
    /// Expenses left untouched because no rate was available.
    pub skipped: Vec<ExpenseId>,
}

impl RebaseReport {
    /// Returns `true` if no expense was skipped.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of [`rebase_expenses`].
#[derive(Debug, Clone, PartialEq)]
pub struct RebaseOutcome {
    /// Expenses in their original order.
    pub expenses: Vec<Expense>,
    /// What happened to them.
    pub report: RebaseReport,
}

/// Re-expresses `expenses`, currently in base currency `from`, in `to`.
///
/// A converted expense is recomputed from its original amount with the
/// rate `original_currency -> to`. A native expense is frozen: its amount
/// becomes the original amount in `from` and is converted with
/// `from -> to`. Lookups run concurrently and are all awaited; a failed
/// lookup, or a conversion that overflows to a non-finite amount, leaves
/// the affected expense unchanged. When `from == to` the list is returned
/// as is.
///
/// Must be called from within a tokio runtime.
#[tracing::instrument(skip_all, fields(from = %from, to = %to, expenses = expenses.len()))]
pub async fn rebase_expenses<P: RateProvider + 'static>(
    provider: Arc<P>,
    expenses: Vec<Expense>,
    from: Currency,
    to: Currency,
) -> RebaseOutcome {
    if from == to {
        return RebaseOutcome {
            expenses,
            report: RebaseReport::default(),
        };
    }

    let mut tasks = JoinSet::new();
    for (index, expense) in expenses.iter().enumerate() {
        let task_provider = Arc::clone(&provider);
        let query = RateQuery::latest(expense.valuation.source_currency(from), to);
        let _abort = tasks.spawn(async move { (index, lookup(task_provider.as_ref(), query).await) });
    }

    let mut rates: Vec<Option<f64>> = vec![None; expenses.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(rate))) => {
                if let Some(slot) = rates.get_mut(index) {
                    *slot = Some(rate);
                }
            }
            Ok((index, Err(err))) => {
                if let Some(expense) = expenses.get(index) {
                    tracing::warn!(id = %expense.id, error = %err, "rate lookup failed, keeping expense as is");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "rate lookup task failed");
            }
        }
    }

    let mut report = RebaseReport::default();
    let mut rebased = Vec::with_capacity(expenses.len());
    for (expense, rate) in expenses.into_iter().zip(rates) {
        let next = rate
            .map(|found| expense.valuation.rebased(from, found))
            .filter(|candidate| {
                let finite = candidate.is_finite();
                if !finite {
                    tracing::warn!(id = %expense.id, "converted amount overflows, keeping expense as is");
                }
                finite
            });
        if let Some(valuation) = next {
            report.converted += 1;
            rebased.push(Expense {
                valuation,
                ..expense
            });
        } else {
            report.skipped.push(expense.id.clone());
            rebased.push(expense);
        }
    }
    tracing::debug!(
        converted = report.converted,
        skipped = report.skipped.len(),
        "rebase finished"
    );
    RebaseOutcome {
        expenses: rebased,
        report,
    }
}

/// Applies a budget change, rebasing the expenses first when the base
/// currency actually changes.
///
/// The update is validated before anything happens. The rebased
/// collection is persisted first and the budget second; the run stops at
/// the first failed write.
///
/// # Errors
///
/// Returns [`crate::error::BudgetError::InvalidLimit`] for an invalid
/// limit, or a storage error if either write fails. Unavailable rates are
/// not errors; they are listed in the returned report.
#[tracing::instrument(skip_all)]
pub async fn change_base_currency<S: Storage, P: RateProvider + 'static>(
    store: &mut LedgerStore<S>,
    provider: Arc<P>,
    update: BudgetUpdate,
) -> Result<RebaseReport> {
    update.validate()?;
    let current = store.budget().currency;
    let mut report = RebaseReport::default();
    if let Some(target) = update.currency.filter(|target| *target != current) {
        tracing::debug!(from = %current, to = %target, "changing base currency");
        let outcome = rebase_expenses(provider, store.expenses().to_vec(), current, target).await;
        store.replace_all_expenses(outcome.expenses)?;
        report = outcome.report;
    }
    store.update_budget(update)?;
    Ok(report)
}
