//! Aggregations over the ledger for summaries and charts.
//!
//! All aggregates read only the base-currency `amount` of each expense.

use std::collections::BTreeMap;

use crate::models::{Category, Currency, Expense, Ledger, NaiveDate};

/// Spending against the budget limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Sum of all expense amounts.
    pub total_spent: f64,
    /// `limit - total_spent`; negative when over budget.
    pub remaining: f64,
    /// Share of the limit spent, in percent, capped at 100.
    pub percent_used: f64,
    /// Budget limit.
    pub limit: f64,
    /// Base currency of every figure.
    pub currency: Currency,
}

impl Summary {
    /// Computes the summary of `ledger`.
    #[inline]
    #[must_use]
    pub fn of(ledger: &Ledger) -> Self {
        let total_spent = total(&ledger.expenses);
        let limit = ledger.budget.total_limit;
        let percent_used = if limit > 0.0 {
            (total_spent / limit * 100.0).min(100.0)
        } else {
            100.0
        };
        Self {
            total_spent,
            remaining: limit - total_spent,
            percent_used,
            limit,
            currency: ledger.budget.currency,
        }
    }

    /// Returns `true` if spending exceeds the limit.
    #[inline]
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Returns the sum of the expense amounts.
#[inline]
#[must_use]
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(Expense::amount).sum()
}

/// Returns one `(date, total)` entry per distinct date, oldest first.
#[inline]
#[must_use]
pub fn daily_totals(expenses: &[Expense]) -> Vec<(NaiveDate, f64)> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.date).or_default() += expense.amount();
    }
    totals.into_iter().collect()
}

/// Returns one `(category, total)` entry per category present, in the
/// order of [`Category::ALL`].
#[inline]
#[must_use]
pub fn category_totals(expenses: &[Expense]) -> Vec<(Category, f64)> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_default() += expense.amount();
    }
    totals.into_iter().collect()
}

/// Returns the mean expense amount, or `None` for no expenses.
#[inline]
#[must_use]
pub fn average(expenses: &[Expense]) -> Option<f64> {
    if expenses.is_empty() {
        return None;
    }
    let count = u32::try_from(expenses.len()).unwrap_or(u32::MAX);
    Some(total(expenses) / f64::from(count))
}

/// Returns the category with the highest total and that total, or `None`
/// for no expenses. Ties go to the category listed first in
/// [`Category::ALL`].
#[inline]
#[must_use]
pub fn top_category(expenses: &[Expense]) -> Option<(Category, f64)> {
    category_totals(expenses)
        .into_iter()
        .fold(None, |best, entry| match best {
            Some(leader) if leader.1 >= entry.1 => Some(leader),
            _ => Some(entry),
        })
}

/// Returns up to `count` most recently added expenses.
#[inline]
#[must_use]
pub fn recent(expenses: &[Expense], count: usize) -> &[Expense] {
    expenses.get(..count).unwrap_or(expenses)
}
