//! Data models for the expense ledger.
//!
//! This module contains the expense and budget types, the ledger aggregate,
//! the expense identifier newtype, and the closed currency and category
//! enumerations.

mod budget;
mod enums;
mod expense;
mod ids;
mod ledger;

pub use budget::{Budget, BudgetUpdate};
pub use chrono::NaiveDate;
pub use enums::{Category, Currency};
pub use expense::{Expense, Valuation};
pub use ids::ExpenseId;
pub use ledger::Ledger;
