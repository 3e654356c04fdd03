//! Personal budget and expense ledger with multi-currency support.
//!
//! Expenses are recorded against a budget in one base currency. Expenses
//! made in another currency remember their original amount, so changing
//! the base currency re-prices the whole ledger with fresh exchange rates
//! (see [`rebase`]). State lives in a [`ledger::LedgerStore`] persisted
//! through a pluggable [`storage::Storage`] backend, and rates come from
//! any [`rates::RateProvider`], such as the Frankfurter HTTP API.

pub mod error;
pub mod ledger;
pub mod models;
pub mod rates;
pub mod rebase;
pub mod report;
pub mod storage;
pub mod synth;
