//! Exchange-rate lookup.
//!
//! [`RateProvider`] is the seam to the outside world: anything that can
//! quote a rate for a currency pair, optionally on a historical date.
//! All lookups in the crate go through [`lookup`], which answers
//! same-currency queries itself and rejects unusable quotes.

#[cfg(feature = "http")]
mod frankfurter;

#[cfg(feature = "http")]
pub use frankfurter::{FrankfurterClient, FrankfurterClientBuilder, RatesResponse};

use core::future::Future;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{BudgetError, Result};
use crate::models::Currency;

/// A request for the rate converting `from` into `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuery {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Amount of `from` to quote; providers return the rate for one unit
    /// regardless.
    pub amount: f64,
    /// Historical date, or `None` for the latest rate.
    pub date: Option<NaiveDate>,
}

impl RateQuery {
    /// Query for the latest rate of one unit.
    #[inline]
    #[must_use]
    pub const fn latest(from: Currency, to: Currency) -> Self {
        Self {
            from,
            to,
            amount: 1.0,
            date: None,
        }
    }

    /// Query for the rate of one unit on `date`.
    #[inline]
    #[must_use]
    pub const fn historical(from: Currency, to: Currency, date: NaiveDate) -> Self {
        Self {
            from,
            to,
            amount: 1.0,
            date: Some(date),
        }
    }

    /// Sets the quoted amount.
    #[inline]
    #[must_use]
    pub const fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    /// Returns the error reported when this pair has no usable rate.
    #[inline]
    #[must_use]
    pub fn unavailable(&self) -> BudgetError {
        BudgetError::RateUnavailable {
            from: self.from,
            to: self.to,
        }
    }
}

/// Source of exchange rates.
pub trait RateProvider: core::fmt::Debug + Send + Sync {
    /// Returns how many units of `query.to` one unit of `query.from` buys.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate cannot be obtained; callers treat any
    /// error as "rate unavailable".
    fn rate(&self, query: RateQuery) -> impl Future<Output = Result<f64>> + Send;
}

/// Looks up a rate, answering `from == to` with `1.0` without consulting
/// the provider.
///
/// # Errors
///
/// Returns the provider's error, or [`BudgetError::RateUnavailable`] if
/// the quoted rate is zero, negative, or not finite.
#[inline]
pub async fn lookup<P: RateProvider>(provider: &P, query: RateQuery) -> Result<f64> {
    if query.from == query.to {
        return Ok(1.0);
    }
    let rate = provider.rate(query).await?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        tracing::debug!(from = %query.from, to = %query.to, rate, "discarding unusable rate");
        Err(query.unavailable())
    }
}

/// Fixed in-memory rate table.
///
/// Answers pairs it was configured with and reports every other pair as
/// unavailable. Counts calls, which makes it useful for tests and for
/// working offline.
///
/// # Example
///
/// ```rust
/// use budget_pilot::models::Currency;
/// use budget_pilot::rates::StaticRates;
///
/// let rates = StaticRates::new().with_rate(Currency::Eur, Currency::Pln, 4.3);
/// assert_eq!(rates.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct StaticRates {
    /// Configured rates by `(from, to)`.
    table: HashMap<(Currency, Currency), f64>,
    /// Number of [`RateProvider::rate`] calls served.
    calls: AtomicUsize,
}

impl StaticRates {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the rate for `from -> to`.
    #[inline]
    #[must_use]
    pub fn with_rate(mut self, from: Currency, to: Currency, rate: f64) -> Self {
        let _previous = self.table.insert((from, to), rate);
        self
    }

    /// Returns how many times the provider was asked for a rate.
    #[inline]
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl RateProvider for StaticRates {
    #[inline]
    fn rate(&self, query: RateQuery) -> impl Future<Output = Result<f64>> + Send {
        let _previous = self.calls.fetch_add(1, Ordering::Relaxed);
        let result = self
            .table
            .get(&(query.from, query.to))
            .copied()
            .ok_or_else(|| query.unavailable());
        core::future::ready(result)
    }
}
