//! Budget configuration and partial updates.

use serde::{Deserialize, Serialize};

use super::Currency;
use crate::error::{BudgetError, Result};

/// Default spending limit of a fresh ledger.
const DEFAULT_LIMIT: f64 = 5000.0;

/// Singleton budget configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Spending limit, in `currency`.
    pub total_limit: f64,
    /// Base currency of the limit and of every expense amount.
    pub currency: Currency,
}

impl Default for Budget {
    #[inline]
    fn default() -> Self {
        Self {
            total_limit: DEFAULT_LIMIT,
            currency: Currency::Pln,
        }
    }
}

impl Budget {
    /// Returns a copy with the fields present in `update` replaced.
    #[inline]
    #[must_use]
    pub fn merged(self, update: BudgetUpdate) -> Self {
        Self {
            total_limit: update.total_limit.unwrap_or(self.total_limit),
            currency: update.currency.unwrap_or(self.currency),
        }
    }

    /// Checks that the limit is a positive, finite number.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::InvalidLimit`] otherwise.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        BudgetUpdate::new().total_limit(self.total_limit).validate()
    }
}

/// A partial budget change; absent fields stay as they are.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BudgetUpdate {
    /// New spending limit.
    pub total_limit: Option<f64>,
    /// New base currency.
    pub currency: Option<Currency>,
}

impl BudgetUpdate {
    /// Creates an empty update.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new spending limit.
    #[inline]
    #[must_use]
    pub const fn total_limit(mut self, limit: f64) -> Self {
        self.total_limit = Some(limit);
        self
    }

    /// Sets the new base currency.
    #[inline]
    #[must_use]
    pub const fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Checks that a supplied limit is a positive, finite number.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::InvalidLimit`] otherwise.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        match self.total_limit {
            Some(limit) if !limit.is_finite() || limit <= 0.0 => {
                Err(BudgetError::InvalidLimit(limit))
            }
            _ => Ok(()),
        }
    }
}
