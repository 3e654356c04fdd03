//! Error types for the budget-pilot library.

use crate::models::{Currency, ExpenseId};

/// All errors that can occur when using the budget-pilot library.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A rate service URL could not be built.
    #[cfg(feature = "http")]
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The exchange-rate service returned a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// No usable rate was available for the currency pair.
    #[error("exchange rate {from} -> {to} is unavailable")]
    RateUnavailable {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
    },

    /// A budget limit was zero, negative, or not a finite number.
    #[error("budget limit must be a positive number, got {0}")]
    InvalidLimit(f64),

    /// An expense amount, original amount, or rate is not a finite number.
    #[error("expense {0} has a non-finite amount")]
    NonFiniteAmount(ExpenseId),

    /// A currency code outside the supported set.
    #[error("unsupported currency code: {0}")]
    UnknownCurrency(String),

    /// A category name outside the supported set.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, BudgetError>;
