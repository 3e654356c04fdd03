//! Expense model and its currency valuation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Category, Currency, ExpenseId};

/// How an expense's base-currency amount was obtained.
///
/// The original-currency fields exist together or not at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Valuation {
    /// Recorded directly in the base currency.
    Native {
        /// Amount in the base currency.
        amount: f64,
    },
    /// Recorded in, or frozen to, another currency and converted.
    Converted {
        /// Amount in the base currency, `original_amount * exchange_rate`
        /// at the time of the last rebase.
        amount: f64,
        /// Amount in the currency of origin.
        original_amount: f64,
        /// Currency of origin. Never changes once set.
        original_currency: Currency,
        /// Rate applied to obtain `amount`, kept for display.
        exchange_rate: f64,
    },
}

impl Valuation {
    /// Creates a converted valuation, computing the base amount.
    #[inline]
    #[must_use]
    pub fn converted(original_amount: f64, original_currency: Currency, exchange_rate: f64) -> Self {
        Self::Converted {
            amount: original_amount * exchange_rate,
            original_amount,
            original_currency,
            exchange_rate,
        }
    }

    /// Returns the amount in the base currency.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> f64 {
        match *self {
            Self::Native { amount } | Self::Converted { amount, .. } => amount,
        }
    }

    /// Returns `true` if every number in the valuation is finite.
    ///
    /// JSON has no encoding for infinities or NaN, so only finite
    /// valuations can be persisted.
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        match *self {
            Self::Native { amount } => amount.is_finite(),
            Self::Converted {
                amount,
                original_amount,
                exchange_rate,
                ..
            } => amount.is_finite() && original_amount.is_finite() && exchange_rate.is_finite(),
        }
    }

    /// Returns `(original_amount, original_currency)` for converted
    /// valuations.
    #[inline]
    #[must_use]
    pub const fn original(&self) -> Option<(f64, Currency)> {
        match *self {
            Self::Native { .. } => None,
            Self::Converted {
                original_amount,
                original_currency,
                ..
            } => Some((original_amount, original_currency)),
        }
    }

    /// Returns the currency a rebase must convert from, given the base
    /// currency the amounts are currently expressed in.
    #[inline]
    #[must_use]
    pub const fn source_currency(&self, current_base: Currency) -> Currency {
        match *self {
            Self::Native { .. } => current_base,
            Self::Converted {
                original_currency, ..
            } => original_currency,
        }
    }

    /// Re-expresses this valuation with `rate` from
    /// [`Self::source_currency`] to the new base.
    ///
    /// A native amount is frozen as the original amount in
    /// `current_base`; a converted one is recomputed from its original
    /// amount, never from the previous base amount.
    #[inline]
    #[must_use]
    pub fn rebased(self, current_base: Currency, rate: f64) -> Self {
        match self {
            Self::Native { amount } => Self::converted(amount, current_base, rate),
            Self::Converted {
                original_amount,
                original_currency,
                ..
            } => Self::converted(original_amount, original_currency, rate),
        }
    }
}

/// A single recorded transaction.
///
/// Serializes to the flat camelCase shape of the persisted ledger:
/// `originalAmount`, `originalCurrency` and `exchangeRate` appear only for
/// converted expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// Short title.
    pub title: String,
    /// Transaction date.
    pub date: NaiveDate,
    /// Category.
    pub category: Category,
    /// Where the money was spent.
    pub location: Option<String>,
    /// Free-form notes.
    pub description: Option<String>,
    /// Receipt image URL.
    pub receipt_image: Option<String>,
    /// Base-currency amount and, for converted expenses, its provenance.
    pub valuation: Valuation,
}

impl Expense {
    /// Creates an expense with a freshly generated identifier and no
    /// optional details.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(
        title: T,
        date: NaiveDate,
        category: Category,
        valuation: Valuation,
    ) -> Self {
        Self {
            id: ExpenseId::generate(),
            title: title.into(),
            date,
            category,
            location: None,
            description: None,
            receipt_image: None,
            valuation,
        }
    }

    /// Replaces the identifier.
    #[inline]
    #[must_use]
    pub fn with_id<T: Into<ExpenseId>>(mut self, id: T) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the location.
    #[inline]
    #[must_use]
    pub fn with_location<T: Into<String>>(mut self, location: T) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the description.
    #[inline]
    #[must_use]
    pub fn with_description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the amount in the base currency.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.valuation.amount()
    }
}

/// Flat persisted shape of an [`Expense`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseRecord {
    /// Identifier.
    id: ExpenseId,
    /// Title.
    title: String,
    /// Base-currency amount.
    amount: f64,
    /// Date (`YYYY-MM-DD`).
    date: NaiveDate,
    /// Category.
    category: Category,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    /// Receipt image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    receipt_image: Option<String>,
    /// Amount in the currency of origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_amount: Option<f64>,
    /// Currency of origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_currency: Option<Currency>,
    /// Applied rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exchange_rate: Option<f64>,
}

impl From<ExpenseRecord> for Expense {
    fn from(record: ExpenseRecord) -> Self {
        let valuation = match (
            record.original_amount,
            record.original_currency,
            record.exchange_rate,
        ) {
            (Some(original_amount), Some(original_currency), Some(exchange_rate)) => {
                Valuation::Converted {
                    amount: record.amount,
                    original_amount,
                    original_currency,
                    exchange_rate,
                }
            }
            (None, None, None) => Valuation::Native {
                amount: record.amount,
            },
            _ => {
                tracing::warn!(
                    id = %record.id,
                    "expense carries an incomplete original-currency record; reading it as native"
                );
                Valuation::Native {
                    amount: record.amount,
                }
            }
        };
        Self {
            id: record.id,
            title: record.title,
            date: record.date,
            category: record.category,
            location: record.location,
            description: record.description,
            receipt_image: record.receipt_image,
            valuation,
        }
    }
}

impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        let (original_amount, original_currency, exchange_rate) = match expense.valuation {
            Valuation::Native { .. } => (None, None, None),
            Valuation::Converted {
                original_amount,
                original_currency,
                exchange_rate,
                ..
            } => (
                Some(original_amount),
                Some(original_currency),
                Some(exchange_rate),
            ),
        };
        Self {
            id: expense.id,
            title: expense.title,
            amount: expense.valuation.amount(),
            date: expense.date,
            category: expense.category,
            description: expense.description,
            location: expense.location,
            receipt_image: expense.receipt_image,
            original_amount,
            original_currency,
            exchange_rate,
        }
    }
}
