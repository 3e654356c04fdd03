//! Closed enumerations: supported currencies and expense categories.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

/// A currency from the fixed supported set, serialized as its ISO 4217 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Polish zloty.
    Pln,
    /// Euro.
    Eur,
    /// US dollar.
    Usd,
    /// Pound sterling.
    Gbp,
    /// Swiss franc.
    Chf,
    /// Czech koruna.
    Czk,
    /// Norwegian krone.
    Nok,
    /// Swedish krona.
    Sek,
    /// Hungarian forint.
    Huf,
}

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Self; 9] = [
        Self::Pln,
        Self::Eur,
        Self::Usd,
        Self::Gbp,
        Self::Chf,
        Self::Czk,
        Self::Nok,
        Self::Sek,
        Self::Huf,
    ];

    /// Returns the ISO 4217 code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pln => "PLN",
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Chf => "CHF",
            Self::Czk => "CZK",
            Self::Nok => "NOK",
            Self::Sek => "SEK",
            Self::Huf => "HUF",
        }
    }

    /// Returns the human-readable currency name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pln => "Polish Zloty",
            Self::Eur => "Euro",
            Self::Usd => "US Dollar",
            Self::Gbp => "British Pound",
            Self::Chf => "Swiss Franc",
            Self::Czk => "Czech Koruna",
            Self::Nok => "Norwegian Krone",
            Self::Sek => "Swedish Krona",
            Self::Huf => "Hungarian Forint",
        }
    }
}

impl fmt::Display for Currency {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = BudgetError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| BudgetError::UnknownCurrency(trimmed.to_owned()))
    }
}

/// Expense category from the fixed, closed set.
///
/// Serialized with the labels used by the original browser ledger so that
/// exported `localStorage` blobs load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Restaurants, cafes, food.
    #[serde(rename = "Restauracje")]
    Restaurants,
    /// Sightseeing, tickets, entertainment.
    #[serde(rename = "Atrakcje")]
    Attractions,
    /// Taxis, public transport, fuel.
    #[serde(rename = "Transport")]
    Transport,
    /// Hotels and other lodging.
    #[serde(rename = "Nocleg")]
    Accommodation,
    /// Groceries, clothes, souvenirs.
    #[serde(rename = "Zakupy")]
    Shopping,
    /// Anything else.
    #[serde(rename = "Inne")]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Restaurants,
        Self::Attractions,
        Self::Transport,
        Self::Accommodation,
        Self::Shopping,
        Self::Other,
    ];

    /// Returns the English display label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Restaurants => "Restaurants",
            Self::Attractions => "Attractions",
            Self::Transport => "Transport",
            Self::Accommodation => "Accommodation",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// Returns the label this category is persisted under.
    #[inline]
    #[must_use]
    pub const fn stored_label(self) -> &'static str {
        match self {
            Self::Restaurants => "Restauracje",
            Self::Attractions => "Atrakcje",
            Self::Transport => "Transport",
            Self::Accommodation => "Nocleg",
            Self::Shopping => "Zakupy",
            Self::Other => "Inne",
        }
    }
}

impl fmt::Display for Category {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = BudgetError;

    /// Parses either the display label or the persisted label,
    /// case-insensitively.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| {
                category.label().eq_ignore_ascii_case(trimmed)
                    || category.stored_label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| BudgetError::UnknownCategory(trimmed.to_owned()))
    }
}
