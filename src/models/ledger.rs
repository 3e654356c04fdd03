//! The ledger aggregate and its seed values.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Budget, Category, Expense, Valuation};

/// All expenses (newest first) plus the budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Budget configuration.
    pub budget: Budget,
    /// Expenses, most recently added first.
    pub expenses: Vec<Expense>,
}

impl Ledger {
    /// Returns the sample trip ledger shown on first start: the default
    /// budget and five native expenses dated over the last five days.
    #[must_use]
    pub fn demo(today: NaiveDate) -> Self {
        let days_ago = |days: u64| today.checked_sub_days(Days::new(days)).unwrap_or(today);
        let expenses = vec![
            Expense::new(
                "Dinner at Trattoria al Forno",
                days_ago(4),
                Category::Restaurants,
                Valuation::Native { amount: 245.5 },
            )
            .with_id("1")
            .with_description("Pizza and wine for four.")
            .with_location("Rome, Italy"),
            Expense::new(
                "Colosseum tickets",
                days_ago(3),
                Category::Attractions,
                Valuation::Native { amount: 320.0 },
            )
            .with_id("2")
            .with_description("Priority entrance with a guide.")
            .with_location("Rome, Italy"),
            Expense::new(
                "Uber to the hotel",
                days_ago(2),
                Category::Transport,
                Valuation::Native { amount: 45.9 },
            )
            .with_id("3")
            .with_description("Late night ride back.")
            .with_location("Rome, Italy"),
            Expense::new(
                "Souvenir stall",
                days_ago(1),
                Category::Shopping,
                Valuation::Native { amount: 85.0 },
            )
            .with_id("4")
            .with_description("Magnets and postcards.")
            .with_location("Vatican City"),
            Expense::new(
                "Hotel booking",
                days_ago(0),
                Category::Accommodation,
                Valuation::Native { amount: 1234.0 },
            )
            .with_id("5")
            .with_description("Booked online.")
            .with_location("Rome, Italy"),
        ];
        Self {
            budget: Budget::default(),
            expenses,
        }
    }
}
