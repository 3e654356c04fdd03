//! Random sample expenses for demos.
//!
//! A draft is drawn in a random transaction currency and then priced in
//! the ledger's base currency with the historical rate of its date.

use chrono::Days;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::models::{Category, Currency, Expense, NaiveDate, Valuation};
use crate::rates::{RateProvider, RateQuery, lookup};

/// Number of trailing days a random date is drawn from.
const DATE_WINDOW_DAYS: u64 = 30;
/// Lower bound of a random amount (inclusive).
const MIN_AMOUNT: f64 = 10.0;
/// Upper bound of a random amount (exclusive).
const MAX_AMOUNT: f64 = 500.0;

/// An expense drawn at random, not yet priced in the base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    /// Title matching the category.
    pub title: String,
    /// Description matching the category.
    pub description: String,
    /// Location matching the currency.
    pub location: String,
    /// Category.
    pub category: Category,
    /// Currency the transaction was made in.
    pub currency: Currency,
    /// Transaction date.
    pub date: NaiveDate,
    /// Amount in `currency`, rounded to two decimals.
    pub amount: f64,
}

impl ExpenseDraft {
    /// Draws a random draft dated within the 30 days up to `today`.
    #[inline]
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R, today: NaiveDate) -> Self {
        let category = pick(rng, &Category::ALL, Category::Other);
        let currency = pick(rng, &Currency::ALL, Currency::Pln);
        let days_ago = rng.random_range(0..DATE_WINDOW_DAYS);
        let date = today
            .checked_sub_days(Days::new(days_ago))
            .unwrap_or(today);
        let amount = (rng.random_range(MIN_AMOUNT..MAX_AMOUNT) * 100.0).round() / 100.0;
        Self {
            title: pick(rng, titles(category), "Expense").to_owned(),
            description: pick(rng, descriptions(category), "Miscellaneous.").to_owned(),
            location: pick(rng, locations(currency), "Unknown location").to_owned(),
            category,
            currency,
            date,
            amount,
        }
    }

    /// Prices the draft in `base`.
    ///
    /// A draft in `base` becomes a native expense. Otherwise the rate of
    /// the draft's date is looked up; if none is available the expense is
    /// recorded as native with the unconverted amount.
    #[inline]
    pub async fn into_expense<P: RateProvider>(self, provider: &P, base: Currency) -> Expense {
        let valuation = if self.currency == base {
            Valuation::Native {
                amount: self.amount,
            }
        } else {
            let query = RateQuery::historical(self.currency, base, self.date);
            match lookup(provider, query).await {
                Ok(rate) => Valuation::converted(self.amount, self.currency, rate),
                Err(err) => {
                    tracing::warn!(
                        from = %self.currency,
                        to = %base,
                        error = %err,
                        "no rate for sample expense, keeping the unconverted amount"
                    );
                    Valuation::Native {
                        amount: self.amount,
                    }
                }
            }
        };
        Expense::new(self.title, self.date, self.category, valuation)
            .with_location(self.location)
            .with_description(self.description)
    }
}

/// Draws a random expense and prices it in `base`.
#[inline]
pub async fn random_expense<R: Rng, P: RateProvider>(
    rng: &mut R,
    provider: &P,
    base: Currency,
    today: NaiveDate,
) -> Expense {
    let draft = ExpenseDraft::random(rng, today);
    draft.into_expense(provider, base).await
}

/// Picks a random element, or `fallback` from an empty slice.
fn pick<R: Rng, T: Copy>(rng: &mut R, items: &[T], fallback: T) -> T {
    items.choose(rng).copied().unwrap_or(fallback)
}

/// Sample titles per category.
const fn titles(category: Category) -> &'static [&'static str] {
    match category {
        Category::Restaurants => &["Lunch downtown", "Coffee and cake", "Dinner with friends", "Pizza night", "Sushi bar"],
        Category::Attractions => &["Museum ticket", "Cinema", "Theme park entry", "Water park", "Concert"],
        Category::Transport => &["Uber", "Bus ticket", "Fuel", "Intercity train", "Bolt"],
        Category::Accommodation => &["Hotel Mercure", "Airbnb apartment", "City hostel", "Campsite"],
        Category::Shopping => &["Supermarket", "Shopping mall", "Souvenir shop", "Drugstore", "Street market"],
        Category::Other => &["Hairdresser", "Florist", "Pharmacy", "Newsstand"],
    }
}

/// Sample descriptions per category.
const fn descriptions(category: Category) -> &'static [&'static str] {
    match category {
        Category::Restaurants => &[
            "Family lunch.",
            "Quick bite between meetings.",
            "Romantic dinner.",
            "Tasting local specialities.",
            "Coffee and dessert.",
        ],
        Category::Attractions => &[
            "Sightseeing.",
            "Admission ticket.",
            "Guided tour.",
            "Museum entrance.",
            "Bike rental.",
        ],
        Category::Transport => &[
            "Taxi ride.",
            "Public transport ticket.",
            "Filling up the car.",
            "Train ticket.",
            "Motorway toll.",
        ],
        Category::Accommodation => &[
            "Hotel booking.",
            "Airbnb stay.",
            "Tourist tax.",
            "Hostel in the centre.",
        ],
        Category::Shopping => &[
            "Weekend groceries.",
            "New clothes.",
            "Travel souvenirs.",
            "Gifts for the family.",
            "Local products.",
        ],
        Category::Other => &[
            "Haircut.",
            "Birthday present.",
            "Phone repair.",
            "Small expenses.",
        ],
    }
}

/// Sample locations per currency.
const fn locations(currency: Currency) -> &'static [&'static str] {
    match currency {
        Currency::Pln => &["Warsaw, Poland", "Krakow, Main Square", "Gdansk, Old Town", "Wroclaw, Market Square", "Zakopane, Krupowki"],
        Currency::Eur => &["Berlin, Germany", "Paris, France", "Rome, Italy", "Madrid, Spain", "Vienna, Austria", "Barcelona, Spain"],
        Currency::Usd => &["New York, USA", "Los Angeles, USA", "Chicago, USA", "Miami, USA", "Las Vegas, USA"],
        Currency::Gbp => &["London, UK", "Manchester, UK", "Liverpool, UK", "Edinburgh, Scotland"],
        Currency::Chf => &["Zurich, Switzerland", "Geneva, Switzerland", "Bern, Switzerland"],
        Currency::Czk => &["Prague, Czechia", "Brno, Czechia", "Ostrava, Czechia"],
        Currency::Nok => &["Oslo, Norway", "Bergen, Norway"],
        Currency::Sek => &["Stockholm, Sweden", "Gothenburg, Sweden"],
        Currency::Huf => &["Budapest, Hungary", "Debrecen, Hungary"],
    }
}
