//! The reference data used to generate transactions and compare cards.
//!
//! A [Catalog] is loaded once when the process starts, either from the
//! built-in defaults or from a JSON file with the same shape as the serde
//! representation of [Catalog]:
//!
//! ```json
//! {
//!   "merchants": { "Gas": [{ "name": "Shell", "min_amount": 40, "max_amount": 70 }] },
//!   "category_weights": { "Gas": 10 },
//!   "cards": {
//!     "Cash Back Visa": { "rewards": { "default": 0.015 }, "annual_fee": 0, "intro_bonus": 0 }
//!   }
//! }
//! ```

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The key of the reward rate applied to categories without their own rate.
pub const DEFAULT_RATE_KEY: &str = "default";

/// The name of the no-rewards, no-fee baseline included in every comparison.
///
/// Catalog cards may not use this name.
pub const BASELINE_CARD_NAME: &str = "Debit Card";

/// A merchant that synthetic transactions can be made at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    /// The merchant's display name.
    pub name: String,
    /// The smallest amount a single purchase can be for.
    pub min_amount: f64,
    /// The largest amount a single purchase can be for.
    pub max_amount: f64,
}

impl Merchant {
    fn new(name: &str, min_amount: f64, max_amount: f64) -> Self {
        Self {
            name: name.to_owned(),
            min_amount,
            max_amount,
        }
    }
}

/// The reward structure of a credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Reward rates by spend category, as fractions of the amount spent.
    ///
    /// The rate under [DEFAULT_RATE_KEY] applies to every other category.
    pub rewards: BTreeMap<String, f64>,
    /// The yearly fee for holding the card.
    #[serde(default)]
    pub annual_fee: f64,
    /// The sign-up bonus. Not used when calculating costs.
    #[serde(default)]
    pub intro_bonus: f64,
}

impl Card {
    /// Create a card with a single flat rate and no fees.
    pub fn flat_rate(rate: f64) -> Self {
        Self {
            rewards: BTreeMap::from([(DEFAULT_RATE_KEY.to_owned(), rate)]),
            annual_fee: 0.0,
            intro_bonus: 0.0,
        }
    }

    /// The reward rate for `category`, falling back to the default rate.
    ///
    /// Returns `None` if the card has neither.
    pub fn rate(&self, category: &str) -> Option<f64> {
        self.rewards
            .get(category)
            .or_else(|| self.rewards.get(DEFAULT_RATE_KEY))
            .copied()
    }
}

/// Merchants, category weights and card reward structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Merchants by spend category.
    pub merchants: BTreeMap<String, Vec<Merchant>>,
    /// The relative frequency of each category in generated transactions.
    ///
    /// Weights do not need to sum to any particular total.
    pub category_weights: BTreeMap<String, u32>,
    /// Card reward structures by card name.
    pub cards: BTreeMap<String, Card>,
}

impl Catalog {
    /// Load and validate a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an [Error::Io] if the file cannot be read, or an
    /// [Error::Configuration] if it is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&text)?;

        tracing::info!(
            "Loaded catalog from {} with {} categories and {} cards",
            path.display(),
            catalog.merchants.len(),
            catalog.cards.len()
        );

        Ok(catalog)
    }

    /// Parse and validate a catalog from a JSON string.
    ///
    /// # Errors
    /// Returns an [Error::Configuration] if `text` is not a valid catalog.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let catalog: Self = serde_json::from_str(text)
            .map_err(|error| Error::Configuration(format!("could not parse catalog: {error}")))?;
        catalog.validate()?;

        Ok(catalog)
    }

    /// Check that the catalog can be used for generating transactions and
    /// comparing cards.
    ///
    /// A card without a default rate is accepted here and only produces a
    /// warning, since it is still usable as long as every spend category has
    /// its own rate.
    ///
    /// # Errors
    /// Returns an [Error::Configuration] describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.category_weights.is_empty() {
            return Err(Error::Configuration(
                "at least one category weight is required".to_owned(),
            ));
        }

        for (category, &weight) in &self.category_weights {
            if weight == 0 {
                return Err(Error::Configuration(format!(
                    "the weight for \"{category}\" must be positive"
                )));
            }

            match self.merchants.get(category) {
                Some(merchants) if !merchants.is_empty() => {}
                _ => {
                    return Err(Error::Configuration(format!(
                        "the weighted category \"{category}\" has no merchants"
                    )));
                }
            }
        }

        for (category, merchants) in &self.merchants {
            for merchant in merchants {
                let Merchant {
                    name,
                    min_amount,
                    max_amount,
                } = merchant;

                if !(min_amount.is_finite() && max_amount.is_finite())
                    || *min_amount <= 0.0
                    || min_amount > max_amount
                {
                    return Err(Error::Configuration(format!(
                        "merchant \"{name}\" in \"{category}\" has an invalid amount range \
                        [{min_amount}, {max_amount}]"
                    )));
                }
            }
        }

        for (card_name, card) in &self.cards {
            if card_name == BASELINE_CARD_NAME {
                return Err(Error::Configuration(format!(
                    "\"{BASELINE_CARD_NAME}\" is reserved for the no-rewards baseline"
                )));
            }

            for (category, rate) in &card.rewards {
                if !(0.0..1.0).contains(rate) {
                    return Err(Error::Configuration(format!(
                        "card \"{card_name}\" has an invalid reward rate {rate} for \"{category}\""
                    )));
                }
            }

            if !card.annual_fee.is_finite() || card.annual_fee < 0.0 {
                return Err(Error::Configuration(format!(
                    "card \"{card_name}\" has a negative annual fee"
                )));
            }

            if !card.rewards.contains_key(DEFAULT_RATE_KEY) {
                tracing::warn!(
                    "Card \"{card_name}\" has no default reward rate, reports will fail for \
                    categories it does not list"
                );
            }
        }

        Ok(())
    }
}

impl Default for Catalog {
    /// The built-in catalog of merchants and the credit union's Visa cards.
    fn default() -> Self {
        let merchants = BTreeMap::from([
            (
                "Groceries".to_owned(),
                vec![
                    Merchant::new("Whole Foods", 50.0, 150.0),
                    Merchant::new("Trader Joe's", 30.0, 100.0),
                    Merchant::new("Safeway", 40.0, 120.0),
                    Merchant::new("Costco", 100.0, 300.0),
                    Merchant::new("Target", 30.0, 80.0),
                ],
            ),
            (
                "Gas".to_owned(),
                vec![
                    Merchant::new("Shell", 40.0, 70.0),
                    Merchant::new("Costco Gas", 40.0, 70.0),
                    Merchant::new("Safeway", 35.0, 65.0),
                    Merchant::new("Arco", 30.0, 60.0),
                ],
            ),
            (
                "Dining".to_owned(),
                vec![
                    Merchant::new("Chipotle", 12.0, 25.0),
                    Merchant::new("Starbucks", 5.0, 15.0),
                    Merchant::new("McDonald's", 8.0, 15.0),
                    Merchant::new("Olive Garden", 30.0, 60.0),
                    Merchant::new("Subway", 8.0, 15.0),
                    Merchant::new("Panera Bread", 10.0, 20.0),
                    Merchant::new("Local Pizza Place", 15.0, 35.0),
                ],
            ),
            (
                "Travel".to_owned(),
                vec![
                    Merchant::new("Delta Airlines", 200.0, 800.0),
                    Merchant::new("United Airlines", 200.0, 800.0),
                    Merchant::new("Marriott Hotels", 150.0, 400.0),
                    Merchant::new("Hilton", 120.0, 350.0),
                    Merchant::new("Airbnb", 100.0, 300.0),
                    Merchant::new("Uber", 15.0, 40.0),
                    Merchant::new("Lyft", 12.0, 35.0),
                ],
            ),
            (
                "Entertainment".to_owned(),
                vec![
                    Merchant::new("Netflix", 15.0, 20.0),
                    Merchant::new("Spotify", 10.0, 15.0),
                    Merchant::new("AMC Theaters", 15.0, 50.0),
                    Merchant::new("PlayStation Store", 20.0, 60.0),
                ],
            ),
            (
                "Shopping".to_owned(),
                vec![
                    Merchant::new("Amazon", 20.0, 200.0),
                    Merchant::new("Walmart", 30.0, 100.0),
                    Merchant::new("Target", 25.0, 80.0),
                    Merchant::new("Best Buy", 50.0, 300.0),
                    Merchant::new("Macy's", 40.0, 150.0),
                ],
            ),
            (
                "Pharmacy".to_owned(),
                vec![
                    Merchant::new("CVS Pharmacy", 15.0, 60.0),
                    Merchant::new("Walgreens", 15.0, 60.0),
                    Merchant::new("Rite Aid", 12.0, 50.0),
                ],
            ),
            (
                "Utilities".to_owned(),
                vec![
                    Merchant::new("PG&E", 80.0, 150.0),
                    Merchant::new("Comcast", 70.0, 120.0),
                    Merchant::new("AT&T", 60.0, 100.0),
                ],
            ),
            (
                "Fitness".to_owned(),
                vec![
                    Merchant::new("24 Hour Fitness", 30.0, 80.0),
                    Merchant::new("Planet Fitness", 20.0, 40.0),
                    Merchant::new("Yoga Studio", 15.0, 30.0),
                ],
            ),
            (
                "Home Improvement".to_owned(),
                vec![
                    Merchant::new("Home Depot", 40.0, 200.0),
                    Merchant::new("Lowe's", 40.0, 180.0),
                    Merchant::new("Ace Hardware", 20.0, 80.0),
                ],
            ),
        ]);

        let category_weights = BTreeMap::from([
            ("Groceries".to_owned(), 35),
            ("Gas".to_owned(), 10),
            ("Dining".to_owned(), 30),
            ("Shopping".to_owned(), 10),
            ("Travel".to_owned(), 3),
            ("Entertainment".to_owned(), 8),
            ("Pharmacy".to_owned(), 5),
            ("Utilities".to_owned(), 3),
            ("Fitness".to_owned(), 4),
            ("Home Improvement".to_owned(), 5),
        ]);

        let platinum_rewards = Card {
            rewards: BTreeMap::from([
                ("Gas".to_owned(), 0.03),
                ("Groceries".to_owned(), 0.02),
                (DEFAULT_RATE_KEY.to_owned(), 0.01),
            ]),
            annual_fee: 0.0,
            intro_bonus: 0.0,
        };

        let cards = BTreeMap::from([
            ("Platinum Rewards Visa".to_owned(), platinum_rewards),
            ("Cash Back Visa".to_owned(), Card::flat_rate(0.015)),
            ("Secured Visa".to_owned(), Card::flat_rate(0.0)),
            ("Classic Visa".to_owned(), Card::flat_rate(0.0)),
        ]);

        Self {
            merchants,
            category_weights,
            cards,
        }
    }
}
