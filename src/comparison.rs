//! Compares the effective cost of paying for a user's spending with each card.
//!
//! The effective cost of a card is what the user would have paid after
//! rewards and fees: `total spent - (rewards earned - annual fee)`. Every
//! comparison also includes a debit card baseline that earns no rewards and
//! charges no fee.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Card, Error,
    catalog::BASELINE_CARD_NAME,
    money::round_to,
    transaction::CategoryRollupRow,
};

/// Total spending per category.
///
/// Categories are kept in name order so that sums do not depend on the order
/// the totals were added in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals(BTreeMap<String, f64>);

impl CategoryTotals {
    /// Create an empty set of totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `spend` to the total for `category`.
    pub fn add(&mut self, category: &str, spend: f64) {
        *self.0.entry(category.to_owned()).or_insert(0.0) += spend;
    }

    /// The sum of all category totals.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Iterate over the categories and their totals in category name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(category, &spend)| (category.as_str(), spend))
    }

    /// The number of categories.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no categories.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for CategoryTotals {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut totals = Self::new();

        for (category, spend) in iter {
            totals.add(category.as_ref(), spend);
        }

        totals
    }
}

impl From<&[CategoryRollupRow]> for CategoryTotals {
    fn from(rows: &[CategoryRollupRow]) -> Self {
        rows.iter()
            .map(|row| (row.category.as_str(), row.total_spent))
            .collect()
    }
}

/// The cost of the user's spending if it had been paid with a particular card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCostResult {
    /// The position by effective cost, where 1 is the cheapest.
    pub rank: usize,
    /// The total spent across all categories. The same for every card.
    pub total_spent: f64,
    /// The rewards the card would have paid out.
    pub rewards_earned: f64,
    /// The card's annual fee.
    pub annual_fee: f64,
    /// What the spending would have cost after rewards and fees.
    pub effective_cost: f64,
    /// How much cheaper the card is than the debit card baseline.
    pub savings_vs_debit: f64,
    /// The savings as a percentage of the total spent.
    pub savings_percentage: f64,
}

/// The ranked results of comparing every card against the user's spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardComparison(BTreeMap<String, CardCostResult>);

impl CardComparison {
    /// The results keyed by card name, including the baseline.
    pub fn cards(&self) -> &BTreeMap<String, CardCostResult> {
        &self.0
    }

    /// The result for `card_name`, if it was compared.
    pub fn get(&self, card_name: &str) -> Option<&CardCostResult> {
        self.0.get(card_name)
    }

    /// The results ordered by rank, cheapest first.
    pub fn ranked(&self) -> Vec<(&str, &CardCostResult)> {
        let mut ranked: Vec<(&str, &CardCostResult)> = self
            .0
            .iter()
            .map(|(name, result)| (name.as_str(), result))
            .collect();
        ranked.sort_by_key(|(_, result)| result.rank);
        ranked
    }

    /// The name of the card with the lowest effective cost.
    pub fn best_card(&self) -> &str {
        self.0
            .iter()
            .min_by_key(|(_, result)| result.rank)
            .map(|(name, _)| name.as_str())
            // The baseline is always present.
            .unwrap_or(BASELINE_CARD_NAME)
    }
}

/// Calculate the effective cost of `totals` for each card in `cards` and for
/// the debit card baseline, and rank them from cheapest to most expensive.
///
/// Cards with the same (rounded) effective cost are ranked by name, so ranks
/// are always the distinct numbers 1 to N.
///
/// # Errors
/// Returns an [Error::InvalidArgument] if any total is negative or not a
/// finite number. Returns an [Error::Configuration] if a card has no rate for
/// a category and no default rate, or if a card uses the baseline's name.
pub fn compare(
    totals: &CategoryTotals,
    cards: &BTreeMap<String, Card>,
) -> Result<CardComparison, Error> {
    for (category, spend) in totals.iter() {
        if !spend.is_finite() || spend < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "the spend for \"{category}\" must be a non-negative amount, got {spend}"
            )));
        }
    }

    let total_spent = totals.total();

    let mut unranked = Vec::with_capacity(cards.len() + 1);
    unranked.push((BASELINE_CARD_NAME.to_owned(), baseline_cost(total_spent)));

    for (card_name, card) in cards {
        if card_name == BASELINE_CARD_NAME {
            return Err(Error::Configuration(format!(
                "\"{BASELINE_CARD_NAME}\" is reserved for the no-rewards baseline"
            )));
        }

        unranked.push((card_name.clone(), card_cost(card_name, card, totals, total_spent)?));
    }

    unranked.sort_by(|(a_name, a), (b_name, b)| {
        a.effective_cost
            .total_cmp(&b.effective_cost)
            .then_with(|| a_name.cmp(b_name))
    });

    let results = unranked
        .into_iter()
        .enumerate()
        .map(|(index, (name, result))| (name, CardCostResult { rank: index + 1, ..result }))
        .collect();

    Ok(CardComparison(results))
}

fn baseline_cost(total_spent: f64) -> CardCostResult {
    CardCostResult {
        rank: 0,
        total_spent: round_to(total_spent, 2),
        rewards_earned: 0.0,
        annual_fee: 0.0,
        effective_cost: round_to(total_spent, 2),
        savings_vs_debit: 0.0,
        savings_percentage: 0.0,
    }
}

fn card_cost(
    card_name: &str,
    card: &Card,
    totals: &CategoryTotals,
    total_spent: f64,
) -> Result<CardCostResult, Error> {
    let mut rewards = 0.0;

    for (category, spend) in totals.iter() {
        let rate = card.rate(category).ok_or_else(|| {
            Error::Configuration(format!(
                "card \"{card_name}\" has no reward rate for \"{category}\" and no default rate"
            ))
        })?;
        rewards += spend * rate;
    }

    let net_rewards = rewards - card.annual_fee;
    let effective_cost = total_spent - net_rewards;
    let savings = total_spent - effective_cost;
    let savings_percentage = if total_spent > 0.0 {
        savings / total_spent * 100.0
    } else {
        0.0
    };

    Ok(CardCostResult {
        rank: 0,
        total_spent: round_to(total_spent, 2),
        rewards_earned: round_to(rewards, 2),
        annual_fee: round_to(card.annual_fee, 2),
        effective_cost: round_to(effective_cost, 2),
        savings_vs_debit: round_to(savings, 2),
        savings_percentage: round_to(savings_percentage, 3),
    })
}
