//! Random generation of synthetic transactions from a [Catalog].

use rand::{Rng, distributions::Distribution, distributions::WeightedIndex, seq::SliceRandom};
use time::{Date, Duration};

use crate::{Catalog, Error, money::round_to};

use super::core::{Transaction, TransactionId};

/// Generate `count` random transactions dated within `lookback_days` days
/// before `today` (inclusive), newest first.
///
/// Categories are drawn in proportion to the catalog's category weights, a
/// merchant is then drawn uniformly from the category, and the amount is
/// drawn uniformly from the merchant's range and rounded to cents.
///
/// Transactions on the same day keep ascending ID order, although callers
/// should not rely on this.
///
/// # Errors
/// Returns an [Error::InvalidArgument] if `count` is not positive or does not
/// fit in a transaction ID, or if the lookback window reaches back before the
/// earliest representable date. Returns an [Error::Configuration] if the
/// catalog cannot be sampled from.
pub fn generate<R: Rng>(
    catalog: &Catalog,
    count: i64,
    lookback_days: u32,
    today: Date,
    rng: &mut R,
) -> Result<Vec<Transaction>, Error> {
    if count <= 0 {
        return Err(Error::InvalidArgument(format!(
            "the number of transactions must be positive, got {count}"
        )));
    }

    let count = u32::try_from(count).map_err(|_| {
        Error::InvalidArgument(format!("cannot generate {count} transactions at once"))
    })?;

    let earliest = today
        .checked_sub(Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "a lookback of {lookback_days} days from {today} is before the earliest date"
            ))
        })?;

    let categories: Vec<&String> = catalog.category_weights.keys().collect();
    let category_sampler = WeightedIndex::new(catalog.category_weights.values())
        .map_err(|error| Error::Configuration(format!("invalid category weights: {error}")))?;

    let mut transactions = Vec::with_capacity(count as usize);

    for sequence in 1..=count {
        let category = categories[category_sampler.sample(rng)];
        let merchant = catalog
            .merchants
            .get(category)
            .and_then(|merchants| merchants.choose(rng))
            .ok_or_else(|| {
                Error::Configuration(format!("the category \"{category}\" has no merchants"))
            })?;

        let amount = round_to(rng.gen_range(merchant.min_amount..=merchant.max_amount), 2)
            .clamp(merchant.min_amount, merchant.max_amount);

        // Never earlier than `earliest`, so this cannot overflow.
        let days_ago = rng.gen_range(0..=lookback_days);

        transactions.push(Transaction {
            id: TransactionId::new(sequence),
            date: today - Duration::days(i64::from(days_ago)),
            merchant: merchant.name.clone(),
            amount,
            category: category.clone(),
        });
    }

    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::debug!(
        "Generated {} transactions between {earliest} and {today}",
        transactions.len()
    );

    Ok(transactions)
}
