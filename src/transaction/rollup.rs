//! Summaries of spending grouped by category and by merchant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::money::round_to;

use super::core::Transaction;

/// Total spending in a category and its rank among all categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollupRow {
    /// The position by total spent, where 1 is the highest.
    pub rank: usize,
    /// The spend category.
    pub category: String,
    /// The sum of the category's transactions, rounded to cents.
    pub total_spent: f64,
    /// The number of transactions in the category.
    pub transaction_count: usize,
    /// The mean transaction amount, rounded to cents.
    pub average_per_transaction: f64,
}

/// Total spending at a merchant and its rank among all merchants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantRollupRow {
    /// The position by total spent, where 1 is the highest.
    pub rank: usize,
    /// The merchant's name.
    pub merchant: String,
    /// The sum of the merchant's transactions, rounded to cents.
    pub total_spent: f64,
    /// The number of transactions at the merchant.
    pub transaction_count: usize,
}

/// A group of transactions sharing the same key.
struct Group<'a> {
    key: &'a str,
    total: f64,
    count: usize,
}

impl Group<'_> {
    fn average(&self) -> f64 {
        self.total / self.count as f64
    }
}

/// Group transactions by `key`, ordered by total spent (highest first), then
/// by key.
fn group_by<'a>(
    transactions: &'a [Transaction],
    key: impl Fn(&'a Transaction) -> &'a str,
) -> Vec<Group<'a>> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for transaction in transactions {
        let (total, count) = groups.entry(key(transaction)).or_insert((0.0, 0));
        *total += transaction.amount;
        *count += 1;
    }

    let mut groups: Vec<Group> = groups
        .into_iter()
        .map(|(key, (total, count))| Group { key, total, count })
        .collect();

    // Stable, so equal totals stay in key order.
    groups.sort_by(|a, b| b.total.total_cmp(&a.total));

    groups
}

/// Summarise spending per category, ranked by total spent.
///
/// Categories with the same total are ranked alphabetically. An empty slice
/// produces an empty rollup.
pub fn category_rollup(transactions: &[Transaction]) -> Vec<CategoryRollupRow> {
    group_by(transactions, |transaction| transaction.category.as_str())
        .into_iter()
        .enumerate()
        .map(|(index, group)| CategoryRollupRow {
            rank: index + 1,
            category: group.key.to_owned(),
            total_spent: round_to(group.total, 2),
            transaction_count: group.count,
            average_per_transaction: round_to(group.average(), 2),
        })
        .collect()
}

/// Summarise spending per merchant, ranked by total spent.
///
/// Merchants with the same total are ranked alphabetically. An empty slice
/// produces an empty rollup.
pub fn merchant_rollup(transactions: &[Transaction]) -> Vec<MerchantRollupRow> {
    group_by(transactions, |transaction| transaction.merchant.as_str())
        .into_iter()
        .enumerate()
        .map(|(index, group)| MerchantRollupRow {
            rank: index + 1,
            merchant: group.key.to_owned(),
            total_spent: round_to(group.total, 2),
            transaction_count: group.count,
        })
        .collect()
}

#[cfg(test)]
mod rollup_tests {
    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::date;

    use crate::{
        Catalog,
        transaction::{Transaction, TransactionId, generate},
    };

    use super::{category_rollup, merchant_rollup};

    fn create_test_transaction(
        id: u32,
        merchant: &str,
        amount: f64,
        category: &str,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            date: date!(2025 - 01 - 15),
            merchant: merchant.to_owned(),
            amount,
            category: category.to_owned(),
        }
    }

    #[test]
    fn category_rollup_sums_counts_and_averages() {
        let transactions = vec![
            create_test_transaction(1, "Shell", 50.0, "Gas"),
            create_test_transaction(2, "Safeway", 100.0, "Groceries"),
            create_test_transaction(3, "Arco", 30.0, "Gas"),
            create_test_transaction(4, "Costco", 20.5, "Groceries"),
        ];

        let rollup = category_rollup(&transactions);

        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].rank, 1);
        assert_eq!(rollup[0].category, "Groceries");
        assert_eq!(rollup[0].total_spent, 120.5);
        assert_eq!(rollup[0].transaction_count, 2);
        assert_eq!(rollup[0].average_per_transaction, 60.25);
        assert_eq!(rollup[1].rank, 2);
        assert_eq!(rollup[1].category, "Gas");
        assert_eq!(rollup[1].total_spent, 80.0);
        assert_eq!(rollup[1].average_per_transaction, 40.0);
    }

    #[test]
    fn merchant_rollup_groups_by_merchant_across_categories() {
        // Safeway sells both groceries and gas.
        let transactions = vec![
            create_test_transaction(1, "Safeway", 60.0, "Gas"),
            create_test_transaction(2, "Safeway", 90.0, "Groceries"),
            create_test_transaction(3, "Shell", 45.0, "Gas"),
        ];

        let rollup = merchant_rollup(&transactions);

        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup[0].merchant, "Safeway");
        assert_eq!(rollup[0].total_spent, 150.0);
        assert_eq!(rollup[0].transaction_count, 2);
        assert_eq!(rollup[1].merchant, "Shell");
        assert_eq!(rollup[1].rank, 2);
    }

    #[test]
    fn equal_totals_are_ranked_by_name() {
        let transactions = vec![
            create_test_transaction(1, "Zed's", 10.0, "Pharmacy"),
            create_test_transaction(2, "Arco", 10.0, "Gas"),
            create_test_transaction(3, "Mid", 10.0, "Fitness"),
        ];

        let categories = category_rollup(&transactions);
        let merchants = merchant_rollup(&transactions);

        let category_names: Vec<&str> = categories.iter().map(|r| r.category.as_str()).collect();
        let merchant_names: Vec<&str> = merchants.iter().map(|r| r.merchant.as_str()).collect();
        assert_eq!(category_names, ["Fitness", "Gas", "Pharmacy"]);
        assert_eq!(merchant_names, ["Arco", "Mid", "Zed's"]);
        assert_eq!(
            categories.iter().map(|r| r.rank).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn empty_transactions_give_empty_rollups() {
        assert!(category_rollup(&[]).is_empty());
        assert!(merchant_rollup(&[]).is_empty());
    }

    #[test]
    fn category_totals_match_sum_of_transactions() {
        let catalog = Catalog::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let transactions = generate(&catalog, 400, 365, date!(2025 - 06 - 30), &mut rng).unwrap();

        let expected: f64 = transactions.iter().map(|t| t.amount).sum();
        let rollup_total: f64 = category_rollup(&transactions)
            .iter()
            .map(|row| row.total_spent)
            .sum();
        let count: usize = category_rollup(&transactions)
            .iter()
            .map(|row| row.transaction_count)
            .sum();

        assert!(
            (expected - rollup_total).abs() < 0.01,
            "rollup total {rollup_total} != transaction total {expected}"
        );
        assert_eq!(count, 400);
    }
}
