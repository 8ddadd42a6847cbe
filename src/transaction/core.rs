//! Defines the synthetic transaction model.

use std::fmt::Display;

use serde::{Serialize, Serializer};
use time::Date;

/// The 1-based sequence number of a generated transaction.
///
/// Displayed with a prefix and zero-padding, e.g. `txn_0001`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u32);

impl TransactionId {
    /// Create a new transaction ID from a sequence number.
    pub fn new(sequence: u32) -> Self {
        Self(sequence)
    }

    /// The sequence number of the transaction.
    pub fn sequence(&self) -> u32 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{:04}", self.0)
    }
}

impl Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A purchase made by the user at a merchant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the purchase was made.
    pub date: Date,
    /// The name of the merchant the purchase was made at.
    pub merchant: String,
    /// The amount spent, always positive and rounded to cents.
    pub amount: f64,
    /// The spend category of the merchant, e.g. "Groceries".
    pub category: String,
}

#[cfg(test)]
mod transaction_id_tests {
    use super::TransactionId;

    #[test]
    fn displays_with_zero_padding() {
        assert_eq!(TransactionId::new(1).to_string(), "txn_0001");
        assert_eq!(TransactionId::new(42).to_string(), "txn_0042");
    }

    #[test]
    fn displays_sequence_wider_than_padding() {
        assert_eq!(TransactionId::new(12345).to_string(), "txn_12345");
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&TransactionId::new(7)).unwrap();

        assert_eq!(json, "\"txn_0007\"");
    }
}
