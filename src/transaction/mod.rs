//! Synthetic transactions.
//!
//! This module contains:
//! - The `Transaction` model
//! - The random transaction generator
//! - Category and merchant rollups of generated transactions

mod core;
mod generator;
mod rollup;

pub use core::{Transaction, TransactionId};
pub use generator::generate;
pub use rollup::{CategoryRollupRow, MerchantRollupRow, category_rollup, merchant_rollup};
