//! File storage for generated user data and savings reports.
//!
//! Each user's files live in their own directory under the store root:
//!
//! ```text
//! <root>/<user_id>/transactions.csv
//! <root>/<user_id>/top_categories.csv
//! <root>/<user_id>/top_merchants.csv
//! <root>/<user_id>/card_savings_comparison.json
//! ```
//!
//! Files are always replaced as a whole. Concurrent requests for the same
//! user are not coordinated, so the last write wins.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::NamedTempFile;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, SavingsReport, UserId,
    transaction::{CategoryRollupRow, MerchantRollupRow, Transaction, TransactionId},
};

const TRANSACTIONS_FILE: &str = "transactions.csv";
const CATEGORY_ROLLUP_FILE: &str = "top_categories.csv";
const MERCHANT_ROLLUP_FILE: &str = "top_merchants.csv";
const REPORT_FILE: &str = "card_savings_comparison.json";

const TRANSACTION_HEADER: [&str; 6] = [
    "transaction_id",
    "date",
    "name",
    "amount",
    "category",
    "merchant_name",
];
const CATEGORY_ROLLUP_HEADER: [&str; 5] = [
    "rank",
    "category",
    "total_spent",
    "transaction_count",
    "average_per_transaction",
];
const MERCHANT_ROLLUP_HEADER: [&str; 4] = ["rank", "merchant", "total_spent", "transaction_count"];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Where the files for a user's generated data were written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPaths {
    /// The CSV file of every generated transaction.
    pub transactions_path: PathBuf,
    /// The CSV file of spending per category.
    pub top_categories_path: PathBuf,
    /// The CSV file of spending per merchant.
    pub top_merchants_path: PathBuf,
}

/// A row of the transactions CSV file.
#[derive(Serialize)]
struct TransactionRecord<'a> {
    transaction_id: TransactionId,
    date: String,
    name: &'a str,
    amount: f64,
    category: &'a str,
    merchant_name: &'a str,
}

impl<'a> TryFrom<&'a Transaction> for TransactionRecord<'a> {
    type Error = Error;

    fn try_from(transaction: &'a Transaction) -> Result<Self, Self::Error> {
        let date = transaction
            .date
            .format(DATE_FORMAT)
            .map_err(|error| Error::Serialization(format!("could not format date: {error}")))?;

        Ok(Self {
            transaction_id: transaction.id,
            date,
            name: &transaction.merchant,
            amount: transaction.amount,
            category: &transaction.category,
            merchant_name: &transaction.merchant,
        })
    }
}

/// Stores user data as CSV and JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store that keeps its files under `root`.
    ///
    /// The directory is created when data is first saved.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory containing every user's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join(user_id.as_str())
    }

    /// The paths that [FileStore::save_user_data] writes to for `user_id`.
    pub fn data_paths(&self, user_id: &UserId) -> DataPaths {
        let user_dir = self.user_dir(user_id);

        DataPaths {
            transactions_path: user_dir.join(TRANSACTIONS_FILE),
            top_categories_path: user_dir.join(CATEGORY_ROLLUP_FILE),
            top_merchants_path: user_dir.join(MERCHANT_ROLLUP_FILE),
        }
    }

    /// The path of the savings report for `user_id`.
    pub fn report_path(&self, user_id: &UserId) -> PathBuf {
        self.user_dir(user_id).join(REPORT_FILE)
    }

    /// Replace the user's transactions and rollups.
    ///
    /// All three files are serialized and written to temporary files before
    /// any of them replaces the existing data, so a serialization or write
    /// error leaves the existing files untouched.
    ///
    /// # Errors
    /// Returns an [Error::Serialization] if the data cannot be written as CSV,
    /// or an [Error::Io] if a file cannot be written.
    pub fn save_user_data(
        &self,
        user_id: &UserId,
        transactions: &[Transaction],
        categories: &[CategoryRollupRow],
        merchants: &[MerchantRollupRow],
    ) -> Result<DataPaths, Error> {
        let records = transactions
            .iter()
            .map(TransactionRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let transactions_csv = to_csv(&TRANSACTION_HEADER, &records)?;
        let categories_csv = to_csv(&CATEGORY_ROLLUP_HEADER, categories)?;
        let merchants_csv = to_csv(&MERCHANT_ROLLUP_HEADER, merchants)?;

        let paths = self.data_paths(user_id);
        let user_dir = self.user_dir(user_id);
        fs::create_dir_all(&user_dir)?;

        let staged = [
            (stage_file(&user_dir, &transactions_csv)?, &paths.transactions_path),
            (stage_file(&user_dir, &categories_csv)?, &paths.top_categories_path),
            (stage_file(&user_dir, &merchants_csv)?, &paths.top_merchants_path),
        ];

        for (file, path) in staged {
            file.persist(path).map_err(|error| error.error)?;
        }

        tracing::debug!(
            "Saved {} transactions, {} categories and {} merchants for {user_id}",
            transactions.len(),
            categories.len(),
            merchants.len()
        );

        Ok(paths)
    }

    /// Read the category rollup saved for `user_id`.
    ///
    /// # Errors
    /// Returns an [Error::MissingUserData] if no data has been saved for the
    /// user, or an [Error::CorruptUserData] if the file cannot be parsed.
    pub fn load_category_rollup(&self, user_id: &UserId) -> Result<Vec<CategoryRollupRow>, Error> {
        let path = self.data_paths(user_id).top_categories_path;

        if !path.is_file() {
            return Err(Error::MissingUserData(user_id.to_string()));
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|error| Error::CorruptUserData(format!("{}: {error}", path.display())))?;

        reader
            .deserialize()
            .collect::<Result<Vec<CategoryRollupRow>, _>>()
            .map_err(|error| Error::CorruptUserData(format!("{}: {error}", path.display())))
    }

    /// Replace the savings report for the report's user.
    ///
    /// # Errors
    /// Returns an [Error::Serialization] if the report cannot be serialized as
    /// JSON, or an [Error::Io] if the file cannot be written.
    pub fn save_report(&self, report: &SavingsReport) -> Result<PathBuf, Error> {
        let json = serde_json::to_vec_pretty(report)?;
        let path = self.report_path(&report.user_id);

        let user_dir = self.user_dir(&report.user_id);
        fs::create_dir_all(&user_dir)?;
        stage_file(&user_dir, &json)?
            .persist(&path)
            .map_err(|error| error.error)?;

        Ok(path)
    }
}

/// Serialize `rows` as CSV with `header` as the first line, even when there
/// are no rows.
fn to_csv<T: Serialize>(header: &[&str], rows: &[T]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(header)?;

    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::Serialization(error.to_string()))
}

/// Write `contents` to a uniquely named temporary file in `dir`.
///
/// Persisting the file moves it into place in one rename, so readers never
/// see a partially written file and concurrent writers do not share a
/// temporary path. The file is deleted if it is dropped without persisting.
fn stage_file(dir: &Path, contents: &[u8]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;

    Ok(file)
}
