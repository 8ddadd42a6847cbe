//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{Catalog, Error, FileStore};

/// The default number of days before today that generated transactions are
/// dated within.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// The default maximum number of transactions a single request may generate.
pub const DEFAULT_MAX_TRANSACTIONS: i64 = 100_000;

/// The default maximum lookback window a single request may ask for, in days.
pub const DEFAULT_MAX_LOOKBACK_DAYS: u32 = 36_500;

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The merchants, category weights and cards, loaded once at start up.
    pub catalog: Arc<Catalog>,

    /// Where generated data and reports are saved.
    pub store: FileStore,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The default lookback window for generated transactions, in days.
    pub lookback_days: u32,

    /// The largest transaction count a client may ask for.
    pub max_transactions: i64,

    /// The largest lookback window a client may ask for, in days.
    pub max_lookback_days: u32,

    /// A fixed seed for the random number generator.
    ///
    /// When set, every generation request with the same parameters produces
    /// the same transactions.
    pub seed: Option<u64>,
}

impl AppState {
    /// Create a new [AppState] with the default lookback window and
    /// transaction limit.
    ///
    /// The catalog is validated and `local_timezone` should be a valid,
    /// canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an [Error::Configuration] if the catalog is invalid or the
    /// timezone is not recognised.
    pub fn new(catalog: Catalog, store: FileStore, local_timezone: &str) -> Result<Self, Error> {
        catalog.validate()?;
        crate::timezone::local_today(local_timezone)?;

        Ok(Self {
            catalog: Arc::new(catalog),
            store,
            local_timezone: local_timezone.to_owned(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
            max_lookback_days: DEFAULT_MAX_LOOKBACK_DAYS,
            seed: None,
        })
    }

    /// Set the default lookback window for generated transactions.
    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    /// Set the largest number of transactions a request may generate.
    pub fn with_max_transactions(mut self, max_transactions: i64) -> Self {
        self.max_transactions = max_transactions;
        self
    }

    /// Set the largest lookback window a request may ask for.
    pub fn with_max_lookback_days(mut self, max_lookback_days: u32) -> Self {
        self.max_lookback_days = max_lookback_days;
        self
    }

    /// Use a fixed seed for generating transactions.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// A random number generator seeded with `seed`, or from the operating
/// system's entropy source when there is no seed.
pub(crate) fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
