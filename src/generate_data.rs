//! The endpoint for generating a user's synthetic transaction data.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Catalog, Error, FileStore, UserId,
    app_state::new_rng,
    store::DataPaths,
    timezone::local_today,
    transaction::{category_rollup, generate, merchant_rollup},
};

/// The number of transactions generated when the client does not specify one.
const DEFAULT_TRANSACTION_COUNT: i64 = 200;

/// The state needed for generating user data.
#[derive(Debug, Clone)]
pub struct GenerateDataState {
    /// The merchants and category weights to draw transactions from.
    pub catalog: Arc<Catalog>,
    /// Where the generated data is saved.
    pub store: FileStore,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The lookback window used when the client does not specify one.
    pub lookback_days: u32,
    /// The largest transaction count a client may ask for.
    pub max_transactions: i64,
    /// The largest lookback window a client may ask for.
    pub max_lookback_days: u32,
    /// A fixed seed for generating transactions, if any.
    pub seed: Option<u64>,
}

impl FromRef<AppState> for GenerateDataState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            catalog: state.catalog.clone(),
            store: state.store.clone(),
            local_timezone: state.local_timezone.clone(),
            lookback_days: state.lookback_days,
            max_transactions: state.max_transactions,
            max_lookback_days: state.max_lookback_days,
            seed: state.seed,
        }
    }
}

/// The request body for generating user data.
///
/// Exactly one of `user_id` and `email` identifies the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDataRequest {
    /// The user to generate data for.
    #[serde(default)]
    pub user_id: Option<String>,
    /// The email address of the user to generate data for.
    #[serde(default)]
    pub email: Option<String>,
    /// How many transactions to generate.
    #[serde(default = "default_transaction_count")]
    pub n_transactions: i64,
    /// How many days before today the transactions may be dated.
    #[serde(default)]
    pub lookback_days: Option<u32>,
}

fn default_transaction_count() -> i64 {
    DEFAULT_TRANSACTION_COUNT
}

/// The response body after generating user data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateDataResponse {
    /// The user the data was generated for.
    pub user_id: UserId,
    /// Where the generated files were saved.
    pub paths: DataPaths,
}

/// Generate `count` transactions for `user_id`, summarise them by category
/// and merchant, and save all three to `store`, replacing any previous data.
///
/// Nothing is written if the arguments are invalid.
///
/// # Errors
/// Returns an [Error::InvalidArgument] if `count` is not positive, or the
/// storage error if the files could not be written.
pub fn generate_user_data<R: Rng>(
    store: &FileStore,
    catalog: &Catalog,
    user_id: &UserId,
    count: i64,
    lookback_days: u32,
    today: Date,
    rng: &mut R,
) -> Result<DataPaths, Error> {
    let transactions = generate(catalog, count, lookback_days, today, rng)?;
    let categories = category_rollup(&transactions);
    let merchants = merchant_rollup(&transactions);

    store.save_user_data(user_id, &transactions, &categories, &merchants)
}

/// A route handler for generating and saving a user's transaction data.
///
/// Responds with the paths of the saved files.
pub async fn generate_data_endpoint(
    State(state): State<GenerateDataState>,
    Json(request): Json<GenerateDataRequest>,
) -> Result<Json<GenerateDataResponse>, Error> {
    let user_id = UserId::from_id_or_email(request.user_id.as_deref(), request.email.as_deref())?;

    if request.n_transactions > state.max_transactions {
        return Err(Error::InvalidArgument(format!(
            "cannot generate more than {} transactions, got {}",
            state.max_transactions, request.n_transactions
        )));
    }

    let lookback_days = request.lookback_days.unwrap_or(state.lookback_days);

    if lookback_days > state.max_lookback_days {
        return Err(Error::InvalidArgument(format!(
            "cannot look back more than {} days, got {lookback_days}",
            state.max_lookback_days
        )));
    }
    let today = local_today(&state.local_timezone)?;
    let mut rng = new_rng(state.seed);

    let paths = generate_user_data(
        &state.store,
        &state.catalog,
        &user_id,
        request.n_transactions,
        lookback_days,
        today,
        &mut rng,
    )?;

    tracing::info!(
        "Generated {} transactions over {lookback_days} days for {user_id}",
        request.n_transactions
    );

    Ok(Json(GenerateDataResponse { user_id, paths }))
}
