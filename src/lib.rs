//! Cardwise synthesizes mock transaction histories and works out which credit
//! card would have given a user the lowest effective cost for that spending.
//!
//! This library provides a small JSON API with two operations:
//! generating a user's synthetic transaction data, and producing a card
//! savings report from the category rollup of that data.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod card_report;
mod catalog;
mod comparison;
mod endpoints;
mod generate_data;
mod logging;
mod money;
mod routing;
mod store;
mod timezone;
mod transaction;
mod user_id;

pub use app_state::AppState;
pub use card_report::{CardReportResponse, SavingsReport, generate_savings_report};
pub use catalog::{BASELINE_CARD_NAME, Card, Catalog, DEFAULT_RATE_KEY, Merchant};
pub use comparison::{CardComparison, CardCostResult, CategoryTotals, compare};
pub use endpoints::{CARD_REPORT, GENERATE_DATA, HEALTH};
pub use generate_data::{GenerateDataResponse, generate_user_data};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{format_currency, round_to};
pub use routing::build_router;
pub use store::{DataPaths, FileStore};
pub use timezone::{get_local_offset, local_today};
pub use transaction::{
    CategoryRollupRow, MerchantRollupRow, Transaction, TransactionId, category_rollup, generate,
    merchant_rollup,
};
pub use user_id::UserId;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A caller supplied a value outside the accepted range, e.g. a
    /// non-positive transaction count or a negative spend total.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The user identifier is empty, too long or contains characters other
    /// than ASCII letters, digits, underscores and hyphens.
    #[error("invalid user ID \"{0}\"")]
    InvalidUserId(String),

    /// The merchant or card catalog cannot be used as configured.
    ///
    /// For example, a card has no rate for a spend category and no default
    /// rate to fall back on.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No generated data exists for the user.
    ///
    /// Clients should generate data for the user before asking for a report.
    #[error("no generated data found for user \"{0}\"")]
    MissingUserData(String),

    /// The stored data for a user could not be parsed.
    #[error("the stored data is malformed: {0}")]
    CorruptUserData(String),

    /// Reading or writing a file failed.
    #[error("an I/O error occurred: {0}")]
    Io(String),

    /// An error occurred while serializing a struct as CSV or JSON.
    #[error("could not serialize data: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialization(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Serialization(value.to_string())
    }
}

impl Error {
    /// The HTTP status code used when this error is returned to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) | Error::InvalidUserId(_) => StatusCode::BAD_REQUEST,
            Error::MissingUserData(_) => StatusCode::NOT_FOUND,
            Error::CorruptUserData(_) => StatusCode::PRECONDITION_FAILED,
            Error::Configuration(_) | Error::Io(_) | Error::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
