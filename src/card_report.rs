//! The endpoint for comparing credit cards against a user's saved spending.

use std::{path::PathBuf, sync::Arc};

use axum::{
    Json,
    extract::{FromRef, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, CardComparison, Catalog, CategoryTotals, Error, FileStore, UserId, compare};

/// The saved result of comparing every card against a user's spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsReport {
    /// The user the report was generated for.
    pub user_id: UserId,
    /// The result for each card, keyed by card name.
    pub cards: CardComparison,
}

/// The state needed for generating savings reports.
#[derive(Debug, Clone)]
pub struct CardReportState {
    /// The cards to compare.
    pub catalog: Arc<Catalog>,
    /// Where user data is read from and reports are saved.
    pub store: FileStore,
}

impl FromRef<AppState> for CardReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            catalog: state.catalog.clone(),
            store: state.store.clone(),
        }
    }
}

/// The request body for a savings report.
///
/// Exactly one of `user_id` and `email` identifies the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardReportRequest {
    /// The user whose saved data should be compared.
    #[serde(default)]
    pub user_id: Option<String>,
    /// The email address of the user whose saved data should be compared.
    #[serde(default)]
    pub email: Option<String>,
}

/// The response body for a savings report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardReportResponse {
    /// The user the report was generated for.
    pub user_id: UserId,
    /// The card with the lowest effective cost.
    pub best_card: String,
    /// The full report, as saved.
    pub report: SavingsReport,
}

/// Compare every card in `catalog` against the category rollup saved for
/// `user_id` and save the result next to the user's data.
///
/// Returns the report and the path it was saved to.
///
/// # Errors
/// Returns an [Error::MissingUserData] if no data has been generated for the
/// user, an [Error::CorruptUserData] if the saved rollup cannot be read, or
/// any error from comparing the cards or saving the report.
pub fn generate_savings_report(
    store: &FileStore,
    catalog: &Catalog,
    user_id: &UserId,
) -> Result<(SavingsReport, PathBuf), Error> {
    let rollup = store.load_category_rollup(user_id)?;
    let totals = CategoryTotals::from(rollup.as_slice());
    let cards = compare(&totals, &catalog.cards)?;

    let report = SavingsReport {
        user_id: user_id.clone(),
        cards,
    };
    let path = store.save_report(&report)?;

    tracing::info!(
        "Compared {} cards over ${:.2} of spending for {user_id}, best card is {}",
        report.cards.cards().len(),
        totals.total(),
        report.cards.best_card()
    );

    Ok((report, path))
}

/// A route handler for generating, saving and returning a user's savings report.
pub async fn card_report_endpoint(
    State(state): State<CardReportState>,
    Json(request): Json<CardReportRequest>,
) -> Result<Json<CardReportResponse>, Error> {
    let user_id = UserId::from_id_or_email(request.user_id.as_deref(), request.email.as_deref())?;
    let (report, _) = generate_savings_report(&state.store, &state.catalog, &user_id)?;

    Ok(Json(CardReportResponse {
        user_id,
        best_card: report.cards.best_card().to_owned(),
        report,
    }))
}

#[cfg(test)]
mod card_report_tests {
    use std::fs;

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        AppState, BASELINE_CARD_NAME, Catalog, Error, FileStore, UserId, endpoints,
        transaction::CategoryRollupRow,
    };

    use super::{SavingsReport, card_report_endpoint, generate_savings_report};

    fn rollup_row(rank: usize, category: &str, total_spent: f64) -> CategoryRollupRow {
        CategoryRollupRow {
            rank,
            category: category.to_owned(),
            total_spent,
            transaction_count: 1,
            average_per_transaction: total_spent,
        }
    }

    fn save_rollup(store: &FileStore, user_id: &UserId) {
        let rows = [rollup_row(1, "Gas", 100.0), rollup_row(2, "Groceries", 50.0)];
        store.save_user_data(user_id, &[], &rows, &[]).unwrap();
    }

    fn get_test_server(store: FileStore) -> TestServer {
        let state = AppState::new(Catalog::default(), store, "Etc/UTC").unwrap();
        let app = Router::new()
            .route(endpoints::CARD_REPORT, post(card_report_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[test]
    fn report_ranks_cards_and_saves_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user_id = UserId::new("alice").unwrap();
        save_rollup(&store, &user_id);

        let (report, path) =
            generate_savings_report(&store, &Catalog::default(), &user_id).unwrap();

        assert_eq!(report.cards.best_card(), "Platinum Rewards Visa");
        let platinum = report.cards.get("Platinum Rewards Visa").unwrap();
        assert_eq!(platinum.rewards_earned, 4.0);
        assert_eq!(platinum.effective_cost, 146.0);
        assert_eq!(platinum.savings_vs_debit, 4.0);
        let debit = report.cards.get(BASELINE_CARD_NAME).unwrap();
        assert_eq!(debit.effective_cost, 150.0);

        let saved: SavingsReport =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved, report);
    }

    #[test]
    fn report_without_data_is_missing_user_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user_id = UserId::new("nobody").unwrap();

        let result = generate_savings_report(&store, &Catalog::default(), &user_id);

        assert!(matches!(result, Err(Error::MissingUserData(_))));
        assert!(!store.report_path(&user_id).exists());
    }

    #[test]
    fn report_with_malformed_rollup_is_corrupt_user_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user_id = UserId::new("alice").unwrap();
        let paths = store.data_paths(&user_id);
        fs::create_dir_all(paths.top_categories_path.parent().unwrap()).unwrap();
        fs::write(
            &paths.top_categories_path,
            "rank,category,total_spent,transaction_count,average_per_transaction\n1,Gas,lots,2,3\n",
        )
        .unwrap();

        let result = generate_savings_report(&store, &Catalog::default(), &user_id);

        assert!(matches!(result, Err(Error::CorruptUserData(_))));
    }

    #[test]
    fn report_for_user_without_spending_ties_on_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user_id = UserId::new("alice").unwrap();
        store.save_user_data(&user_id, &[], &[], &[]).unwrap();

        let (report, _) = generate_savings_report(&store, &Catalog::default(), &user_id).unwrap();

        assert!(
            report
                .cards
                .cards()
                .values()
                .all(|result| result.effective_cost == 0.0 && result.savings_percentage == 0.0)
        );
    }

    #[tokio::test]
    async fn endpoint_returns_best_card_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let user_id = UserId::new("bob").unwrap();
        save_rollup(&store, &user_id);
        let server = get_test_server(store);

        let response = server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "user_id": "bob" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user_id"], "bob");
        assert_eq!(body["best_card"], "Platinum Rewards Visa");
        assert_eq!(body["report"]["user_id"], "bob");
        assert_eq!(
            body["report"]["cards"]["Cash Back Visa"]["effective_cost"],
            147.75
        );
        assert!(dir.path().join("bob/card_savings_comparison.json").is_file());
    }

    #[tokio::test]
    async fn endpoint_responds_not_found_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        let response = server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "user_id": "nobody" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn endpoint_accepts_email_in_place_of_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        save_rollup(&store, &UserId::from_email("jo.bloggs@example.com").unwrap());
        let server = get_test_server(store);

        let response = server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "email": "jo.bloggs@example.com" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user_id"], "jo_bloggs_example_com");
        assert_eq!(body["best_card"], "Platinum Rewards Visa");
    }

    #[tokio::test]
    async fn endpoint_rejects_invalid_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "user_id": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
