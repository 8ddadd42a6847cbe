//! Application router configuration.

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState, card_report::card_report_endpoint, endpoints,
    generate_data::generate_data_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::GENERATE_DATA, post(generate_data_endpoint))
        .route(endpoints::CARD_REPORT, post(card_report_endpoint))
        .route(endpoints::HEALTH, get(get_health))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Check whether the server is up.
async fn get_health() -> &'static str {
    "ok"
}

async fn get_404_not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no route for {}", uri.path()) })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{AppState, Catalog, FileStore, endpoints};

    use super::build_router;

    fn get_test_server(store: FileStore) -> TestServer {
        let state = AppState::new(Catalog::default(), store, "Etc/UTC")
            .unwrap()
            .with_seed(Some(7));

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn health_responds_ok() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_text("ok");
    }

    #[tokio::test]
    async fn unknown_route_responds_with_json_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        let response = server.get("/api/coffee").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "no route for /api/coffee");
    }

    #[tokio::test]
    async fn generate_then_report() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        server
            .post(endpoints::GENERATE_DATA)
            .json(&json!({ "user_id": "alice", "n_transactions": 120, "lookback_days": 30 }))
            .await
            .assert_status_ok();

        let response = server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "user_id": "alice" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let cards = body["report"]["cards"].as_object().unwrap();
        assert_eq!(cards.len(), 5);
        let mut ranks: Vec<u64> = cards
            .values()
            .map(|card| card["rank"].as_u64().unwrap())
            .collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);

        let best_card = body["best_card"].as_str().unwrap();
        assert_eq!(cards[best_card]["rank"], 1);
        // Every generated amount is positive, so rewards always beat the baseline.
        assert_ne!(best_card, "Debit Card");
        let debit_cost = cards["Debit Card"]["effective_cost"].as_f64().unwrap();
        assert!(cards[best_card]["effective_cost"].as_f64().unwrap() < debit_cost);
    }

    #[tokio::test]
    async fn report_before_generate_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        server
            .post(endpoints::CARD_REPORT)
            .json(&json!({ "user_id": "alice" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn huge_lookback_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        server
            .post(endpoints::GENERATE_DATA)
            .json(&json!({
                "user_id": "alice",
                "n_transactions": 1,
                "lookback_days": 4_000_000_000u32,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn zero_transactions_is_bad_request_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let server = get_test_server(FileStore::new(dir.path()));

        server
            .post(endpoints::GENERATE_DATA)
            .json(&json!({ "user_id": "alice", "n_transactions": 0 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
