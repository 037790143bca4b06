use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/records", get(handlers::get_records))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_records;
    use crate::storage::{upsert_all, SqliteStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    async fn do_get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory("copilot_usage").unwrap();
        let records = parse_records(&json!([
            { "day": "2024-01-01", "total_suggestions_count": 10,
              "breakdown": [{ "language": "go", "editor": "vscode", "suggestions_count": 10, "acceptances_count": 4 }] },
            { "day": "2024-01-02", "total_suggestions_count": 7 }
        ]));
        upsert_all(&store, &records).unwrap();
        store
    }

    #[tokio::test]
    async fn dashboard_lists_stored_days() {
        let app = router(AppState::new(seeded_store()));
        let (status, body) = do_get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("GitHub Copilot Metrics Dashboard"));
        assert!(body.find("2024-01-02").unwrap() < body.find("2024-01-01").unwrap());
    }

    #[tokio::test]
    async fn records_endpoint_returns_json_newest_first() {
        let app = router(AppState::new(seeded_store()));
        let (status, body) = do_get(app, "/api/records").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json[0]["day"], "2024-01-02");
        assert_eq!(json[1]["total_suggestions_count"], 10);
        assert_eq!(json[1]["breakdown"][0]["editor"], "vscode");
    }

    #[tokio::test]
    async fn missing_table_is_an_empty_dashboard() {
        let store = SqliteStore::open_in_memory("copilot_usage").unwrap();
        let app = router(AppState::new(store));
        let (status, body) = do_get(app, "/api/records").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }
}
