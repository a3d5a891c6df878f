pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        // Block edits
        .route("/api/v1/sessions/:id/blocks", post(handlers::handle_add_block))
        .route(
            "/api/v1/sessions/:id/blocks/move",
            post(handlers::handle_move_block),
        )
        .route(
            "/api/v1/sessions/:id/blocks/:block_id",
            put(handlers::handle_update_block).delete(handlers::handle_delete_block),
        )
        .route(
            "/api/v1/sessions/:id/blocks/:block_id/toggle",
            post(handlers::handle_toggle_block),
        )
        // Entry and skill edits
        .route(
            "/api/v1/sessions/:id/blocks/:block_id/entries",
            post(handlers::handle_add_entry),
        )
        .route(
            "/api/v1/sessions/:id/blocks/:block_id/entries/:entry_id",
            put(handlers::handle_update_entry).delete(handlers::handle_delete_entry),
        )
        .route(
            "/api/v1/sessions/:id/blocks/:block_id/skills",
            post(handlers::handle_add_skill),
        )
        .route(
            "/api/v1/sessions/:id/blocks/:block_id/skills/:index",
            axum::routing::delete(handlers::handle_remove_skill),
        )
        // History, save, preview
        .route("/api/v1/sessions/:id/undo", post(handlers::handle_undo))
        .route("/api/v1/sessions/:id/redo", post(handlers::handle_redo))
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save))
        .route(
            "/api/v1/sessions/:id/preview",
            get(handlers::handle_preview),
        )
        .route(
            "/api/v1/sessions/:id/notifications",
            get(handlers::handle_notifications),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::models::profile::ProfileSnapshot;
    use crate::profile_client::InMemoryProfileStore;

    fn test_state() -> (AppState, Arc<InMemoryProfileStore>) {
        let config = Config {
            port: 0,
            rust_log: "debug".to_string(),
            profile_service_url: None,
            profile_service_token: None,
            autosave_quiet: Duration::from_secs(5),
            notification_backlog: 10,
        };
        let profiles = Arc::new(InMemoryProfileStore::new(ProfileSnapshot {
            name: "Ada".to_string(),
            ..Default::default()
        }));
        (AppState::new(config, profiles.clone()), profiles)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open(app: &Router) -> (String, Value) {
        let (status, body) = call(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        (body["session_id"].as_str().unwrap().to_string(), body)
    }

    fn block_id(view: &Value, block_type: &str) -> String {
        view["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["type"] == block_type)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_open_session_seeds_blocks() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (_, view) = open(&app).await;
        assert_eq!(view["blocks"].as_array().unwrap().len(), 6);
        assert_eq!(view["blocks"][0]["type"], "personal");
        assert_eq!(view["blocks"][0]["data"]["name"], "Ada");
        assert_eq!(view["dirty"], false);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (state, _) = test_state();
        let app = build_router(state);
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_add_invalid_block_is_400() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (id, _) = open(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/blocks"),
            Some(json!({ "type": "hobbies" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_BLOCK_TYPE");
    }

    #[tokio::test]
    async fn test_edit_undo_redo_flow() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (id, view) = open(&app).await;
        let experience = block_id(&view, "experience");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/blocks/{experience}/entries"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entry = body["created_id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/blocks/{experience}/entries/{entry}"),
            Some(json!({ "title": "Intern" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["dirty"], true);
        assert_eq!(body["session"]["blocks"][2]["data"][0]["title"], "Intern");
        assert_eq!(body["session"]["autosave_pending"], true);

        let (_, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/undo"), None).await;
        assert_eq!(body["applied"], true);
        assert_eq!(body["session"]["blocks"][2]["data"][0]["title"], "");
        assert_eq!(body["session"]["can_redo"], true);

        let (_, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/redo"), None).await;
        assert_eq!(body["session"]["blocks"][2]["data"][0]["title"], "Intern");
    }

    #[tokio::test]
    async fn test_move_out_of_bounds_is_not_applied() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (id, _) = open(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/blocks/move"),
            Some(json!({ "index": 0, "direction": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], false);
        assert_eq!(body["session"]["can_undo"], false);
    }

    #[tokio::test]
    async fn test_manual_save_persists_and_notifies() {
        let (state, profiles) = test_state();
        let app = build_router(state);
        let (id, view) = open(&app).await;
        let skills = block_id(&view, "skills");

        call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/blocks/{skills}/skills"),
            Some(json!({ "skill": " Rust " })),
        )
        .await;

        let (status, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "saved");
        assert_eq!(body["session"]["dirty"], false);
        assert_eq!(profiles.snapshot().await.skills, vec!["Rust".to_string()]);

        let (_, notes) = call(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/notifications"),
            None,
        )
        .await;
        assert_eq!(notes[0]["level"], "success");

        let (_, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/save"), None).await;
        assert_eq!(body["outcome"]["status"], "skipped");
        assert_eq!(body["outcome"]["reason"], "clean");
    }

    #[tokio::test]
    async fn test_preview_and_close() {
        let (state, profiles) = test_state();
        let app = build_router(state.clone());
        let (id, view) = open(&app).await;
        let summary = block_id(&view, "summary");

        let (status, _) = call(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/blocks/{summary}"),
            Some(json!({
                "id": summary,
                "type": "summary",
                "collapsed": false,
                "data": { "text": "Analyst" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, "GET", &format!("/api/v1/sessions/{id}/preview"), None).await;
        assert!(body["markdown"].as_str().unwrap().contains("## Summary\n\nAnalyst"));

        let (status, body) = call(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "saved");
        assert_eq!(profiles.snapshot().await.summary, "Analyst");
        assert!(state.sessions.read().await.is_empty());
    }
}
