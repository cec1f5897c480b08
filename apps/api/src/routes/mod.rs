pub mod health;
pub mod ollama;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::prompt::handlers;
use crate::quality::handlers as quality;
use crate::state::AppState;
use crate::suggestions::handlers as suggestions;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Prompt library
        .route(
            "/api/v1/prompts",
            get(handlers::handle_list_prompts).post(handlers::handle_create_prompt),
        )
        .route(
            "/api/v1/prompts/:id",
            get(handlers::handle_get_prompt)
                .put(handlers::handle_update_prompt)
                .delete(handlers::handle_delete_prompt),
        )
        .route(
            "/api/v1/prompts/:id/versions",
            get(handlers::handle_list_versions),
        )
        .route(
            "/api/v1/prompts/:id/versions/:label",
            get(handlers::handle_get_version),
        )
        .route(
            "/api/v1/prompts/:id/rollback/:label",
            post(handlers::handle_rollback),
        )
        .route("/api/v1/prompts/:id/render", post(handlers::handle_render))
        .route(
            "/api/v1/variables/validate",
            post(handlers::handle_validate_variables),
        )
        // Quality scores
        .route(
            "/api/v1/prompts/:id/score",
            post(quality::handle_score_prompt),
        )
        .route(
            "/api/v1/prompts/:id/scores",
            get(quality::handle_list_scores),
        )
        // Suggestions
        .route(
            "/api/v1/prompts/:id/suggestions",
            get(suggestions::handle_list_suggestions)
                .post(suggestions::handle_generate_suggestions),
        )
        .route(
            "/api/v1/suggestions/:id",
            patch(suggestions::handle_update_suggestion),
        )
        // Local LLM runtime
        .route("/api/v1/ollama/models", get(ollama::handle_list_models))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::OllamaClient;
    use crate::suggestions::generator::HeuristicSuggester;

    fn test_config(database_url: &str) -> Config {
        Config {
            database_url: database_url.to_string(),
            ollama_base_url: "http://127.0.0.1:9".to_string(),
            ollama_model: "llama3".to_string(),
            ollama_timeout_secs: 1,
            enable_llm_suggestions: false,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn router_with(config: Config, db: sqlx::PgPool) -> Router {
        let llm = OllamaClient::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
            Duration::from_secs(1),
        )
        .unwrap();
        build_router(AppState {
            db,
            llm,
            config,
            suggester: Arc::new(HeuristicSuggester),
        })
    }

    /// Router over a pool that never connects; only DB-free paths are exercised.
    fn test_router() -> Router {
        let config = test_config("postgres://localhost/promptpilot_test");
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        router_with(config, db)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validate_variables_endpoint() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/v1/variables/validate",
                json!({
                    "content": "Translate {{text}} into {{language}}",
                    "variables": ["text"],
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["undeclared"], json!(["language"]));
        assert_eq!(body["placeholders"], json!(["text", "language"]));
    }

    #[tokio::test]
    async fn test_create_prompt_rejects_invalid_fields() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/v1/prompts",
                json!({ "name": "  ", "content": "Hello {{name}}" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("name must not be empty"));
        assert!(message.contains("undeclared variables: name"));
    }

    #[tokio::test]
    async fn test_update_without_fields_rejected() {
        let uri = format!("/api/v1/prompts/{}", uuid::Uuid::new_v4());
        let response = test_router()
            .oneshot(json_request("PUT", &uri, json!({ "version_label": "v9" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_prompt_id_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/prompts/not-a-uuid/versions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/nowhere")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "needs a Postgres instance in DATABASE_URL"]
    async fn test_concurrent_updates_with_same_label_conflict() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = crate::db::create_pool(&url).await.unwrap();
        let router = router_with(test_config(&url), db);

        let created = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/prompts",
                json!({ "name": "race", "content": "Say hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let router = router.clone();
            let uri = format!("/api/v1/prompts/{id}");
            tasks.spawn(async move {
                router
                    .oneshot(json_request(
                        "PUT",
                        &uri,
                        json!({ "content": format!("edit {i}"), "version_label": "release" }),
                    ))
                    .await
                    .unwrap()
                    .status()
            });
        }

        let (mut ok, mut conflict) = (0, 0);
        while let Some(status) = tasks.join_next().await {
            match status.unwrap() {
                StatusCode::OK => ok += 1,
                StatusCode::CONFLICT => conflict += 1,
                other => panic!("unexpected status {other}"),
            }
        }
        assert_eq!((ok, conflict), (1, 15));

        let versions = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/prompts/{id}/versions"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(versions).await;
        assert_eq!(body["versions"], json!(["v1", "release"]));

        let cleanup = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/prompts/{id}"))
            .body(Body::empty())
            .unwrap();
        let deleted = router.oneshot(cleanup).await.unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    }
}
