use api_router::{api_routes_v1, api_state::ApiState};
use common::utils::config::get_config;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let api_state = ApiState::new(&config).await?;
    let app = api_routes_v1(&api_state).with_state(api_state);

    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!(address = %serve_address, "starting server");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    if let Err(err) = axum::serve(listener, app).await {
        error!(%err, "server error");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common::{storage::db::SurrealDbClient, utils::config::AppConfig};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn smoke_test_config(namespace: &str, database: &str) -> AppConfig {
        AppConfig {
            openai_api_key: "test-key".into(),
            openai_base_url: "https://example.com".into(),
            embedding_model: "text-embedding-3-small".into(),
            embedding_dimension: 3,
            surrealdb_address: "mem://".into(),
            surrealdb_username: "root".into(),
            surrealdb_password: "root".into(),
            surrealdb_namespace: namespace.into(),
            surrealdb_database: database.into(),
            http_port: 0,
            chunk_default_size: 1000,
            chunk_default_overlap: 200,
            default_score_threshold: 0.6,
            default_related_content_depth: 2,
        }
    }

    #[tokio::test]
    async fn smoke_startup_with_in_memory_surrealdb() {
        let namespace = "test_ns";
        let database = format!("test_db_{}", Uuid::new_v4());
        let config = smoke_test_config(namespace, &database);

        let db = SurrealDbClient::memory(namespace, &database)
            .await
            .expect("in-memory db");
        let api_state = ApiState::new_with_client(&config, db)
            .await
            .expect("failed to build api state against in-memory surrealdb");
        let app = api_routes_v1(&api_state).with_state(api_state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let ready_response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);
    }
}
