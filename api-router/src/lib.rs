use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{delete, get, post},
    Router,
};
use routes::{
    admin::{clear_data, seed_data},
    ingest::{ingest_chunk, ingest_document, ingest_message, update_document_metadata},
    liveness::live,
    readiness::ready,
    retrieve::{
        retrieve_by_topic, retrieve_context, retrieve_group_context, retrieve_private_memory,
        retrieve_private_memory_legacy, retrieve_related_content, retrieve_user_context,
        retrieve_user_preferences,
    },
};

pub mod api_state;
pub mod dto;
pub mod error;
mod routes;

/// Router for API functionality, version 1. No auth layer — this service
/// has no authentication concept (§6).
pub fn api_routes_v1<S>(_app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/v1/ingest/message", post(ingest_message))
        .route("/v1/ingest/document", post(ingest_document))
        .route("/v1/ingest/chunk", post(ingest_chunk))
        .route(
            "/v1/documents/{doc_id}/metadata",
            post(update_document_metadata),
        )
        .route("/v1/retrieve/context", get(retrieve_context))
        .route(
            "/v1/retrieve/private_memory",
            post(retrieve_private_memory_legacy),
        )
        .route(
            "/v1/users/{user_id}/private_memory",
            post(retrieve_private_memory),
        )
        .route("/v1/users/{user_id}/context", get(retrieve_user_context))
        .route(
            "/v1/users/{user_id}/preferences",
            get(retrieve_user_preferences),
        )
        .route("/v1/retrieve/related_content", get(retrieve_related_content))
        .route("/v1/retrieve/topic", get(retrieve_by_topic))
        .route("/v1/retrieve/group", get(retrieve_group_context))
        .route("/v1/admin/api/seed_data", post(seed_data))
        .route("/v1/admin/api/clear_data", delete(clear_data))
}
