use axum::{extract::{Path, Query, State}, Json};
use common::storage::filter::Filter;
use retrieval_pipeline::GroupScope;

use crate::{
    api_state::ApiState,
    dto::{
        ChunksResponse, ContextQuery, GroupContextQuery, GroupParticipantResponse,
        LegacyPrivateMemoryRequest, PreferenceQuery, PreferenceResponse, PrivateMemoryRequest,
        RelatedContentQuery, TopicQuery, UserContextQuery,
    },
    error::ApiError,
};

fn scope_filters(
    project_id: Option<&str>,
    session_id: Option<&str>,
    doc_id: Option<&str>,
) -> Vec<Filter> {
    let mut filters = Vec::new();
    if let Some(project_id) = project_id {
        filters.push(Filter::Eq("project_id".into(), project_id.into()));
    }
    if let Some(session_id) = session_id {
        filters.push(Filter::Eq("session_id".into(), session_id.into()));
    }
    if let Some(doc_id) = doc_id {
        filters.push(Filter::Eq("doc_id".into(), doc_id.into()));
    }
    filters
}

pub async fn retrieve_context(
    State(state): State<ApiState>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let mut filters = scope_filters(
        query.project_id.as_deref(),
        query.session_id.as_deref(),
        query.doc_id.as_deref(),
    );
    if let Some(user_id) = query.user_id.as_deref() {
        filters.push(Filter::Eq("user_id".into(), user_id.into()));
    }

    let envelope = state
        .retrieval
        .retrieve_context(
            &query.query_text,
            filters,
            query.limit,
            query.score_threshold,
            query.include_private,
            query.include_messages_to_twin,
            query.include_graph,
        )
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_user_context(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<UserContextQuery>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let filters = scope_filters(
        query.project_id.as_deref(),
        query.session_id.as_deref(),
        query.doc_id.as_deref(),
    );

    let envelope = state
        .retrieval
        .retrieve_user_context(
            &user_id,
            &query.query_text,
            filters,
            query.limit,
            query.score_threshold,
            query.include_private,
            query.include_messages_to_twin,
        )
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_private_memory(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Json(req): Json<PrivateMemoryRequest>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let envelope = state
        .retrieval
        .retrieve_private_memory(&user_id, &req.query_text, req.limit, req.score_threshold)
        .await?;

    Ok(Json(envelope.into()))
}

/// `POST /v1/retrieve/private_memory`, the legacy path carrying `user_id` in
/// the body instead of the URL.
pub async fn retrieve_private_memory_legacy(
    State(state): State<ApiState>,
    Json(req): Json<LegacyPrivateMemoryRequest>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let envelope = state
        .retrieval
        .retrieve_private_memory(&req.user_id, &req.query_text, req.limit, req.score_threshold)
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_user_preferences(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<PreferenceQuery>,
) -> Result<Json<PreferenceResponse>, ApiError> {
    let filters = scope_filters(query.project_id.as_deref(), query.session_id.as_deref(), None);

    let envelope = state
        .preference
        .resolve(
            &user_id,
            &query.decision_topic,
            filters,
            Some(query.score_threshold),
            query.limit,
            query.include_messages_to_twin,
        )
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_related_content(
    State(state): State<ApiState>,
    Query(query): Query<RelatedContentQuery>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let relationship_types = query.relationship_types();
    let envelope = state
        .retrieval
        .retrieve_related(
            &query.chunk_id,
            relationship_types,
            query.depth,
            query.include_private,
            query.limit,
        )
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_by_topic(
    State(state): State<ApiState>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<ChunksResponse>, ApiError> {
    let mut filters = scope_filters(
        query.project_id.as_deref(),
        query.session_id.as_deref(),
        None,
    );
    if let Some(user_id) = query.user_id.as_deref() {
        filters.push(Filter::Eq("user_id".into(), user_id.into()));
    }

    let envelope = state
        .retrieval
        .retrieve_by_topic(
            &query.topic_name,
            filters,
            query.limit,
            query.include_private,
            query.include_messages_to_twin,
            query.score_threshold,
        )
        .await?;

    Ok(Json(envelope.into()))
}

pub async fn retrieve_group_context(
    State(state): State<ApiState>,
    Query(query): Query<GroupContextQuery>,
) -> Result<Json<Vec<GroupParticipantResponse>>, ApiError> {
    let scope = match (query.session_id, query.project_id, query.team_id) {
        (Some(session_id), None, None) => GroupScope::Session(session_id),
        (None, Some(project_id), None) => GroupScope::Project(project_id),
        (None, None, Some(team_id)) => GroupScope::Team(team_id),
        _ => {
            return Err(ApiError::ValidationError(
                "exactly one of session_id, project_id, team_id is required".into(),
            ))
        }
    };

    let results = state
        .retrieval
        .retrieve_group_context(
            &query.query_text,
            scope,
            query.limit_per_user,
            query.score_threshold,
            query.include_private,
            query.include_messages_to_twin,
        )
        .await?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}
