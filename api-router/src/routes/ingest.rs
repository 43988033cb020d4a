use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ingestion_pipeline::{DocumentConnector, MessageConnector};

use crate::{
    api_state::ApiState,
    dto::{
        ChunkIngestRequest, DocumentIngestRequest, DocumentIngestResponse, IngestResponse,
        MessageIngestRequest, UpdateDocumentMetadataRequest, UpdateDocumentMetadataResponse,
    },
    error::ApiError,
};

pub async fn ingest_message(
    State(state): State<ApiState>,
    Json(req): Json<MessageIngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let connector = MessageConnector::new(&state.ingestion);
    let chunk = connector
        .ingest_message(
            req.user_id,
            req.session_id,
            req.project_id,
            req.text,
            req.timestamp,
            req.message_id,
            req.is_twin_chat,
            req.is_private,
            req.metadata,
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            success: true,
            chunk_id: chunk.id,
        }),
    ))
}

pub async fn ingest_document(
    State(state): State<ApiState>,
    Json(req): Json<DocumentIngestRequest>,
) -> Result<(StatusCode, Json<DocumentIngestResponse>), ApiError> {
    let connector = DocumentConnector::new(&state.ingestion, state.chunker.clone());
    let chunks = connector
        .ingest_document(
            req.user_id,
            req.project_id,
            req.session_id,
            req.doc_id.clone(),
            req.doc_name,
            req.text,
            req.is_private,
        )
        .await?;

    let doc_id = chunks
        .first()
        .and_then(|c| c.doc_id.clone())
        .or(req.doc_id)
        .unwrap_or_default();
    let chunk_ids = chunks.iter().map(|c| c.id.clone()).collect::<Vec<_>>();

    Ok((
        StatusCode::ACCEPTED,
        Json(DocumentIngestResponse {
            success: true,
            doc_id,
            chunk_count: chunk_ids.len(),
            chunk_ids,
        }),
    ))
}

pub async fn ingest_chunk(
    State(state): State<ApiState>,
    Json(req): Json<ChunkIngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let connector = DocumentConnector::new(&state.ingestion, state.chunker.clone());
    let chunk = connector
        .ingest_chunk(
            req.user_id,
            req.session_id,
            req.doc_id,
            req.text,
            req.timestamp,
            req.is_private,
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            success: true,
            chunk_id: chunk.id,
        }),
    ))
}

pub async fn update_document_metadata(
    State(state): State<ApiState>,
    Path(doc_id): Path<String>,
    Json(req): Json<UpdateDocumentMetadataRequest>,
) -> Result<Json<UpdateDocumentMetadataResponse>, ApiError> {
    state
        .graph_store
        .update_document_metadata(&doc_id, req.metadata)
        .await?;

    Ok(Json(UpdateDocumentMetadataResponse {
        success: true,
        doc_id,
    }))
}
