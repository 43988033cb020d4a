use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chunker::Chunker;
use common::{error::AppError, storage::types::chunk::SourceType};
use serde_json::json;
use uuid::Uuid;

use crate::coordinator::{ChunkRequest, IngestionCoordinator};

/// Ingests a single chat message. `message_id` is generated when absent;
/// `is_private` defaults to `is_twin_chat` unless the caller overrides it
/// explicitly — preserved from the prototype this was grounded on rather
/// than revisited, since nothing in the spec's invariants depends on the
/// choice either way.
pub struct MessageConnector<'a> {
    coordinator: &'a IngestionCoordinator,
}

impl<'a> MessageConnector<'a> {
    pub fn new(coordinator: &'a IngestionCoordinator) -> Self {
        Self { coordinator }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_message(
        &self,
        user_id: String,
        session_id: String,
        project_id: Option<String>,
        text: String,
        timestamp: Option<DateTime<Utc>>,
        message_id: Option<String>,
        is_twin_chat: bool,
        is_private: Option<bool>,
        metadata: HashMap<String, String>,
    ) -> Result<common::storage::types::chunk::Chunk, AppError> {
        let message_id = message_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let is_private = is_private.unwrap_or(is_twin_chat);

        self.coordinator
            .ingest(ChunkRequest {
                text,
                source_type: SourceType::Message,
                user_id: Some(user_id),
                project_id,
                session_id: Some(session_id),
                doc_id: None,
                message_id: Some(message_id),
                timestamp,
                is_private,
                is_twin_interaction: is_twin_chat,
                metadata,
            })
            .await
    }
}

/// Ingests whole documents (chunked via `chunker::Chunker`) and individual
/// transcript utterances.
pub struct DocumentConnector<'a> {
    coordinator: &'a IngestionCoordinator,
    chunker: Chunker,
}

impl<'a> DocumentConnector<'a> {
    pub fn new(coordinator: &'a IngestionCoordinator, chunker: Chunker) -> Self {
        Self {
            coordinator,
            chunker,
        }
    }

    /// Splits `text` into chunks sharing one `doc_id`, each carrying
    /// `{original_document, chunk_index, total_chunks}` metadata.
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_document(
        &self,
        user_id: String,
        project_id: Option<String>,
        session_id: Option<String>,
        doc_id: Option<String>,
        doc_name: String,
        text: String,
        is_private: bool,
    ) -> Result<Vec<common::storage::types::chunk::Chunk>, AppError> {
        if doc_name.trim().is_empty() {
            return Err(AppError::InvalidInput("doc_name must not be empty".into()));
        }
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("text must not be empty".into()));
        }

        let doc_id = doc_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let pieces = self.chunker.chunk(&text);
        let total_chunks = pieces.len();

        let mut stored = Vec::with_capacity(total_chunks);
        for (chunk_index, piece) in pieces.into_iter().enumerate() {
            let mut metadata = HashMap::new();
            metadata.insert("original_document".to_string(), doc_name.clone());
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());
            metadata.insert("total_chunks".to_string(), total_chunks.to_string());

            let stored_chunk = self
                .coordinator
                .ingest(ChunkRequest {
                    text: piece,
                    source_type: SourceType::DocumentChunk,
                    user_id: Some(user_id.clone()),
                    project_id: project_id.clone(),
                    session_id: session_id.clone(),
                    doc_id: Some(doc_id.clone()),
                    message_id: None,
                    timestamp: None,
                    is_private,
                    is_twin_interaction: false,
                    metadata,
                })
                .await?;
            stored.push(stored_chunk);
        }

        Ok(stored)
    }

    /// Ingests a single transcript utterance. Required fields mirror the
    /// prototype's `chunk_data` validation: `user_id, session_id, doc_id,
    /// text, timestamp`. The parent transcript document is pre-merged with
    /// the default name `"Transcript Document <doc_id>"` if it doesn't
    /// already exist, and attached to the session.
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_chunk(
        &self,
        user_id: String,
        session_id: String,
        doc_id: String,
        text: String,
        timestamp: DateTime<Utc>,
        is_private: bool,
    ) -> Result<common::storage::types::chunk::Chunk, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("text must not be empty".into()));
        }

        let default_name = format!("Transcript Document {doc_id}");
        self.coordinator
            .graph_store()
            .merge_node(
                "document_node",
                &doc_id,
                json!({ "name": default_name, "source_type": "transcript", "metadata": {} }),
            )
            .await?;
        self.coordinator
            .graph_store()
            .merge_edge(
                "attached_to",
                "document_node",
                &doc_id,
                "session_node",
                &session_id,
                json!({}),
            )
            .await?;

        self.coordinator
            .ingest(ChunkRequest {
                text,
                source_type: SourceType::TranscriptSnippet,
                user_id: Some(user_id),
                project_id: None,
                session_id: Some(session_id),
                doc_id: Some(doc_id),
                message_id: None,
                timestamp: Some(timestamp),
                is_private,
                is_twin_interaction: false,
                metadata: HashMap::new(),
            })
            .await
    }
}
