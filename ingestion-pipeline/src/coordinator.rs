use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{
    error::AppError,
    storage::{
        graph_store::GraphStoreDal,
        types::chunk::{Chunk, SourceType},
        vector_store::VectorStoreDal,
    },
    utils::embedding::EmbeddingProvider,
};
use serde_json::json;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{info, warn};

/// Everything `IngestionCoordinator::ingest` needs to turn one piece of
/// text into a stored chunk plus its graph edges.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub text: String,
    pub source_type: SourceType,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub doc_id: Option<String>,
    pub message_id: Option<String>,
    /// The instant the content occurred at. Defaults to the ingestion time
    /// when the caller doesn't supply one (e.g. whole-document ingestion).
    pub timestamp: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub is_twin_interaction: bool,
    pub metadata: HashMap<String, String>,
}

/// Runs the fixed four-step sequence every ingestion path shares:
/// validate, embed, upsert into the vector store, merge into the graph.
/// The two store writes are deliberately sequential — never
/// `tokio::try_join!`'d — so a graph-merge failure after a successful
/// vector upsert is observable as a distinguishable partial-ingest
/// outcome instead of a race between two independent writers.
#[derive(Clone)]
pub struct IngestionCoordinator {
    embedding: EmbeddingProvider,
    vector_store: VectorStoreDal,
    graph_store: GraphStoreDal,
}

impl IngestionCoordinator {
    pub fn new(
        embedding: EmbeddingProvider,
        vector_store: VectorStoreDal,
        graph_store: GraphStoreDal,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            graph_store,
        }
    }

    pub fn graph_store(&self) -> &GraphStoreDal {
        &self.graph_store
    }

    pub async fn ingest(&self, req: ChunkRequest) -> Result<Chunk, AppError> {
        validate(&req)?;

        let embedding = self.embedding.embed(&req.text).await?;

        let chunk = Chunk::new(
            req.text.clone(),
            embedding,
            req.source_type,
            req.user_id.clone(),
            req.project_id.clone(),
            req.session_id.clone(),
            req.doc_id.clone(),
            req.message_id.clone(),
            req.timestamp.unwrap_or_else(Utc::now),
            req.is_private,
            req.is_twin_interaction,
            req.metadata.clone(),
        );

        let stored = self.upsert_with_retry(chunk).await?;

        info!(chunk_id = %stored.id, source_type = ?req.source_type, "chunk stored in vector store");

        if let Err(err) = self.merge_graph(&req, &stored).await {
            warn!(chunk_id = %stored.id, error = %err, "graph merge failed after vector upsert");
            return Err(AppError::PartialIngest(format!(
                "chunk {} stored in vector store but graph merge failed: {err}",
                stored.id
            )));
        }

        Ok(stored)
    }

    async fn upsert_with_retry(&self, chunk: Chunk) -> Result<Chunk, AppError> {
        let strategy = ExponentialBackoff::from_millis(50).take(1);
        RetryIf::spawn(
            strategy,
            || {
                let chunk = chunk.clone();
                let vector_store = self.vector_store.clone();
                async move { vector_store.upsert(chunk).await }
            },
            |err: &AppError| err.is_retryable_conflict(),
        )
        .await
    }

    async fn merge_graph(&self, req: &ChunkRequest, chunk: &Chunk) -> Result<(), AppError> {
        if let Some(user_id) = &req.user_id {
            self.graph_store
                .merge_node("user_node", user_id, json!({}))
                .await?;
            let relation = if req.is_private { "owns" } else { "created" };
            self.graph_store
                .merge_edge(relation, "user_node", user_id, "chunk", &chunk.id, json!({}))
                .await?;
        }

        if let Some(project_id) = &req.project_id {
            self.graph_store
                .merge_node("project_node", project_id, json!({}))
                .await?;
            self.graph_store
                .merge_edge("part_of", "chunk", &chunk.id, "project_node", project_id, json!({}))
                .await?;
        }

        if let Some(session_id) = &req.session_id {
            self.graph_store
                .merge_node("session_node", session_id, json!({}))
                .await?;
            self.graph_store
                .merge_edge("part_of", "chunk", &chunk.id, "session_node", session_id, json!({}))
                .await?;

            if let Some(project_id) = &req.project_id {
                self.graph_store
                    .merge_edge(
                        "part_of",
                        "session_node",
                        session_id,
                        "project_node",
                        project_id,
                        json!({}),
                    )
                    .await?;
            }

            if let Some(user_id) = &req.user_id {
                self.graph_store
                    .merge_edge(
                        "participated_in",
                        "user_node",
                        user_id,
                        "session_node",
                        session_id,
                        json!({}),
                    )
                    .await?;
            }
        }

        match req.source_type {
            SourceType::DocumentChunk | SourceType::TranscriptSnippet => {
                if let Some(doc_id) = &req.doc_id {
                    self.graph_store
                        .merge_node(
                            "document_node",
                            doc_id,
                            json!({ "name": doc_id, "metadata": {} }),
                        )
                        .await?;
                    self.graph_store
                        .merge_edge("part_of", "chunk", &chunk.id, "document_node", doc_id, json!({}))
                        .await?;

                    if let Some(user_id) = &req.user_id {
                        self.graph_store
                            .merge_edge(
                                "uploaded",
                                "user_node",
                                user_id,
                                "document_node",
                                doc_id,
                                json!({}),
                            )
                            .await?;
                    }
                    if req.session_id.is_none() {
                        if let Some(project_id) = &req.project_id {
                            self.graph_store
                                .merge_edge(
                                    "part_of",
                                    "document_node",
                                    doc_id,
                                    "project_node",
                                    project_id,
                                    json!({}),
                                )
                                .await?;
                        }
                    }
                    if let Some(session_id) = &req.session_id {
                        self.graph_store
                            .merge_edge(
                                "attached_to",
                                "document_node",
                                doc_id,
                                "session_node",
                                session_id,
                                json!({}),
                            )
                            .await?;
                    }
                }
            }
            SourceType::Message => {
                if let Some(message_id) = &req.message_id {
                    self.graph_store
                        .merge_node("message_node", message_id, json!({ "session_id": req.session_id }))
                        .await?;
                    self.graph_store
                        .merge_edge("part_of", "chunk", &chunk.id, "message_node", message_id, json!({}))
                        .await?;

                    if let Some(user_id) = &req.user_id {
                        self.graph_store
                            .merge_edge(
                                "authored",
                                "user_node",
                                user_id,
                                "message_node",
                                message_id,
                                json!({}),
                            )
                            .await?;
                    }
                    if let Some(session_id) = &req.session_id {
                        self.graph_store
                            .merge_edge(
                                "posted_in",
                                "message_node",
                                message_id,
                                "session_node",
                                session_id,
                                json!({}),
                            )
                            .await?;
                    }
                }
            }
            SourceType::Query => {}
        }

        Ok(())
    }
}

fn validate(req: &ChunkRequest) -> Result<(), AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".into()));
    }
    if req.is_private && req.user_id.is_none() {
        return Err(AppError::InvalidInput(
            "is_private chunks require a user_id".into(),
        ));
    }
    match req.source_type {
        SourceType::DocumentChunk if req.doc_id.is_none() => {
            return Err(AppError::InvalidInput(
                "document_chunk requires a doc_id".into(),
            ))
        }
        SourceType::Message if req.message_id.is_none() => {
            return Err(AppError::InvalidInput(
                "message chunks require a message_id".into(),
            ))
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> ChunkRequest {
        ChunkRequest {
            text: "hello".into(),
            source_type: SourceType::Message,
            user_id: Some("u1".into()),
            project_id: None,
            session_id: None,
            doc_id: None,
            message_id: Some("m1".into()),
            timestamp: None,
            is_private: false,
            is_twin_interaction: false,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn rejects_empty_text() {
        let mut req = base_request();
        req.text = "   ".into();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_private_without_user() {
        let mut req = base_request();
        req.is_private = true;
        req.user_id = None;
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_message_without_message_id() {
        let mut req = base_request();
        req.message_id = None;
        assert!(validate(&req).is_err());
    }

    #[test]
    fn rejects_document_chunk_without_doc_id() {
        let mut req = base_request();
        req.source_type = SourceType::DocumentChunk;
        req.message_id = None;
        req.doc_id = None;
        assert!(validate(&req).is_err());
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(validate(&base_request()).is_ok());
    }
}
