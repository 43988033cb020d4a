use std::collections::HashMap;

use common::{
    error::AppError,
    storage::{
        graph_store::GraphStoreDal,
        types::chunk::SourceType,
        vector_store::VectorStoreDal,
    },
};
use ingestion_pipeline::{ChunkRequest, IngestionCoordinator};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub total: u64,
    pub counts_by_type: HashMap<String, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ClearReport {
    pub vector_rows_deleted: u64,
}

/// Operational surface for bootstrapping and resetting a deployment:
/// schema initialization, mock-corpus seeding, and all-or-nothing wipe.
/// Mirrors the teacher's `DataSeederService`/index-bootstrap split, folded
/// into one component per `spec.md` §4.8.
#[derive(Clone)]
pub struct AdminOps {
    ingestion: IngestionCoordinator,
    graph_store: GraphStoreDal,
    vector_store: VectorStoreDal,
}

impl AdminOps {
    pub fn new(
        ingestion: IngestionCoordinator,
        graph_store: GraphStoreDal,
        vector_store: VectorStoreDal,
    ) -> Self {
        Self {
            ingestion,
            graph_store,
            vector_store,
        }
    }

    /// Idempotent: safe to call on every boot. Node/edge uniqueness is
    /// structural (deterministic ids in `GraphStoreDal::merge_node`/
    /// `merge_edge`), so the only index this installs is the vector HNSW
    /// index on `chunk.embedding`.
    pub async fn initialize_schema(&self, embedding_dimension: usize) -> Result<(), AppError> {
        self.vector_store.ensure_index(embedding_dimension).await?;
        info!(embedding_dimension, "schema initialized");
        Ok(())
    }

    /// Ingests `chunks` sequentially (same ordering guarantee as any other
    /// ingestion path) and aggregates per-`source_type` counts.
    pub async fn seed(&self, chunks: Vec<ChunkRequest>) -> Result<SeedReport, AppError> {
        let mut report = SeedReport::default();
        for chunk in chunks {
            let label = source_type_label(chunk.source_type);
            self.ingestion.ingest(chunk).await?;
            report.total += 1;
            *report.counts_by_type.entry(label.to_string()).or_insert(0) += 1;
        }
        info!(total = report.total, "seed complete");
        Ok(report)
    }

    /// Convenience wrapper seeding the built-in mock corpus.
    pub async fn seed_default_corpus(&self) -> Result<SeedReport, AppError> {
        self.seed(default_corpus()).await
    }

    pub async fn clear_all(&self) -> Result<ClearReport, AppError> {
        self.graph_store.wipe_all().await?;
        let vector_rows_deleted = self.vector_store.clear().await?;
        info!(vector_rows_deleted, "all stores cleared");
        Ok(ClearReport {
            vector_rows_deleted,
        })
    }
}

fn source_type_label(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Message => "message",
        SourceType::DocumentChunk => "document_chunk",
        SourceType::TranscriptSnippet => "transcript_snippet",
        SourceType::Query => "query",
    }
}

/// A small fixed corpus spanning three users, two projects, and three
/// sessions, grounded in `twincore_backend/core/mock_data.py`'s
/// `initial_data_chunks` — enough to exercise every edge type listed in
/// `spec.md` §3 without shipping the original's full example set.
fn default_corpus() -> Vec<ChunkRequest> {
    const ALICE: &str = "user-alice";
    const BOB: &str = "user-bob";
    const CHARLIE: &str = "user-charlie";
    const PROJECT_BOOK_GEN: &str = "project-book-gen";
    const PROJECT_WEB_PAST: &str = "project-web-past";
    const SESSION_BOOK_CURRENT: &str = "session-book-current";
    const SESSION_BOOK_PAST: &str = "session-book-past";
    const SESSION_WEB_PAST: &str = "session-web-past";

    let mut chunks = Vec::new();

    chunks.push(document(
        Some(ALICE),
        None,
        None,
        "doc-alice-personal-ideas",
        "Idea: use stable diffusion for generating unique cover art styles based on genre.",
        true,
    ));
    chunks.push(document(
        Some(ALICE),
        Some(PROJECT_WEB_PAST),
        Some(SESSION_WEB_PAST),
        "doc-alice-meeting-notes-web",
        "Web project retro: need better task tracking. Bob suggested ClickUp.",
        false,
    ));
    chunks.push(document(
        Some(BOB),
        None,
        None,
        "doc-bob-marketing-notes",
        "Potential niche for book gen: keto recipes for busy programmers, high search volume.",
        true,
    ));
    chunks.push(document(
        Some(CHARLIE),
        None,
        None,
        "doc-charlie-tech-thoughts",
        "Exploring Markov chains for generating simple plot outlines before LLM refinement.",
        true,
    ));
    chunks.push(document(
        None,
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_PAST),
        "doc-bookgen-initial-scope",
        "Project goal: create an agent that takes a niche and outline, then drafts an ebook.",
        false,
    ));
    chunks.push(document(
        Some(BOB),
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_CURRENT),
        "doc-competitor-analysis",
        "Analysis summary: existing tools lack robust niche research integration.",
        false,
    ));

    chunks.push(transcript(
        ALICE,
        SESSION_BOOK_PAST,
        "doc-bookgen-past-transcript",
        "We need to decide on the core LLM. Claude 3 Opus seems good for long-form.",
    ));
    chunks.push(transcript(
        BOB,
        SESSION_BOOK_PAST,
        "doc-bookgen-past-transcript",
        "Agreed on Opus for quality, but maybe GPT-4 for brainstorming outlines.",
    ));

    chunks.push(message(
        CHARLIE,
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_PAST),
        "msg-charlie-plagiarism",
        "How are we handling plagiarism checks?",
        false,
        false,
    ));
    chunks.push(message(
        ALICE,
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_CURRENT),
        "msg-alice-roadmap",
        "Okay team, let's finalize the Q3 roadmap for the book generator.",
        false,
        false,
    ));
    chunks.push(message(
        BOB,
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_CURRENT),
        "msg-bob-priority",
        "My main priority is integrating the niche research tool.",
        false,
        false,
    ));
    chunks.push(message(
        CHARLIE,
        Some(PROJECT_BOOK_GEN),
        Some(SESSION_BOOK_CURRENT),
        "msg-charlie-outline",
        "I think improving the outline generation logic is critical first.",
        false,
        false,
    ));

    chunks.push(message(
        ALICE,
        None,
        None,
        "msg-alice-twin-gans",
        "Twin, what do you think about using GANs for cover image generation?",
        true,
        true,
    ));
    chunks.push(message(
        ALICE,
        None,
        None,
        "msg-alice-twin-keto",
        "I remember Bob mentioned exploring keto recipes as a niche market. Promising?",
        true,
        true,
    ));

    chunks
}

fn document(
    user_id: Option<&str>,
    project_id: Option<&str>,
    session_id: Option<&str>,
    doc_id: &str,
    text: &str,
    is_private: bool,
) -> ChunkRequest {
    ChunkRequest {
        text: text.to_string(),
        source_type: SourceType::DocumentChunk,
        user_id: user_id.map(str::to_string),
        project_id: project_id.map(str::to_string),
        session_id: session_id.map(str::to_string),
        doc_id: Some(doc_id.to_string()),
        message_id: None,
        timestamp: None,
        is_private,
        is_twin_interaction: false,
        metadata: HashMap::new(),
    }
}

fn transcript(user_id: &str, session_id: &str, doc_id: &str, text: &str) -> ChunkRequest {
    ChunkRequest {
        text: text.to_string(),
        source_type: SourceType::TranscriptSnippet,
        user_id: Some(user_id.to_string()),
        project_id: None,
        session_id: Some(session_id.to_string()),
        doc_id: Some(doc_id.to_string()),
        message_id: None,
        timestamp: None,
        is_private: false,
        is_twin_interaction: false,
        metadata: HashMap::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn message(
    user_id: &str,
    project_id: Option<&str>,
    session_id: Option<&str>,
    message_id: &str,
    text: &str,
    is_private: bool,
    is_twin_interaction: bool,
) -> ChunkRequest {
    ChunkRequest {
        text: text.to_string(),
        source_type: SourceType::Message,
        user_id: Some(user_id.to_string()),
        project_id: project_id.map(str::to_string),
        session_id: session_id.map(str::to_string),
        doc_id: None,
        message_id: Some(message_id.to_string()),
        timestamp: None,
        is_private,
        is_twin_interaction,
        metadata: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::{config::OpenAIConfig, Client};
    use common::{storage::db::SurrealDbClient, utils::embedding::EmbeddingProvider};
    use uuid::Uuid;

    async fn test_admin_ops() -> AdminOps {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("admin_test", &database)
            .await
            .expect("in-memory db");
        let vector_store = VectorStoreDal::new(db.clone());
        vector_store.ensure_index(3).await.expect("index");
        let graph_store = GraphStoreDal::new(db);
        let embedding = EmbeddingProvider::new(
            Client::with_config(OpenAIConfig::new().with_api_base("http://localhost:1")),
            "text-embedding-3-small".into(),
            3,
        );
        let ingestion =
            IngestionCoordinator::new(embedding, vector_store.clone(), graph_store.clone());
        AdminOps::new(ingestion, graph_store, vector_store)
    }

    #[test]
    fn default_corpus_covers_every_source_type() {
        let chunks = default_corpus();
        assert!(chunks
            .iter()
            .any(|c| c.source_type == SourceType::DocumentChunk));
        assert!(chunks
            .iter()
            .any(|c| c.source_type == SourceType::TranscriptSnippet));
        assert!(chunks.iter().any(|c| c.source_type == SourceType::Message));
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
    }

    #[test]
    fn default_corpus_twin_interactions_are_private() {
        let chunks = default_corpus();
        assert!(chunks
            .iter()
            .filter(|c| c.is_twin_interaction)
            .all(|c| c.is_private));
    }

    #[tokio::test]
    async fn initialize_schema_is_idempotent() {
        let admin = test_admin_ops().await;
        admin.initialize_schema(3).await.expect("first init");
        admin.initialize_schema(3).await.expect("second init");
    }

    #[tokio::test]
    async fn clear_all_on_empty_store_reports_zero() {
        let admin = test_admin_ops().await;
        let report = admin.clear_all().await.expect("clear_all");
        assert_eq!(report.vector_rows_deleted, 0);
    }
}
