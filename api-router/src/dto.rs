use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::storage::{
    graph_store::ProjectContext,
    types::chunk::{Chunk, SourceType},
    vector_store::ChunkSearchResult,
};
use retrieval_pipeline::{ChunkEnvelope, GroupParticipantResult, PreferenceEnvelope};
use serde::{Deserialize, Serialize};

/// The wire shape of a single chunk, grounded in `spec.md` §6's response
/// envelope: `{chunk_id, text, source_type, timestamp, user_id, project_id?,
/// session_id?, doc_id?, message_id?, score?, metadata{}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ContentChunk {
    pub chunk_id: String,
    pub text: String,
    pub source_type: SourceType,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub doc_id: Option<String>,
    pub message_id: Option<String>,
    pub score: Option<f32>,
    pub metadata: HashMap<String, String>,
}

impl ContentChunk {
    fn from_chunk(chunk: Chunk, score: Option<f32>) -> Self {
        Self {
            chunk_id: chunk.id,
            text: chunk.text,
            source_type: chunk.source_type,
            timestamp: chunk.timestamp,
            user_id: chunk.user_id,
            project_id: chunk.project_id,
            session_id: chunk.session_id,
            doc_id: chunk.doc_id,
            message_id: chunk.message_id,
            score,
            metadata: chunk.metadata,
        }
    }
}

impl From<ChunkSearchResult> for ContentChunk {
    fn from(result: ChunkSearchResult) -> Self {
        Self::from_chunk(result.chunk, Some(result.score))
    }
}

impl From<Chunk> for ContentChunk {
    fn from(chunk: Chunk) -> Self {
        Self::from_chunk(chunk, None)
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ProjectContextDto {
    pub participant_user_ids: Vec<String>,
    pub session_ids: Vec<String>,
    pub document_ids: Vec<String>,
}

impl From<ProjectContext> for ProjectContextDto {
    fn from(ctx: ProjectContext) -> Self {
        Self {
            participant_user_ids: ctx.participant_user_ids,
            session_ids: ctx.session_ids,
            document_ids: ctx.document_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ChunksResponse {
    pub chunks: Vec<ContentChunk>,
    pub total: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub project_contexts: HashMap<String, ProjectContextDto>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub session_participants: HashMap<String, Vec<String>>,
}

impl From<ChunkEnvelope> for ChunksResponse {
    fn from(envelope: ChunkEnvelope) -> Self {
        Self {
            chunks: envelope.chunks.into_iter().map(ContentChunk::from).collect(),
            total: envelope.total,
            project_contexts: envelope
                .project_contexts
                .into_iter()
                .map(|(id, ctx)| (id, ctx.into()))
                .collect(),
            session_participants: envelope.session_participants,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageIngestRequest {
    pub user_id: String,
    pub session_id: String,
    pub project_id: Option<String>,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub message_id: Option<String>,
    #[serde(default)]
    pub is_twin_chat: bool,
    pub is_private: Option<bool>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub chunk_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentIngestRequest {
    pub user_id: String,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub doc_id: Option<String>,
    pub doc_name: String,
    pub text: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentIngestResponse {
    pub success: bool,
    pub doc_id: String,
    pub chunk_ids: Vec<String>,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkIngestRequest {
    pub user_id: String,
    pub session_id: String,
    pub doc_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentMetadataRequest {
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateDocumentMetadataResponse {
    pub success: bool,
    pub doc_id: String,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextQuery {
    pub query_text: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub doc_id: Option<String>,
    pub include_private: Option<bool>,
    pub include_messages_to_twin: Option<bool>,
    #[serde(default)]
    pub include_graph: bool,
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserContextQuery {
    pub query_text: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub doc_id: Option<String>,
    pub include_private: Option<bool>,
    pub include_messages_to_twin: Option<bool>,
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrivateMemoryRequest {
    pub query_text: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub score_threshold: Option<f32>,
}

/// Legacy variant of `PrivateMemoryRequest` carrying its own `user_id`,
/// kept for `POST /v1/retrieve/private_memory` (§6's "legacy" path).
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyPrivateMemoryRequest {
    pub user_id: String,
    pub query_text: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedContentQuery {
    pub chunk_id: String,
    pub relationship_types: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u8,
    #[serde(default)]
    pub include_private: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_depth() -> u8 {
    2
}

impl RelatedContentQuery {
    pub fn relationship_types(&self) -> Vec<String> {
        self.relationship_types
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicQuery {
    pub topic_name: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub include_private: Option<bool>,
    pub include_messages_to_twin: Option<bool>,
    pub score_threshold: Option<f32>,
}

fn default_preference_limit() -> usize {
    5
}

fn default_preference_score_threshold() -> f32 {
    0.6
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceQuery {
    pub decision_topic: String,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default = "default_preference_limit")]
    pub limit: usize,
    #[serde(default = "default_true")]
    pub include_messages_to_twin: bool,
    #[serde(default = "default_preference_score_threshold")]
    pub score_threshold: f32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceStatementDto {
    pub text: String,
    pub score: Option<f32>,
    pub source: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceResponse {
    pub user_id: String,
    pub decision_topic: String,
    pub has_preferences: bool,
    pub preference_statements: Vec<PreferenceStatementDto>,
    pub graph_results_count: usize,
    pub vector_results_count: usize,
}

impl From<PreferenceEnvelope> for PreferenceResponse {
    fn from(envelope: PreferenceEnvelope) -> Self {
        Self {
            user_id: envelope.user_id,
            decision_topic: envelope.decision_topic,
            has_preferences: envelope.has_preferences,
            preference_statements: envelope
                .preference_statements
                .into_iter()
                .map(|hit| PreferenceStatementDto {
                    text: hit.text,
                    score: hit.score,
                    source: hit.source,
                })
                .collect(),
            graph_results_count: envelope.graph_results_count,
            vector_results_count: envelope.vector_results_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupContextQuery {
    pub query_text: String,
    pub session_id: Option<String>,
    pub project_id: Option<String>,
    pub team_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit_per_user: usize,
    #[serde(default)]
    pub include_private: bool,
    #[serde(default)]
    pub include_messages_to_twin: bool,
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupParticipantResponse {
    pub user_id: String,
    pub results: ChunksResponse,
}

impl From<GroupParticipantResult> for GroupParticipantResponse {
    fn from(result: GroupParticipantResult) -> Self {
        Self {
            user_id: result.user_id,
            results: result.results.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResponse {
    pub total: u64,
    pub counts_by_type: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub vector_rows_deleted: u64,
}
