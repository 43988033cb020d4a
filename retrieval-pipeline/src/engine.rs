use std::collections::{HashMap, HashSet};

use common::{
    error::AppError,
    storage::{
        filter::Filter,
        graph_store::{GraphStoreDal, ProjectContext},
        vector_store::{ChunkSearchResult, VectorStoreDal},
        types::chunk::{Chunk, SourceType},
    },
    utils::embedding::EmbeddingProvider,
};
use futures::future::join_all;
use ingestion_pipeline::{ChunkRequest, IngestionCoordinator};
use tracing::{info, warn};

/// A result set plus graph enrichment collected against the project/session
/// ids seen among the matched chunks. The maps are empty unless the caller
/// asked for `include_graph`.
#[derive(Debug, Clone, Default)]
pub struct ChunkEnvelope {
    pub chunks: Vec<ChunkSearchResult>,
    pub total: usize,
    pub project_contexts: HashMap<String, ProjectContext>,
    pub session_participants: HashMap<String, Vec<String>>,
}

impl ChunkEnvelope {
    fn from_results(chunks: Vec<ChunkSearchResult>) -> Self {
        let total = chunks.len();
        Self {
            chunks,
            total,
            project_contexts: HashMap::new(),
            session_participants: HashMap::new(),
        }
    }
}

/// The one scope dimension `retrieve_group_context` accepts — exactly one
/// variant is active per call.
#[derive(Debug, Clone)]
pub enum GroupScope {
    Session(String),
    Project(String),
    Team(String),
}

#[derive(Debug, Clone)]
pub struct GroupParticipantResult {
    pub user_id: String,
    pub results: ChunkEnvelope,
}

/// Per-endpoint default visibility, read by the engine core instead of
/// branching on which public method was called.
struct EndpointDefaults {
    include_private: bool,
    include_twin: bool,
}

const SHARED_CONTEXT_DEFAULTS: EndpointDefaults = EndpointDefaults {
    include_private: false,
    include_twin: false,
};
const USER_CONTEXT_DEFAULTS: EndpointDefaults = EndpointDefaults {
    include_private: true,
    include_twin: true,
};
const TOPIC_DEFAULTS: EndpointDefaults = EndpointDefaults {
    include_private: false,
    include_twin: false,
};

fn push_visibility_filters(filters: &mut Vec<Filter>, include_private: bool, include_twin: bool) {
    if !include_private {
        filters.push(Filter::Eq("is_private".into(), false.into()));
    }
    if !include_twin {
        filters.push(Filter::Eq("is_twin_interaction".into(), false.into()));
    }
}

/// Composes `EmbeddingProvider`, `VectorStoreDal`, and `GraphStoreDal` into
/// the retrieval flavors `spec.md` §4.6 names. Holds an `IngestionCoordinator`
/// only for `retrieve_private_memory`'s query auto-ingestion side effect.
#[derive(Clone)]
pub struct RetrievalEngine {
    embedding: EmbeddingProvider,
    vector_store: VectorStoreDal,
    graph_store: GraphStoreDal,
    ingestion: IngestionCoordinator,
}

impl RetrievalEngine {
    pub fn new(
        embedding: EmbeddingProvider,
        vector_store: VectorStoreDal,
        graph_store: GraphStoreDal,
        ingestion: IngestionCoordinator,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            graph_store,
            ingestion,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn retrieve_context(
        &self,
        query: &str,
        mut filters: Vec<Filter>,
        limit: usize,
        score_threshold: Option<f32>,
        include_private: Option<bool>,
        include_twin: Option<bool>,
        include_graph: bool,
    ) -> Result<ChunkEnvelope, AppError> {
        push_visibility_filters(
            &mut filters,
            include_private.unwrap_or(SHARED_CONTEXT_DEFAULTS.include_private),
            include_twin.unwrap_or(SHARED_CONTEXT_DEFAULTS.include_twin),
        );

        let embedding = self.embedding.embed(query).await?;
        let results = self
            .vector_store
            .search(&embedding, &filters, limit, score_threshold)
            .await?;

        let mut envelope = ChunkEnvelope::from_results(results);
        if include_graph {
            self.enrich_with_graph(&mut envelope).await;
        }
        Ok(envelope)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn retrieve_user_context(
        &self,
        user_id: &str,
        query: &str,
        mut filters: Vec<Filter>,
        limit: usize,
        score_threshold: Option<f32>,
        include_private: Option<bool>,
        include_twin: Option<bool>,
    ) -> Result<ChunkEnvelope, AppError> {
        filters.push(Filter::Eq("user_id".into(), user_id.into()));
        push_visibility_filters(
            &mut filters,
            include_private.unwrap_or(USER_CONTEXT_DEFAULTS.include_private),
            include_twin.unwrap_or(USER_CONTEXT_DEFAULTS.include_twin),
        );

        let embedding = self.embedding.embed(query).await?;
        let results = self
            .vector_store
            .search(&embedding, &filters, limit, score_threshold)
            .await?;
        Ok(ChunkEnvelope::from_results(results))
    }

    /// Ingests `query` as a private, twin-interaction chunk owned by
    /// `user_id` before searching. Ingestion failure is logged and does not
    /// block the search (best-effort side effect).
    pub async fn retrieve_private_memory(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<ChunkEnvelope, AppError> {
        let ingest = self
            .ingestion
            .ingest(ChunkRequest {
                text: query.to_string(),
                source_type: SourceType::Query,
                user_id: Some(user_id.to_string()),
                project_id: None,
                session_id: None,
                doc_id: None,
                message_id: None,
                timestamp: None,
                is_private: true,
                is_twin_interaction: true,
                metadata: HashMap::new(),
            })
            .await;
        if let Err(err) = ingest {
            warn!(user_id, error = %err, "query auto-ingestion failed for retrieve_private_memory");
        }

        let filters = vec![
            Filter::Eq("user_id".into(), user_id.into()),
            Filter::Eq("is_private".into(), true.into()),
        ];
        let embedding = self.embedding.embed(query).await?;
        let results = self
            .vector_store
            .search(&embedding, &filters, limit, score_threshold)
            .await?;
        Ok(ChunkEnvelope::from_results(results))
    }

    /// Fans out one vector search per participant, concurrently, each
    /// isolated from the others' failures.
    pub async fn retrieve_group_context(
        &self,
        query: &str,
        scope: GroupScope,
        limit_per_user: usize,
        score_threshold: Option<f32>,
        include_private: bool,
        include_twin: bool,
    ) -> Result<Vec<GroupParticipantResult>, AppError> {
        let (participants, scope_filter) = match &scope {
            GroupScope::Session(session_id) => (
                self.graph_store.session_participants(session_id).await?,
                Filter::Eq("session_id".into(), session_id.clone().into()),
            ),
            GroupScope::Project(project_id) => (
                self.graph_store.project_participants(project_id).await?,
                Filter::Eq("project_id".into(), project_id.clone().into()),
            ),
            GroupScope::Team(team_id) => {
                info!(team_id, "retrieve_group_context: team scope is reserved, returning empty envelope");
                return Ok(Vec::new());
            }
        };

        let embedding = self.embedding.embed(query).await?;

        let tasks = participants.into_iter().map(|user_id| {
            let embedding = embedding.clone();
            let mut filters = vec![
                scope_filter.clone(),
                Filter::Eq("user_id".into(), user_id.clone().into()),
            ];
            push_visibility_filters(&mut filters, include_private, include_twin);
            let vector_store = self.vector_store.clone();
            async move {
                let search = vector_store
                    .search(&embedding, &filters, limit_per_user, score_threshold)
                    .await;
                match search {
                    Ok(results) => Some(GroupParticipantResult {
                        user_id,
                        results: ChunkEnvelope::from_results(results),
                    }),
                    Err(err) => {
                        warn!(user_id, error = %err, "retrieve_group_context: per-user search failed");
                        None
                    }
                }
            }
        });

        Ok(join_all(tasks).await.into_iter().flatten().collect())
    }

    pub async fn retrieve_related(
        &self,
        chunk_id: &str,
        relationship_types: Vec<String>,
        depth: u8,
        include_private: bool,
        limit: usize,
    ) -> Result<ChunkEnvelope, AppError> {
        let chunks = self
            .graph_store
            .related_content(chunk_id, &relationship_types, limit, include_private, depth)
            .await?;
        let results = chunks
            .into_iter()
            .map(|chunk| ChunkSearchResult { chunk, score: 1.0 })
            .collect();
        Ok(ChunkEnvelope::from_results(results))
    }

    /// Graph-first, vector-fallback on an empty graph result or a graph
    /// error. A fallback error yields an empty envelope rather than
    /// propagating, matching `spec.md` §4.6.
    pub async fn retrieve_by_topic(
        &self,
        topic: &str,
        mut filters: Vec<Filter>,
        limit: usize,
        include_private: Option<bool>,
        include_twin: Option<bool>,
        score_threshold: Option<f32>,
    ) -> Result<ChunkEnvelope, AppError> {
        let include_private = include_private.unwrap_or(TOPIC_DEFAULTS.include_private);
        let include_twin = include_twin.unwrap_or(TOPIC_DEFAULTS.include_twin);

        match self
            .graph_store
            .content_by_topic(topic, limit, include_private)
            .await
        {
            Ok(chunks) if !chunks.is_empty() => {
                let results = chunks
                    .into_iter()
                    .map(|chunk| ChunkSearchResult { chunk, score: 1.0 })
                    .collect();
                return Ok(ChunkEnvelope::from_results(results));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(topic, error = %err, "retrieve_by_topic: graph tier failed, falling back to vector");
            }
        }

        push_visibility_filters(&mut filters, include_private, include_twin);
        let embedding = match self.embedding.embed(topic).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(topic, error = %err, "retrieve_by_topic: vector fallback embedding failed");
                return Ok(ChunkEnvelope::default());
            }
        };
        match self
            .vector_store
            .search(&embedding, &filters, limit, score_threshold)
            .await
        {
            Ok(results) => Ok(ChunkEnvelope::from_results(results)),
            Err(err) => {
                warn!(topic, error = %err, "retrieve_by_topic: vector fallback failed");
                Ok(ChunkEnvelope::default())
            }
        }
    }

    async fn enrich_with_graph(&self, envelope: &mut ChunkEnvelope) {
        let project_ids: HashSet<&String> = envelope
            .chunks
            .iter()
            .filter_map(|r| r.chunk.project_id.as_ref())
            .collect();
        let session_ids: HashSet<&String> = envelope
            .chunks
            .iter()
            .filter_map(|r| r.chunk.session_id.as_ref())
            .collect();

        for project_id in project_ids {
            match self.graph_store.project_context(project_id).await {
                Ok(ctx) => {
                    envelope.project_contexts.insert(project_id.clone(), ctx);
                }
                Err(err) => {
                    warn!(project_id, error = %err, "retrieve_context: project enrichment failed, omitting");
                }
            }
        }

        for session_id in session_ids {
            match self.graph_store.session_participants(session_id).await {
                Ok(participants) => {
                    envelope
                        .session_participants
                        .insert(session_id.clone(), participants);
                }
                Err(err) => {
                    warn!(session_id, error = %err, "retrieve_context: session enrichment failed, omitting");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::{config::OpenAIConfig, Client};
    use common::storage::db::SurrealDbClient;
    use uuid::Uuid;

    async fn test_engine() -> RetrievalEngine {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("engine_test", &database)
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
            IngestionCoordinator::new(embedding.clone(), vector_store.clone(), graph_store.clone());
        RetrievalEngine::new(embedding, vector_store, graph_store, ingestion)
    }

    #[tokio::test]
    async fn team_scope_returns_empty_without_querying_stores() {
        let engine = test_engine().await;
        let results = engine
            .retrieve_group_context(
                "anything",
                GroupScope::Team("t1".into()),
                5,
                None,
                false,
                false,
            )
            .await
            .expect("team scope should not error");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn retrieve_related_returns_empty_for_unknown_chunk() {
        let engine = test_engine().await;
        let envelope = engine
            .retrieve_related("does-not-exist", vec![], 1, false, 10)
            .await
            .expect("related content should not error on unknown chunk");
        assert!(envelope.chunks.is_empty());
    }
}
