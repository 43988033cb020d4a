use common::{
    error::AppError,
    storage::{filter::Filter, graph_store::GraphStoreDal, vector_store::VectorStoreDal},
    utils::embedding::EmbeddingProvider,
};

/// One preference statement surfaced by either tier. Graph-tier hits carry
/// no similarity score; vector-tier hits always do.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceHit {
    pub text: String,
    pub score: Option<f32>,
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct PreferenceEnvelope {
    pub user_id: String,
    pub decision_topic: String,
    pub has_preferences: bool,
    pub preference_statements: Vec<PreferenceHit>,
    pub graph_results_count: usize,
    pub vector_results_count: usize,
}

/// Merges `GraphStoreDal::preference_statements`' three-tier graph lookup
/// with a vector-similarity search, deduplicated by normalized statement
/// text (the graph tier returns raw statement text, not a `chunk_id`, so
/// text is the only key both tiers share) and preferring the `"graph"`
/// label on a collision.
#[derive(Clone)]
pub struct PreferenceResolver {
    embedding: EmbeddingProvider,
    vector_store: VectorStoreDal,
    graph_store: GraphStoreDal,
}

impl PreferenceResolver {
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

    #[allow(clippy::too_many_arguments)]
    pub async fn resolve(
        &self,
        user_id: &str,
        decision_topic: &str,
        mut scope_filters: Vec<Filter>,
        score_threshold: Option<f32>,
        limit: usize,
        include_messages_to_twin: bool,
    ) -> Result<PreferenceEnvelope, AppError> {
        let graph_hits = self
            .graph_store
            .preference_statements(user_id, Some(decision_topic), limit)
            .await?;
        let graph_results_count = graph_hits.len();

        scope_filters.push(Filter::Eq("user_id".into(), user_id.into()));
        if !include_messages_to_twin {
            scope_filters.push(Filter::Eq("is_twin_interaction".into(), false.into()));
        }
        let embedding = self.embedding.embed(decision_topic).await?;
        let vector_hits = self
            .vector_store
            .search(&embedding, &scope_filters, limit, score_threshold)
            .await?;
        let vector_results_count = vector_hits.len();

        let mut seen = std::collections::HashSet::new();
        let mut preference_statements = Vec::new();

        for text in graph_hits {
            let key = normalize(&text);
            if seen.insert(key) {
                preference_statements.push(PreferenceHit {
                    text,
                    score: None,
                    source: "graph",
                });
            }
        }
        for hit in vector_hits {
            let key = normalize(&hit.chunk.text);
            if seen.insert(key) {
                preference_statements.push(PreferenceHit {
                    text: hit.chunk.text,
                    score: Some(hit.score),
                    source: "vector",
                });
            }
        }

        Ok(PreferenceEnvelope {
            user_id: user_id.to_string(),
            decision_topic: decision_topic.to_string(),
            has_preferences: !preference_statements.is_empty(),
            preference_statements,
            graph_results_count,
            vector_results_count,
        })
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::{config::OpenAIConfig, Client};
    use common::storage::db::SurrealDbClient;
    use uuid::Uuid;

    async fn test_resolver() -> PreferenceResolver {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("pref_test", &database)
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
        PreferenceResolver::new(embedding, vector_store, graph_store)
    }

    #[tokio::test]
    async fn empty_stores_yield_no_preferences_without_erroring_on_graph_tier() {
        let resolver = test_resolver().await;
        let count = resolver
            .graph_store
            .preference_statements("nobody", Some("coffee"), 5)
            .await
            .expect("graph tier should not error for an unknown user");
        assert!(count.is_empty());
    }

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize("  Prefers Dark Mode "), "prefers dark mode");
        assert_eq!(normalize("prefers dark mode"), "prefers dark mode");
    }
}
