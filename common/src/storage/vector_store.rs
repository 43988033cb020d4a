use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;

use super::{
    db::SurrealDbClient,
    filter::{compile, Filter},
    types::chunk::Chunk,
};

const HNSW_INDEX_NAME: &str = "idx_chunk_embedding";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkSearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// The vector-search role of the dual store: chunk upsert/search/delete
/// over a cosine-similarity HNSW index on `chunk.embedding`, plus the
/// tagged `Filter` set every search composes with `AND`.
#[derive(Clone)]
pub struct VectorStoreDal {
    db: SurrealDbClient,
}

impl VectorStoreDal {
    pub fn new(db: SurrealDbClient) -> Self {
        Self { db }
    }

    /// Idempotent: safe to call on every boot, and again whenever the
    /// configured embedding dimension changes (`OVERWRITE` replaces the
    /// prior definition).
    pub async fn ensure_index(&self, dimension: usize) -> Result<(), AppError> {
        let definition = format!(
            "DEFINE INDEX OVERWRITE {HNSW_INDEX_NAME} ON TABLE chunk \
             FIELDS embedding HNSW DIMENSION {dimension} DIST COSINE TYPE F32;"
        );
        self.db
            .client
            .query(definition)
            .await
            .map_err(AppError::Database)?
            .check()
            .map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn upsert(&self, chunk: Chunk) -> Result<Chunk, AppError> {
        let stored: Option<Chunk> = self.db.store_item(chunk).await?;
        stored.ok_or_else(|| AppError::InternalError("chunk upsert returned no row".into()))
    }

    pub async fn delete(&self, chunk_id: &str) -> Result<(), AppError> {
        let _: Option<Chunk> = self.db.delete_item::<Chunk>(chunk_id).await?;
        Ok(())
    }

    /// Unconditional delete of every chunk row. Used by `AdminOps::clear_all`
    /// — the vector-store half of `spec.md` §4.8's "delete(empty filter)".
    pub async fn clear(&self) -> Result<u64, AppError> {
        let dropped: Vec<Chunk> = self.db.drop_table::<Chunk>().await?;
        Ok(dropped.len() as u64)
    }

    pub async fn count(&self, filters: &[Filter]) -> Result<u64, AppError> {
        let compiled = compile(filters);
        let query = format!(
            "SELECT count() AS count FROM chunk WHERE {} GROUP ALL;",
            compiled.clause
        );
        let mut q = self.db.client.query(query);
        for (name, value) in compiled.bindings {
            q = q.bind((name, value));
        }

        #[derive(Deserialize)]
        struct CountRow {
            count: u64,
        }
        let mut response = q.await.map_err(AppError::Database)?;
        let rows: Vec<CountRow> = response.take(0).map_err(AppError::Database)?;
        Ok(rows.first().map_or(0, |r| r.count))
    }

    /// Cosine-similarity search constrained by `filters`, ordered
    /// descending by score, capped at `limit` rows, with an optional
    /// post-hoc `score_threshold` applied after SurrealDB orders the
    /// candidates (the HNSW index returns an approximate top-K; filtering
    /// by threshold client-side keeps the contract independent of the
    /// index's internal ANN tolerance).
    pub async fn search(
        &self,
        query_embedding: &[f32],
        filters: &[Filter],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ChunkSearchResult>, AppError> {
        let compiled = compile(filters);
        let query = format!(
            "SELECT *, vector::similarity::cosine(embedding, $qv) AS score FROM chunk \
             WHERE {} ORDER BY score DESC LIMIT $limit;",
            compiled.clause
        );

        let mut q = self
            .db
            .client
            .query(query)
            .bind(("qv", query_embedding.to_vec()))
            .bind(("limit", limit as i64));
        for (name, value) in compiled.bindings {
            q = q.bind((name, value));
        }

        #[derive(Deserialize)]
        struct Row {
            #[serde(flatten)]
            chunk: Chunk,
            score: f32,
        }

        let mut response = q.await.map_err(AppError::Database)?;
        let rows: Vec<Row> = response.take(0).map_err(AppError::Database)?;

        let results: Vec<ChunkSearchResult> = rows
            .into_iter()
            .filter(|row| score_threshold.map_or(true, |t| row.score >= t))
            .map(|row| ChunkSearchResult {
                chunk: row.chunk,
                score: row.score,
            })
            .collect();

        debug!(count = results.len(), "vector search completed");

        if results.is_empty() {
            warn!("vector search returned no results");
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::chunk::SourceType;
    use std::collections::HashMap;
    use uuid::Uuid;

    async fn test_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory("vs_test", &database)
            .await
            .expect("in-memory db")
    }

    fn sample_chunk(text: &str, embedding: Vec<f32>, user_id: &str, private: bool) -> Chunk {
        Chunk::new(
            text.into(),
            embedding,
            SourceType::Message,
            Some(user_id.into()),
            None,
            None,
            None,
            None,
            chrono::Utc::now(),
            private,
            false,
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn upsert_then_search_roundtrips() {
        let db = test_db().await;
        let store = VectorStoreDal::new(db);
        store.ensure_index(3).await.expect("index");

        let chunk = sample_chunk("hello world", vec![1.0, 0.0, 0.0], "u1", false);
        store.upsert(chunk.clone()).await.expect("upsert");

        let results = store
            .search(&[1.0, 0.0, 0.0], &[], 10, None)
            .await
            .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, chunk.id);
    }

    #[tokio::test]
    async fn search_excludes_private_when_filtered_out() {
        let db = test_db().await;
        let store = VectorStoreDal::new(db);
        store.ensure_index(3).await.expect("index");

        store
            .upsert(sample_chunk("private note", vec![1.0, 0.0, 0.0], "u1", true))
            .await
            .expect("upsert");
        store
            .upsert(sample_chunk("shared note", vec![1.0, 0.0, 0.0], "u2", false))
            .await
            .expect("upsert");

        let filters = vec![Filter::Eq("is_private".into(), false.into())];
        let results = store
            .search(&[1.0, 0.0, 0.0], &filters, 10, None)
            .await
            .expect("search");

        assert_eq!(results.len(), 1);
        assert!(!results[0].chunk.is_private);
    }

    #[tokio::test]
    async fn score_threshold_filters_weak_matches() {
        let db = test_db().await;
        let store = VectorStoreDal::new(db);
        store.ensure_index(3).await.expect("index");

        store
            .upsert(sample_chunk("aligned", vec![1.0, 0.0, 0.0], "u1", false))
            .await
            .expect("upsert");
        store
            .upsert(sample_chunk("orthogonal", vec![0.0, 1.0, 0.0], "u1", false))
            .await
            .expect("upsert");

        let results = store
            .search(&[1.0, 0.0, 0.0], &[], 10, Some(0.9))
            .await
            .expect("search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "aligned");
    }
}
