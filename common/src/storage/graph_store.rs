use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AppError;

use super::{db::SurrealDbClient, types::chunk::Chunk};

const NODE_TABLES: &[&str] = &[
    "user_node",
    "project_node",
    "session_node",
    "document_node",
    "message_node",
    "topic_node",
    "team_node",
    "organization_node",
    "preference_node",
];

const EDGE_TABLES: &[&str] = &[
    "created",
    "owns",
    "uploaded",
    "participated_in",
    "authored",
    "posted_in",
    "part_of",
    "attached_to",
    "mentions",
    "states_preference",
    "stated",
    "related_to",
    "derived_from",
    "member_of",
    "manages",
];

/// The collaboration-graph role of the dual store: node/edge merges and
/// the named traversal queries the retrieval engine composes with vector
/// search.
#[derive(Clone)]
pub struct GraphStoreDal {
    db: SurrealDbClient,
}

impl GraphStoreDal {
    pub fn new(db: SurrealDbClient) -> Self {
        Self { db }
    }

    /// Create-or-update a node by table+id. Uses SurrealDB's native
    /// `UPSERT ... MERGE`, which only writes the fields present in
    /// `properties` and leaves everything else untouched on a repeat call
    /// — a true idempotent merge, not the delete-then-recreate pattern
    /// this was grounded against.
    pub async fn merge_node(
        &self,
        table: &str,
        id: &str,
        properties: Value,
    ) -> Result<(), AppError> {
        self.db
            .client
            .query("UPSERT type::thing($table, $id) MERGE $content;")
            .bind(("table", table.to_string()))
            .bind(("id", id.to_string()))
            .bind(("content", properties))
            .await
            .map_err(AppError::Database)?
            .check()
            .map_err(AppError::Database)?;
        Ok(())
    }

    /// Create-or-update an edge. The edge record's id is derived
    /// deterministically from `(in_id, out_id)` so a repeat call with the
    /// same endpoints touches zero new rows — this is what gives the
    /// "no duplicate edges on re-ingest" invariant for free.
    pub async fn merge_edge(
        &self,
        relation: &str,
        in_table: &str,
        in_id: &str,
        out_table: &str,
        out_id: &str,
        properties: Value,
    ) -> Result<(), AppError> {
        let edge_id = format!("{in_id}__{out_id}");
        self.db
            .client
            .query(
                "UPSERT type::thing($relation, $edge_id) MERGE {
                    in: type::thing($in_table, $in_id),
                    out: type::thing($out_table, $out_id)
                };
                UPDATE type::thing($relation, $edge_id) MERGE $content;",
            )
            .bind(("relation", relation.to_string()))
            .bind(("edge_id", edge_id))
            .bind(("in_table", in_table.to_string()))
            .bind(("in_id", in_id.to_string()))
            .bind(("out_table", out_table.to_string()))
            .bind(("out_id", out_id.to_string()))
            .bind(("content", properties))
            .await
            .map_err(AppError::Database)?
            .check()
            .map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn session_participants(&self, session_id: &str) -> Result<Vec<String>, AppError> {
        let mut response = self
            .db
            .client
            .query("SELECT VALUE <-participated_in<-user_node.id FROM type::thing('session_node', $id);")
            .bind(("id", session_id.to_string()))
            .await
            .map_err(AppError::Database)?;
        let rows: Vec<Vec<surrealdb::sql::Thing>> = response.take(0).map_err(AppError::Database)?;
        Ok(rows
            .into_iter()
            .flatten()
            .map(|thing| thing.id.to_raw())
            .collect())
    }

    /// Participants of a project, derived transitively through its
    /// sessions (a project has no direct `PARTICIPATED_IN` edge — only its
    /// sessions do), deduplicated across sessions.
    pub async fn project_participants(&self, project_id: &str) -> Result<Vec<String>, AppError> {
        let mut response = self
            .db
            .client
            .query(
                "SELECT VALUE <-part_of<-session_node<-participated_in<-user_node.id \
                 FROM type::thing('project_node', $id);",
            )
            .bind(("id", project_id.to_string()))
            .await
            .map_err(AppError::Database)?;
        let rows: Vec<Vec<surrealdb::sql::Thing>> = response.take(0).map_err(AppError::Database)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for thing in rows.into_iter().flatten() {
            let id = thing.id.to_raw();
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
        Ok(out)
    }

    pub async fn project_context(&self, project_id: &str) -> Result<ProjectContext, AppError> {
        let participants = self.project_participants(project_id).await?;

        let mut response = self
            .db
            .client
            .query(
                "SELECT VALUE <-part_of<-session_node.id FROM type::thing('project_node', $id);
                 SELECT VALUE <-part_of<-document_node.id FROM type::thing('project_node', $id);",
            )
            .bind(("id", project_id.to_string()))
            .await
            .map_err(AppError::Database)?;

        let session_ids: Vec<surrealdb::sql::Thing> = response.take(0).map_err(AppError::Database)?;
        let document_ids: Vec<surrealdb::sql::Thing> = response.take(1).map_err(AppError::Database)?;

        Ok(ProjectContext {
            project_id: project_id.to_string(),
            participant_user_ids: participants,
            session_ids: session_ids.into_iter().map(|t| t.id.to_raw()).collect(),
            document_ids: document_ids.into_iter().map(|t| t.id.to_raw()).collect(),
        })
    }

    /// Direct + shared-entity traversal from a seed chunk.
    ///
    /// - Direct path: chunks reachable from the seed via one of
    ///   `relationship_types`, depth `1..=max_depth`.
    /// - Shared-entity path (depth 1): other chunks attached to the same
    ///   parent entity (session/document/project) as the seed.
    /// - Shared-entity path (depth 2, only if `max_depth >= 2`): chunks
    ///   attached to entities related to the seed's parent entities.
    ///
    /// The seed itself is always excluded from the result; the privacy
    /// filter (`include_private`) is applied to destination chunks only.
    pub async fn related_content(
        &self,
        chunk_id: &str,
        relationship_types: &[String],
        limit: usize,
        include_private: bool,
        max_depth: u8,
    ) -> Result<Vec<Chunk>, AppError> {
        let depth = max_depth.max(1);
        let relation_list = if relationship_types.is_empty() {
            EDGE_TABLES.join(", ")
        } else {
            relationship_types.join(", ")
        };

        let direct_query = format!(
            "SELECT VALUE ->({relation_list})(1..={depth})->chunk.* \
             FROM type::thing('chunk', $id);"
        );

        let mut response = self
            .db
            .client
            .query(direct_query)
            .bind(("id", chunk_id.to_string()))
            .await
            .map_err(AppError::Database)?;
        let direct: Vec<Chunk> = response.take(0).unwrap_or_default();

        let shared_depth1 = self
            .shared_entity_chunks(chunk_id, "part_of")
            .await
            .unwrap_or_default();

        let mut shared_depth2 = Vec::new();
        if depth >= 2 {
            shared_depth2 = self
                .shared_entity_chunks_depth2(chunk_id, "part_of")
                .await
                .unwrap_or_default();
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for chunk in direct.into_iter().chain(shared_depth1).chain(shared_depth2) {
            if chunk.id == chunk_id {
                continue;
            }
            if !include_private && chunk.is_private {
                continue;
            }
            if seen.insert(chunk.id.clone()) {
                out.push(chunk);
            }
            if out.len() >= limit {
                break;
            }
        }

        Ok(out)
    }

    async fn shared_entity_chunks(&self, chunk_id: &str, edge: &str) -> Result<Vec<Chunk>, AppError> {
        let query = format!(
            "SELECT VALUE ->{edge}->(session_node, document_node, project_node)<-{edge}<-chunk.* \
             FROM type::thing('chunk', $id);"
        );
        let mut response = self
            .db
            .client
            .query(query)
            .bind(("id", chunk_id.to_string()))
            .await
            .map_err(AppError::Database)?;
        Ok(response.take(0).unwrap_or_default())
    }

    /// Depth-2 shared-entity path: one intermediate non-chunk hop between
    /// the two shared-entity links, e.g. `chunk ->part_of-> session
    /// ->part_of-> project <-part_of<- document <-part_of<- chunk`. Distinct
    /// from the depth-1 path, which stops at the first common parent.
    async fn shared_entity_chunks_depth2(
        &self,
        chunk_id: &str,
        edge: &str,
    ) -> Result<Vec<Chunk>, AppError> {
        let query = format!(
            "SELECT VALUE ->{edge}->(session_node, document_node, project_node)\
             ->{edge}->(session_node, document_node, project_node)\
             <-{edge}<-chunk.* \
             FROM type::thing('chunk', $id);"
        );
        let mut response = self
            .db
            .client
            .query(query)
            .bind(("id", chunk_id.to_string()))
            .await
            .map_err(AppError::Database)?;
        Ok(response.take(0).unwrap_or_default())
    }

    /// Graph-tier lookup for a topic: chunks whose `MENTIONS` edge points
    /// at the named topic. Returns an empty vector (not an error) when the
    /// topic node doesn't exist — callers fall back to vector search in
    /// that case.
    pub async fn content_by_topic(
        &self,
        topic: &str,
        limit: usize,
        include_private: bool,
    ) -> Result<Vec<Chunk>, AppError> {
        let mut response = self
            .db
            .client
            .query(
                "SELECT VALUE <-mentions<-chunk.* FROM topic_node WHERE name = $topic LIMIT 1;",
            )
            .bind(("topic", topic.to_string()))
            .await
            .map_err(AppError::Database)?;
        let rows: Vec<Vec<Chunk>> = response.take(0).unwrap_or_default();

        let chunks = rows
            .into_iter()
            .flatten()
            .filter(|c| include_private || !c.is_private)
            .take(limit)
            .collect();
        Ok(chunks)
    }

    /// Three-tier preference lookup, tried in order until one tier
    /// produces a result: (a) chunks the user created that `STATES_PREFERENCE`
    /// a matching topic, (b) chunks the user authored that `MENTIONS` a
    /// matching topic, (c) any chunk the user authored (no topic filter).
    /// Topic matching in tiers (a)/(b) is a bidirectional substring test
    /// (`Topic.name CONTAINS topic OR topic CONTAINS Topic.name`), not exact
    /// equality. Twin interactions are excluded at every tier.
    pub async fn preference_statements(
        &self,
        user_id: &str,
        topic: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, AppError> {
        if let Some(topic) = topic {
            let mut response = self
                .db
                .client
                .query(
                    "SELECT VALUE text FROM chunk \
                     WHERE user_id = $user_id AND is_twin_interaction = false \
                     AND ->states_preference->topic_node[WHERE name CONTAINS $topic OR $topic CONTAINS name] \
                     LIMIT $limit;",
                )
                .bind(("user_id", user_id.to_string()))
                .bind(("topic", topic.to_string()))
                .bind(("limit", limit as i64))
                .await
                .map_err(AppError::Database)?;
            let tier_a: Vec<String> = response.take(0).unwrap_or_default();
            if !tier_a.is_empty() {
                return Ok(tier_a);
            }

            let mut response = self
                .db
                .client
                .query(
                    "SELECT VALUE text FROM chunk \
                     WHERE user_id = $user_id AND is_twin_interaction = false \
                     AND ->mentions->topic_node[WHERE name CONTAINS $topic OR $topic CONTAINS name] \
                     LIMIT $limit;",
                )
                .bind(("user_id", user_id.to_string()))
                .bind(("topic", topic.to_string()))
                .bind(("limit", limit as i64))
                .await
                .map_err(AppError::Database)?;
            let tier_b: Vec<String> = response.take(0).unwrap_or_default();
            if !tier_b.is_empty() {
                return Ok(tier_b);
            }
        }

        let mut response = self
            .db
            .client
            .query(
                "SELECT VALUE text FROM chunk \
                 WHERE user_id = $user_id AND is_twin_interaction = false LIMIT $limit;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("limit", limit as i64))
            .await
            .map_err(AppError::Database)?;
        let tier_c: Vec<String> = response.take(0).unwrap_or_default();
        Ok(tier_c)
    }

    pub async fn update_document_metadata(
        &self,
        doc_id: &str,
        patch: HashMap<String, String>,
    ) -> Result<(), AppError> {
        let content = serde_json::json!({ "metadata": patch });
        self.merge_node("document_node", doc_id, content).await
    }

    /// All-or-nothing wipe of every node, edge, and chunk table. Used by
    /// `AdminOps::clear_all` ahead of re-seeding.
    pub async fn wipe_all(&self) -> Result<(), AppError> {
        for table in NODE_TABLES.iter().chain(EDGE_TABLES.iter()) {
            let res = self
                .db
                .client
                .query(format!("DELETE {table};"))
                .await
                .map_err(AppError::Database)?;
            if let Err(err) = res.check() {
                warn!(table = %table, error = %err, "wipe_all: table delete failed");
            }
        }
        info!("graph store wiped");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectContext {
    pub project_id: String,
    pub participant_user_ids: Vec<String>,
    pub session_ids: Vec<String>,
    pub document_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    async fn test_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory("gs_test", &database)
            .await
            .expect("in-memory db")
    }

    #[tokio::test]
    async fn merge_node_is_idempotent() {
        let db = test_db().await;
        let store = GraphStoreDal::new(db);

        store
            .merge_node("user_node", "u1", json!({ "display_name": "Ada" }))
            .await
            .expect("first merge");
        store
            .merge_node("user_node", "u1", json!({ "display_name": "Ada" }))
            .await
            .expect("second merge");

        let mut response = store
            .db
            .client
            .query("SELECT count() AS count FROM user_node GROUP ALL;")
            .await
            .expect("count query");
        #[derive(Deserialize)]
        struct Row {
            count: u64,
        }
        let rows: Vec<Row> = response.take(0).expect("rows");
        assert_eq!(rows.first().map(|r| r.count), Some(1));
    }

    #[tokio::test]
    async fn merge_edge_is_idempotent() {
        let db = test_db().await;
        let store = GraphStoreDal::new(db);
        store
            .merge_node("user_node", "u1", json!({}))
            .await
            .expect("user");
        store
            .merge_node("session_node", "s1", json!({}))
            .await
            .expect("session");

        store
            .merge_edge(
                "participated_in",
                "user_node",
                "u1",
                "session_node",
                "s1",
                json!({}),
            )
            .await
            .expect("first edge");
        store
            .merge_edge(
                "participated_in",
                "user_node",
                "u1",
                "session_node",
                "s1",
                json!({}),
            )
            .await
            .expect("second edge");

        let participants = store.session_participants("s1").await.expect("participants");
        assert_eq!(participants, vec!["u1".to_string()]);
    }
}
