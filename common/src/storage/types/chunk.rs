use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stored_object;

/// How a chunk entered the system — drives which graph edges
/// `IngestionCoordinator` creates for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Message,
    DocumentChunk,
    TranscriptSnippet,
    Query,
}

stored_object!(Chunk, "chunk", {
    text: String,
    embedding: Vec<f32>,
    source_type: SourceType,
    user_id: Option<String>,
    project_id: Option<String>,
    session_id: Option<String>,
    doc_id: Option<String>,
    message_id: Option<String>,
    #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime")]
    timestamp: DateTime<Utc>,
    timestamp_epoch: f64,
    is_private: bool,
    is_twin_interaction: bool,
    metadata: HashMap<String, String>
});

impl Chunk {
    /// Builds a new chunk record with a fresh id. `created_at`/`updated_at`
    /// are populated by the caller at store time via `Utc::now()` — this
    /// constructor leaves them at their `Default` value so the
    /// `stored_object!`-generated fields stay uniform across every kind.
    /// `timestamp` is the caller-supplied instant the content actually
    /// occurred at (distinct from `created_at`, the store-write time);
    /// `timestamp_epoch` mirrors it as epoch-seconds so it can be used in
    /// a `Filter::Range`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: String,
        embedding: Vec<f32>,
        source_type: SourceType,
        user_id: Option<String>,
        project_id: Option<String>,
        session_id: Option<String>,
        doc_id: Option<String>,
        message_id: Option<String>,
        timestamp: DateTime<Utc>,
        is_private: bool,
        is_twin_interaction: bool,
        metadata: HashMap<String, String>,
    ) -> Self {
        let now = chrono::Utc::now();
        let timestamp_epoch = timestamp.timestamp_millis() as f64 / 1000.0;
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            text,
            embedding,
            source_type,
            user_id,
            project_id,
            session_id,
            doc_id,
            message_id,
            timestamp,
            timestamp_epoch,
            is_private,
            is_twin_interaction,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_gets_a_unique_id() {
        let a = Chunk::new(
            "hello".into(),
            vec![0.1, 0.2],
            SourceType::Message,
            Some("u1".into()),
            None,
            None,
            None,
            Some("m1".into()),
            Utc::now(),
            false,
            false,
            HashMap::new(),
        );
        let b = Chunk::new(
            "hello".into(),
            vec![0.1, 0.2],
            SourceType::Message,
            Some("u1".into()),
            None,
            None,
            None,
            Some("m1".into()),
            Utc::now(),
            false,
            false,
            HashMap::new(),
        );
        assert_ne!(a.id, b.id);
    }
}
