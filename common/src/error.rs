use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors shared across every crate in the workspace.
///
/// Transport-level causes (`surrealdb`, `async-openai`, `io`) are carried
/// via `#[from]` so DAL and provider call sites can `?` straight through;
/// the remaining variants name outcomes the retrieval/ingestion contracts
/// distinguish explicitly (invalid input, missing records, a partially
/// completed multi-step write).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),
    #[error("Partial ingest: {0}")]
    PartialIngest(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// True for store-layer failures worth a single retry after backoff —
    /// SurrealDB surfaces transaction conflicts as a string inside the
    /// error, there is no dedicated variant for it.
    pub fn is_retryable_conflict(&self) -> bool {
        match self {
            AppError::Database(err) => err.to_string().contains("read or write conflict"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_passthrough() {
        let err = AppError::InvalidInput("text must not be empty".into());
        assert_eq!(err.to_string(), "Invalid input: text must not be empty");
    }

    #[test]
    fn non_database_errors_are_not_retryable() {
        assert!(!AppError::InvalidInput("x".into()).is_retryable_conflict());
        assert!(!AppError::NotFound("x".into()).is_retryable_conflict());
    }
}
