use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use tracing::debug;

use crate::error::AppError;

/// Wraps an OpenAI-compatible embeddings endpoint behind the fixed
/// model/dimension the rest of the system assumes for a given deployment.
///
/// Every embedding this provider returns is validated: a response whose
/// vector is all-zero or contains `NaN`/`inf` is treated as a failure
/// rather than silently stored, since either would poison cosine-similarity
/// search.
#[derive(Clone)]
pub struct EmbeddingProvider {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: u32,
}

impl EmbeddingProvider {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>, dimension: u32) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Generate an embedding for a single piece of text.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .dimensions(self.dimension)
            .input([input])
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmbeddingFailure("no embedding data received".into()))?
            .embedding;

        validate_embedding(&embedding)?;

        debug!(dimension = embedding.len(), "generated embedding");

        Ok(embedding)
    }

    /// Generate embeddings for a batch of chunks in a single request,
    /// preserving input order.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .dimensions(self.dimension)
            .input(inputs.to_vec())
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; inputs.len()];
        for datum in response.data {
            let idx = datum.index as usize;
            if let Some(slot) = ordered.get_mut(idx) {
                *slot = Some(datum.embedding);
            }
        }

        ordered
            .into_iter()
            .map(|maybe| {
                let embedding = maybe.ok_or_else(|| {
                    AppError::EmbeddingFailure("missing embedding for one input".into())
                })?;
                validate_embedding(&embedding)?;
                Ok(embedding)
            })
            .collect()
    }
}

fn validate_embedding(embedding: &[f32]) -> Result<(), AppError> {
    if embedding.is_empty() {
        return Err(AppError::EmbeddingFailure("empty embedding vector".into()));
    }
    if embedding.iter().all(|v| *v == 0.0) {
        return Err(AppError::EmbeddingFailure("all-zero embedding vector".into()));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(AppError::EmbeddingFailure(
            "embedding vector contains NaN or infinite values".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_all_zero_vector() {
        let v = vec![0.0_f32; 8];
        assert!(validate_embedding(&v).is_err());
    }

    #[test]
    fn rejects_non_finite_vector() {
        let v = vec![0.1, f32::NAN, 0.3];
        assert!(validate_embedding(&v).is_err());
    }

    #[test]
    fn accepts_well_formed_vector() {
        let v = vec![0.1, 0.2, -0.3];
        assert!(validate_embedding(&v).is_ok());
    }
}
