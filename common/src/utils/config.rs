use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_http_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_score_threshold() -> f32 {
    0.6
}

fn default_related_content_depth() -> u8 {
    2
}

/// Layered application configuration, backed by an optional `config.toml`
/// and environment variables (`Environment::default()` wins, matching the
/// teacher's precedence).
#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_chunk_size")]
    pub chunk_default_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_default_overlap: usize,

    #[serde(default = "default_score_threshold")]
    pub default_score_threshold: f32,
    #[serde(default = "default_related_content_depth")]
    pub default_related_content_depth: u8,
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_optional_fields() {
        assert_eq!(default_chunk_size(), 1000);
        assert_eq!(default_chunk_overlap(), 200);
        assert_eq!(default_embedding_dimension(), 1536);
    }
}
