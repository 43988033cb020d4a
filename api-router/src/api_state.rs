use admin_ops::AdminOps;
use async_openai::{config::OpenAIConfig, Client};
use chunker::{Boundary, Chunker};
use common::{
    storage::{db::SurrealDbClient, graph_store::GraphStoreDal, vector_store::VectorStoreDal},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use ingestion_pipeline::IngestionCoordinator;
use retrieval_pipeline::{PreferenceResolver, RetrievalEngine};

#[derive(Clone)]
pub struct ApiState {
    pub db: SurrealDbClient,
    pub config: AppConfig,
    pub ingestion: IngestionCoordinator,
    pub graph_store: GraphStoreDal,
    pub retrieval: RetrievalEngine,
    pub preference: PreferenceResolver,
    pub admin: AdminOps,
    pub chunker: Chunker,
}

impl ApiState {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?;

        Self::build(config, db).await
    }

    /// Builds state around an already-connected client, bypassing the root
    /// signin `new` performs — used by tests against an in-memory instance.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn new_with_client(
        config: &AppConfig,
        db: SurrealDbClient,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(config, db).await
    }

    async fn build(config: &AppConfig, db: SurrealDbClient) -> Result<Self, Box<dyn std::error::Error>> {
        let openai_client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        );
        let embedding = EmbeddingProvider::new(
            openai_client,
            config.embedding_model.clone(),
            config.embedding_dimension as u32,
        );

        let vector_store = VectorStoreDal::new(db.clone());
        let graph_store = GraphStoreDal::new(db.clone());

        let admin = AdminOps::new(
            IngestionCoordinator::new(embedding.clone(), vector_store.clone(), graph_store.clone()),
            graph_store.clone(),
            vector_store.clone(),
        );
        admin.initialize_schema(config.embedding_dimension).await?;

        let ingestion =
            IngestionCoordinator::new(embedding.clone(), vector_store.clone(), graph_store.clone());
        let retrieval = RetrievalEngine::new(
            embedding.clone(),
            vector_store.clone(),
            graph_store.clone(),
            ingestion.clone(),
        );
        let preference = PreferenceResolver::new(embedding, vector_store, graph_store.clone());
        let chunker = Chunker::new(
            config.chunk_default_size,
            config.chunk_default_overlap,
            Boundary::Paragraphs,
        );

        Ok(Self {
            db,
            config: config.clone(),
            ingestion,
            graph_store,
            retrieval,
            preference,
            admin,
            chunker,
        })
    }
}
