use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use kinabalu::application::ports::{CollectionConfig, TextSplitter};
use kinabalu::application::services::{
    AnswerService, DocumentIndexer, IngestionService, QuotaService,
};
use kinabalu::infrastructure::auth::CredentialProvider;
use kinabalu::infrastructure::llm::{EmbedderFactory, HttpInferenceClient};
use kinabalu::infrastructure::observability::{TracingConfig, init_tracing};
use kinabalu::infrastructure::persistence::{TenantRepositoryFactory, VectorStoreFactory};
use kinabalu::infrastructure::storage::ObjectSourceFactory;
use kinabalu::infrastructure::text_processing::FixedSizeSplitter;
use kinabalu::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("loading settings")?;
    init_tracing(&TracingConfig::from_settings(&settings));

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_client.timeout_secs))
        .build()
        .context("building HTTP client")?;

    let object_source =
        ObjectSourceFactory::create(&settings.storage).context("creating object source")?;

    let tenant_repository =
        TenantRepositoryFactory::create(&settings.quota, &settings.auth, http_client.clone())
            .await
            .context("creating tenant store")?;

    let credentials = CredentialProvider::from_settings(
        &settings.auth,
        settings.opensearch.username.as_deref(),
        settings.opensearch.password.as_deref(),
    )
    .context("configuring vector store credentials")?;

    let vector_store = VectorStoreFactory::create(
        &settings.vector_store,
        &settings.opensearch,
        &settings.qdrant,
        http_client.clone(),
        credentials,
    )
    .context("creating vector store")?;

    if settings.vector_store.create_if_missing {
        let created = vector_store
            .create_collection(&CollectionConfig::new(settings.vector_store.dimensions))
            .await
            .context("creating vector collection")?;
        tracing::info!(created, "Vector collection ready");
    }

    let embedder =
        EmbedderFactory::create(&settings.embeddings, &settings.auth, http_client.clone())
            .context("creating embedder")?;

    let inference_client = Arc::new(HttpInferenceClient::from_settings(
        http_client,
        &settings.inference,
    ));

    let text_splitter: Arc<dyn TextSplitter> =
        Arc::new(FixedSizeSplitter::new(settings.ingestion.chunk_size));

    let ingestion_service = Arc::new(IngestionService::new(
        Arc::clone(&embedder),
        Arc::clone(&vector_store),
        text_splitter,
        settings.ingestion.batch_size,
    ));

    let document_indexer = Arc::new(DocumentIndexer::new(
        object_source,
        ingestion_service,
        settings.ingestion.download_dir.clone(),
    ));

    let quota_service = Arc::new(QuotaService::new(
        tenant_repository,
        settings.quota.max_spend_attempts,
    ));

    let answer_service = Arc::new(AnswerService::new(
        embedder,
        vector_store,
        inference_client,
        Arc::clone(&quota_service),
        settings.answer.top_k,
    ));

    let state = AppState {
        document_indexer,
        quota_service,
        answer_service,
        error_status: settings.http.error_status,
        sse_keep_alive: Duration::from_secs(settings.answer.sse_keep_alive_secs),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("parsing server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
