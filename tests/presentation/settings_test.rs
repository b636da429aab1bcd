use kinabalu::infrastructure::llm::EmbedderFactory;
use kinabalu::presentation::config::{
    AuthMode, Environment, ErrorStatusPolicy, QuotaProvider, Settings, StorageProvider,
    VectorStoreProvider,
};

#[test]
fn given_local_environment_when_loading_defaults_then_uses_in_process_backends() {
    let settings = Settings::from_toml(Environment::Local, "").unwrap();

    assert_eq!(settings.ingestion.chunk_size.get(), 1000);
    assert_eq!(settings.ingestion.batch_size.get(), 10);
    assert_eq!(settings.ingestion.download_dir, std::path::PathBuf::from("/tmp"));
    assert_eq!(settings.vector_store.provider, VectorStoreProvider::Memory);
    assert_eq!(settings.quota.provider, QuotaProvider::Memory);
    assert_eq!(settings.storage.provider, StorageProvider::Local);
    assert_eq!(settings.auth.mode, AuthMode::Static);
    assert_eq!(settings.http.error_status, ErrorStatusPolicy::Mapped);
    assert_eq!(settings.answer.top_k.get(), 1);
    assert_eq!(settings.answer.sse_keep_alive_secs, 15);
    assert!(!settings.logging.json);
}

#[test]
fn given_prod_environment_when_loading_defaults_then_targets_managed_services() {
    let settings = Settings::from_toml(Environment::Prod, "").unwrap();

    assert_eq!(settings.vector_store.provider, VectorStoreProvider::OpenSearch);
    assert_eq!(settings.quota.provider, QuotaProvider::DynamoDb);
    assert_eq!(settings.quota.table_name, "tenant_management");
    assert_eq!(settings.opensearch.index_name, "index-document-vector");
    assert_eq!(settings.auth.mode, AuthMode::Signed);
    assert_eq!(settings.auth.service, "aoss");
    assert!(settings.logging.json);
}

#[test]
fn given_overrides_when_loading_then_file_values_win() {
    let settings = Settings::from_toml(
        Environment::Local,
        r#"
        [ingestion]
        chunk_size = 500
        batch_size = 4

        [http]
        error_status = "fixed"

        [quota.seed]
        acme = 100
        "#,
    )
    .unwrap();

    assert_eq!(settings.ingestion.chunk_size.get(), 500);
    assert_eq!(settings.ingestion.batch_size.get(), 4);
    assert_eq!(settings.http.error_status, ErrorStatusPolicy::Fixed);
    assert_eq!(settings.quota.seed.get("acme"), Some(&100));
}

#[test]
fn given_zero_chunk_size_when_loading_then_fails() {
    let result = Settings::from_toml(Environment::Local, "[ingestion]\nchunk_size = 0\n");
    assert!(result.is_err());
}

#[test]
fn given_zero_spend_attempts_when_loading_then_fails() {
    let result = Settings::from_toml(Environment::Local, "[quota]\nmax_spend_attempts = 0\n");
    assert!(result.is_err());
}

#[test]
fn given_zero_top_k_when_loading_then_fails() {
    let result = Settings::from_toml(Environment::Local, "[answer]\ntop_k = 0\n");
    assert!(result.is_err());
}

#[test]
fn given_local_defaults_when_creating_embedder_then_uses_local_endpoint() {
    let settings = Settings::from_toml(Environment::Local, "").unwrap();

    assert_eq!(
        settings.embeddings.endpoint_url.as_deref(),
        Some("http://localhost:8081/invocations")
    );
    let embedder = EmbedderFactory::create(
        &settings.embeddings,
        &settings.auth,
        reqwest::Client::new(),
    );
    assert!(embedder.is_ok());
}

#[test]
fn given_prod_defaults_when_loading_then_no_embedding_endpoint_is_assumed() {
    let settings = Settings::from_toml(Environment::Prod, "").unwrap();

    assert!(settings.embeddings.endpoint_url.is_none());
}
