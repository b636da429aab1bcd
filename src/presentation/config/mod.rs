mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AnswerSettings, AuthMode, AuthSettings, EmbeddingProvider, EmbeddingsSettings,
    ErrorStatusPolicy, HttpClientSettings, HttpSettings, InferenceSettings, IngestionSettings,
    LoggingSettings, OpenSearchSettings, QdrantSettings, QuotaProvider, QuotaSettings,
    ServerSettings, Settings, SettingsError, StorageProvider, StorageSettings,
    VectorStoreProvider, VectorStoreSettings,
};
