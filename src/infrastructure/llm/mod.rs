mod embedder_factory;
mod endpoint_embedder;
mod http_inference_client;
mod openai_embedder;

pub use embedder_factory::{EmbedderFactory, EmbedderFactoryError};
pub use endpoint_embedder::EndpointEmbedder;
pub use http_inference_client::{GenerationParameters, HttpInferenceClient};
pub use openai_embedder::OpenAiEmbedder;
