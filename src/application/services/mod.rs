mod answer_service;
mod document_indexer;
mod ingestion_service;
mod quota_service;
mod token_counter;

pub use answer_service::{
    Answer, AnswerError, AnswerEvent, AnswerEventStream, AnswerService, SourceChunk,
    StreamingAnswer, build_prompt,
};
pub use document_indexer::{DocumentIndexer, IndexedObject, IndexerError};
pub use ingestion_service::{IngestionError, IngestionService, IngestionSummary};
pub use quota_service::{QuotaError, QuotaService};
pub use token_counter::count_tokens;
