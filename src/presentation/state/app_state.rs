use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{AnswerService, DocumentIndexer, QuotaService};
use crate::presentation::config::ErrorStatusPolicy;

#[derive(Clone)]
pub struct AppState {
    pub document_indexer: Arc<DocumentIndexer>,
    pub quota_service: Arc<QuotaService>,
    pub answer_service: Arc<AnswerService>,
    pub error_status: ErrorStatusPolicy,
    /// Interval between keep-alive comments on streamed answers.
    pub sse_keep_alive: Duration,
}
