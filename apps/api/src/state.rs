use std::sync::Arc;

use crate::alignment::history::HistoryStore;
use crate::alignment::pipeline::AlignmentPipeline;
use crate::llm_client::GenerationClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Server instance of the pipeline, with history recording attached.
    pub pipeline: AlignmentPipeline,
    /// Same store the pipeline writes to; read by `GET /history`.
    pub history: Arc<dyn HistoryStore>,
}

impl AppState {
    pub fn new(generator: Arc<dyn GenerationClient>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            pipeline: AlignmentPipeline::new(generator).with_history(history.clone()),
            history,
        }
    }
}
