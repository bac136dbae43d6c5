use std::sync::Arc;

use crate::config::Config;
use crate::llm::LlmProvider;
use crate::pipeline::QaPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: LlmProvider,
    pub pipeline: QaPipeline,
}

impl AppState {
    pub fn new(config: Config, llm: LlmProvider, pipeline: QaPipeline) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            pipeline,
        }
    }
}
