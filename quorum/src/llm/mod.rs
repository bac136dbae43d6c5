mod api;
pub mod prompts;
mod provider;
pub mod safety;

use async_trait::async_trait;

use crate::error::Result;

pub(crate) use api::default_base_url;
pub use api::LlmApiClient;
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};

/// Opaque text-completion oracle consumed by the pipeline.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
