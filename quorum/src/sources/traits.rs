use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Document, SummaryRecord};

/// Resolves transcript ids to full documents.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Fetch the requested transcripts in request order. Unknown ids are skipped.
    async fn fetch(&self, script_ids: &[String]) -> Result<Vec<Document>>;
}

/// Serves precomputed summary embeddings.
#[async_trait]
pub trait SummaryIndex: Send + Sync {
    /// Every summary in the corpus. An empty corpus yields an empty list.
    async fn all_summaries(&self) -> Result<Vec<SummaryRecord>>;

    /// Summaries for an explicit selection. Ids the index does not know are omitted, so an
    /// empty list means none of the selection could be resolved.
    async fn summaries_for(&self, script_ids: &[String]) -> Result<Vec<SummaryRecord>>;
}
