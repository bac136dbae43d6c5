//! Transcript fetching, chunking and chunk-level selection.

use crate::error::{QuorumError, Result};
use crate::models::{Chunk, Document, EmbeddedChunk};
use crate::pipeline::runner::QaPipeline;
use crate::pipeline::state::{PipelineState, Step, Transition};
use crate::processing::clean_text;
use crate::search::select_relevant_chunks;

impl QaPipeline {
    pub(super) async fn fetch_transcripts(&self, state: &PipelineState) -> Result<Transition> {
        let documents = self
            .bounded(self.deps.transcripts.fetch(&state.selected_document_ids))
            .await?;

        tracing::info!(
            requested = state.selected_document_ids.len(),
            fetched = documents.len(),
            "Transcripts fetched"
        );

        let next = if documents.is_empty() {
            tracing::warn!("Transcript service returned no documents");
            Step::GenerateAnswer
        } else {
            Step::ChunkAndEmbed
        };

        Ok(Transition::Next(next, state.clone().with_documents(documents)))
    }

    /// Split every fetched document and embed its chunks. Any embedding failure aborts
    /// the step; a document is never left partially embedded.
    pub(super) async fn chunk_and_embed(&self, state: &PipelineState) -> Result<Transition> {
        let mut embedded = Vec::new();

        for document in &state.documents {
            let chunks = self.chunk_document(document);
            if chunks.is_empty() {
                tracing::debug!(script_id = %document.script_id, "Document has no text");
                continue;
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .bounded(self.deps.embedder.embed_batch(&texts))
                .await
                .map_err(|e| {
                    QuorumError::Embedding(format!(
                        "Failed to embed chunks of {}: {e}",
                        document.script_id
                    ))
                })?;

            if vectors.len() != chunks.len() {
                return Err(QuorumError::Embedding(format!(
                    "Expected {} embeddings for {}, got {}",
                    chunks.len(),
                    document.script_id,
                    vectors.len()
                )));
            }

            tracing::debug!(
                script_id = %document.script_id,
                chunks = chunks.len(),
                "Document chunked and embedded"
            );

            embedded.extend(
                chunks
                    .into_iter()
                    .zip(vectors)
                    .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding }),
            );
        }

        tracing::info!(
            documents = state.documents.len(),
            chunks = embedded.len(),
            "Chunking complete"
        );

        Ok(Transition::Next(
            Step::SelectChunks,
            state.clone().with_embedded_chunks(embedded),
        ))
    }

    pub(super) async fn select_chunks(&self, state: &PipelineState) -> Result<Transition> {
        let query = state.query_embedding.as_deref().ok_or_else(|| {
            QuorumError::Internal("Query embedding missing before chunk selection".to_string())
        })?;

        let retrieval = &self.settings.retrieval;
        let relevant = select_relevant_chunks(
            query,
            &state.embedded_chunks,
            retrieval.chunk_threshold,
            retrieval.chunk_top_k,
        );

        tracing::info!(
            candidates = state.embedded_chunks.len(),
            chunks = relevant.len(),
            threshold = retrieval.chunk_threshold,
            "Relevant chunks selected"
        );

        Ok(Transition::Next(
            Step::GenerateAnswer,
            state.clone().with_relevant_chunks(relevant),
        ))
    }

    fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let text = clean_text(&document.full_text());
        self.chunker
            .chunk(&text)
            .into_iter()
            .map(|window| Chunk {
                script_id: document.script_id.clone(),
                chunk_index: window.index,
                text: window.content,
                title: document.title.clone(),
                timestamp: document.timestamp.clone(),
            })
            .collect()
    }
}
