mod answer;
mod chunk;
mod document;
mod evidence;
mod summary;

pub use answer::*;
pub use chunk::*;
pub use document::*;
pub use evidence::*;
pub use summary::*;

/// A candidate that carries a document identity and a relevance score.
///
/// Summaries and chunks are both ranked through this, so deduplication and ordering
/// rules apply identically to either.
pub trait ScoredCandidate {
    fn document_id(&self) -> &str;
    fn relevance_score(&self) -> f32;
}
