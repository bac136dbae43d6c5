pub mod ranking;
pub mod similarity;

pub use ranking::{
    build_sources, dedupe_by_document, rank_summaries, stabilize_chunks,
};
pub use similarity::{cosine_similarity, select_relevant_chunks};
