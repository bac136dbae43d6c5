//! The retrieval-augmented answer pipeline.
//!
//! A run is an explicit state machine: [`QaPipeline`] executes one [`Step`] at a time,
//! each step hands back a [`Transition`], and the driver stops at the first terminal.
//!
//! ```text
//! summarize_memory -> enhance_question -> process_question
//!   -> search_corpus | search_selected (-> document_not_found)
//!   -> fetch_transcripts -> chunk_and_embed -> select_chunks
//!   -> generate_answer -> evaluate_answer (-> improve_answer -> evaluate_answer)
//! ```

pub mod answer;
pub mod evidence;
mod memory;
pub mod parser;
pub mod quality;
pub mod retrieval;
mod runner;
pub mod state;
mod transcripts;

pub use evidence::EvidenceMatcher;
pub use parser::{parse_answer, JsonAnswerParser, ParsedAnswer, RegexQuoteParser, StructuredAnswerParser};
pub use quality::QualityGate;
pub use runner::{Collaborators, PipelineSettings, QaPipeline};
pub use state::{PipelineState, StageFailure, Step, Transition};
