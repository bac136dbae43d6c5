//! Grounded question answering over meeting transcripts.
//!
//! The HTTP surface lives in [`api`]; the answer flow itself is [`pipeline::QaPipeline`],
//! which talks to the outside world only through the [`embeddings::Embedder`],
//! [`llm::TextCompleter`], [`sources::TranscriptStore`] and [`sources::SummaryIndex`] traits.

pub mod api;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod search;
pub mod sources;
