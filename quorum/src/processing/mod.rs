mod chunker;

pub use chunker::{clean_text, TextChunk, TextChunker};
