use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ProcessingConfig;

const SENTENCE_TERMINATORS: [&str; 3] = [".", "!", "?"];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Collapse runs of whitespace (newlines included) to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// Sliding-window chunker measured in grapheme clusters.
///
/// Windows are `chunk_size` graphemes long and pulled back to end on the last `.`, `!` or `?`
/// inside the window when that terminator lies past the window start. Consecutive windows
/// overlap by up to `chunk_overlap` graphemes; the cursor always moves forward by at least one.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self::with_sizes(config.chunk_size, config.chunk_overlap)
    }

    pub fn with_sizes(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let len = graphemes.len();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);

            if end < len {
                if let Some(boundary) = Self::last_sentence_end(&graphemes, start, end) {
                    if boundary > start {
                        end = boundary + 1;
                    }
                }
            }

            let window = graphemes[start..end].concat();
            let content = window.trim();
            if !content.is_empty() {
                chunks.push(TextChunk {
                    index: chunks.len(),
                    content: content.to_string(),
                    start,
                    end,
                });
            }

            if end >= len {
                break;
            }

            start = (start + 1).max(end.saturating_sub(self.chunk_overlap));
        }

        chunks
    }

    fn last_sentence_end(graphemes: &[&str], start: usize, end: usize) -> Option<usize> {
        (start..end)
            .rev()
            .find(|&i| SENTENCE_TERMINATORS.contains(&graphemes[i]))
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(&ProcessingConfig::default())
    }
}

/// One window of text. `start..end` is the grapheme range of the untrimmed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub content: String,
    pub start: usize,
    pub end: usize,
}
