//! Reconciling model quotes against the retrieved chunks.
//!
//! Each quote walks a cascade of progressively looser matches over the stabilized chunk
//! list and takes the first chunk that satisfies a tier:
//!
//! 1. exact substring
//! 2. substring after normalization (punctuation dropped, whitespace collapsed, lowercased)
//! 3. the first three normalized words all occur in the chunk
//! 4. at least two normalized words occur in the chunk
//! 5. the top-ranked chunk, tagged as a fallback
//!
//! Words in tiers 3 and 4 occur when they are a substring of the normalized chunk, so
//! `approve` is found in `approved`.
//!
//! A quote is never dropped: with no chunks at all it comes back with empty metadata.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{EvidenceQuote, MatchMethod, Quote, ScoredChunk};

const LEADING_WORDS: usize = 3;
const MIN_SHARED_WORDS: usize = 2;

fn separators_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s.,!?;:]+").expect("static regex"))
}

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{P}").expect("static regex"))
}

/// Lowercase, turn sentence punctuation into spaces, drop remaining punctuation and
/// collapse whitespace. `"Don't,  stop!"` becomes `"dont stop"`.
pub fn normalize(text: &str) -> String {
    let spaced = separators_re().replace_all(text, " ");
    let stripped = punctuation_re().replace_all(&spaced, "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct PreparedChunk<'a> {
    scored: &'a ScoredChunk,
    normalized: String,
}

impl<'a> PreparedChunk<'a> {
    fn new(scored: &'a ScoredChunk) -> Self {
        Self {
            scored,
            normalized: normalize(&scored.chunk.text),
        }
    }

    fn mentions(&self, word: &str) -> bool {
        self.normalized.contains(word)
    }
}

/// Reconciles quotes against one stabilized chunk list.
pub struct EvidenceMatcher<'a> {
    chunks: Vec<PreparedChunk<'a>>,
}

impl<'a> EvidenceMatcher<'a> {
    /// `chunks` must already be in stabilized order; the fallback tier takes the first.
    pub fn new(chunks: &'a [ScoredChunk]) -> Self {
        Self {
            chunks: chunks.iter().map(PreparedChunk::new).collect(),
        }
    }

    pub fn reconcile(&self, quotes: &[Quote]) -> Vec<EvidenceQuote> {
        quotes.iter().map(|quote| self.reconcile_one(quote)).collect()
    }

    pub fn reconcile_one(&self, quote: &Quote) -> EvidenceQuote {
        match self.find(&quote.text) {
            Some((chunk, method)) => {
                if method == MatchMethod::Fallback {
                    tracing::warn!(
                        quote = %preview(&quote.text),
                        script_id = %chunk.chunk.script_id,
                        "Quote not found in any chunk, attributing to top chunk"
                    );
                } else {
                    tracing::debug!(
                        quote = %preview(&quote.text),
                        method = ?method,
                        chunk_index = chunk.chunk.chunk_index,
                        "Quote matched"
                    );
                }
                EvidenceQuote {
                    quote: quote.text.clone(),
                    speaker: quote.speaker.clone(),
                    script_id: Some(chunk.chunk.script_id.clone()),
                    meeting_title: Some(chunk.chunk.title.clone()),
                    meeting_date: chunk.chunk.timestamp.clone(),
                    chunk_index: Some(chunk.chunk.chunk_index),
                    relevance_score: Some(chunk.relevance_score),
                    match_method: method,
                }
            }
            None => {
                tracing::warn!(quote = %preview(&quote.text), "No chunks to match quote against");
                EvidenceQuote::unmatched(quote)
            }
        }
    }

    fn find(&self, quote: &str) -> Option<(&'a ScoredChunk, MatchMethod)> {
        let first = self.chunks.first()?;

        if let Some(hit) = self.chunks.iter().find(|c| c.scored.chunk.text.contains(quote)) {
            return Some((hit.scored, MatchMethod::Exact));
        }

        let normalized = normalize(quote);
        if !normalized.is_empty() {
            if let Some(hit) = self.chunks.iter().find(|c| c.normalized.contains(&normalized)) {
                return Some((hit.scored, MatchMethod::Normalized));
            }
        }

        let words: Vec<&str> = normalized.split_whitespace().collect();

        if words.len() >= LEADING_WORDS {
            let leading = &words[..LEADING_WORDS];
            if let Some(hit) = self
                .chunks
                .iter()
                .find(|c| leading.iter().all(|w| c.mentions(w)))
            {
                return Some((hit.scored, MatchMethod::LeadingWords));
            }
        }

        if words.len() >= MIN_SHARED_WORDS {
            if let Some(hit) = self.chunks.iter().find(|c| {
                words.iter().filter(|w| c.mentions(w)).count() >= MIN_SHARED_WORDS
            }) {
                return Some((hit.scored, MatchMethod::PartialWords));
            }
        }

        Some((first.scored, MatchMethod::Fallback))
    }
}

fn preview(text: &str) -> String {
    text.chars().take(30).collect()
}
