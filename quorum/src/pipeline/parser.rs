//! Turning raw completion text into an answer plus quotes.
//!
//! The JSON contract is tried first; when the payload does not parse, quoted
//! `("text", Speaker)` pairs are pulled out of the free text instead. Either way the
//! caller gets an answer string and a quote list, possibly both empty.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Quote;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub answer: String,
    pub quotes: Vec<Quote>,
}

/// A strategy for extracting a [`ParsedAnswer`] from completion output.
///
/// `None` means the payload is not in this parser's format.
pub trait StructuredAnswerParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, raw: &str) -> Option<ParsedAnswer>;
}

/// Parses `{"answer": "...", "quotes": [{"text": "...", "speaker": "..."}]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAnswerParser;

impl JsonAnswerParser {
    fn strip_code_fence(raw: &str) -> &str {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix("```") else {
            return trimmed;
        };
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    }

    fn quote_from(value: &Value) -> Option<Quote> {
        let text = value.get("text")?.as_str()?.trim();
        if text.is_empty() {
            return None;
        }
        let speaker = value
            .get("speaker")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        Some(Quote {
            text: text.to_string(),
            speaker,
        })
    }
}

impl StructuredAnswerParser for JsonAnswerParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, raw: &str) -> Option<ParsedAnswer> {
        let value: Value = serde_json::from_str(Self::strip_code_fence(raw)).ok()?;
        let object = value.as_object()?;

        let answer = match object.get("answer") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let quotes = object
            .get("quotes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::quote_from).collect())
            .unwrap_or_default();

        Some(ParsedAnswer { answer, quotes })
    }
}

fn quote_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\(\s*"([^"]+)"\s*,\s*([^()"]+?)\s*\)"#).expect("static regex")
    })
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("static regex"))
}

/// Fallback for free-text output: every `("quote", Speaker)` pair becomes a quote and
/// whatever remains is the answer. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexQuoteParser;

impl StructuredAnswerParser for RegexQuoteParser {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn parse(&self, raw: &str) -> Option<ParsedAnswer> {
        let quotes = quote_pair_re()
            .captures_iter(raw)
            .map(|caps| Quote {
                text: caps[1].trim().to_string(),
                speaker: caps[2].trim().to_string(),
            })
            .collect();

        let stripped = quote_pair_re().replace_all(raw, "");
        let answer = blank_lines_re()
            .replace_all(stripped.trim(), "\n")
            .trim()
            .to_string();

        Some(ParsedAnswer { answer, quotes })
    }
}

/// Run the JSON parser, then the regex fallback.
pub fn parse_answer(raw: &str) -> ParsedAnswer {
    let parsers: [&dyn StructuredAnswerParser; 2] = [&JsonAnswerParser, &RegexQuoteParser];

    for parser in parsers {
        if let Some(parsed) = parser.parse(raw) {
            tracing::debug!(
                parser = parser.name(),
                answer_len = parsed.answer.len(),
                quotes = parsed.quotes.len(),
                "Parsed completion"
            );
            return parsed;
        }
        tracing::warn!(parser = parser.name(), "Completion did not match parser format");
    }

    ParsedAnswer::default()
}
