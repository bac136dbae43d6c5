use std::sync::OnceLock;

use regex::Regex;

use crate::config::QualityConfig;

/// Score used when the grader fails or replies with something that is not a score.
pub const DEFAULT_SCORE: u8 = 3;

const APOLOGY_PATTERNS: &[&str] = &[
    "i'm sorry",
    "i am sorry",
    "i apologize",
    "unable to find",
    "could not find",
    "couldn't find",
    "cannot find",
    "can't find",
    "not enough information",
    "no information",
    "does not contain",
    "doesn't contain",
    "not mentioned",
];

fn score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-5])\b").expect("static regex"))
}

/// Rule-based grading and the improvement decision.
#[derive(Debug, Clone)]
pub struct QualityGate {
    min_answer_chars: usize,
}

impl QualityGate {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            min_answer_chars: config.min_answer_chars,
        }
    }

    /// Score an answer without the grader, if a rule applies.
    pub fn rule_score(&self, answer: &str, context_is_empty: bool) -> Option<u8> {
        if context_is_empty {
            return Some(1);
        }
        let lowered = answer.to_lowercase();
        if APOLOGY_PATTERNS.iter().any(|p| lowered.contains(p)) {
            return Some(1);
        }
        if answer.trim().chars().count() < self.min_answer_chars {
            return Some(2);
        }
        None
    }

    /// Read a 1-5 score from grader output. A 4 is demoted to 3 so it still qualifies
    /// for the improvement pass.
    pub fn parse_grader_score(raw: &str) -> Option<u8> {
        let caps = score_re().captures(raw.trim())?;
        let score: u8 = caps[1].parse().ok()?;
        Some(if score == 4 { 3 } else { score })
    }

    pub fn should_improve(score: u8, improvement_attempts: u8) -> bool {
        improvement_attempts == 0 && score <= 4
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}
