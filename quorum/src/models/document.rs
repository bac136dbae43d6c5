use serde::{Deserialize, Serialize};

/// One speaker turn of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentContent {
    Text(String),
    Segments(Vec<Segment>),
}

/// A meeting transcript fetched for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub script_id: String,
    pub title: String,
    pub timestamp: Option<String>,
    pub content: DocumentContent,
}

impl Document {
    pub fn from_text(
        script_id: impl Into<String>,
        title: impl Into<String>,
        timestamp: Option<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            script_id: script_id.into(),
            title: title.into(),
            timestamp,
            content: DocumentContent::Text(text.into()),
        }
    }

    /// Literal transcript text; segments render as one `speaker: text` line each.
    pub fn full_text(&self) -> String {
        match &self.content {
            DocumentContent::Text(text) => text.clone(),
            DocumentContent::Segments(segments) => segments
                .iter()
                .filter(|segment| !segment.text.trim().is_empty())
                .map(|segment| format!("{}: {}", segment.speaker, segment.text))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
