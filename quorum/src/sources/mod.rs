mod summaries;
mod traits;
mod transcripts;

pub use summaries::HttpSummaryIndex;
pub use traits::{SummaryIndex, TranscriptStore};
pub use transcripts::HttpTranscriptStore;
