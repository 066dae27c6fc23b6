//! JSON payloads returned by the handlers.

use serde::{Deserialize, Serialize};

pub const EMBED_STATUS: &str = "Document embedded and indexed.";
pub const NO_MATCH_ANSWER: &str = "No relevant information found in the document for your question.";
pub const NO_CITATION: &str = "N/A";
pub const NO_SUPPORT: &str = "No supporting evidence found in the document.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub status: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citation: String,
    pub snippet: String,
    /// Cosine distance of the chunk used as context. Absent when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl AskResponse {
    pub fn no_match() -> Self {
        Self { answer: NO_MATCH_ANSWER.to_string(), citation: NO_CITATION.to_string(), snippet: String::new(), score: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub score: u8,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub traceback: String,
}
