//! Domain types shared by the loader, the index and the request handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounded span of source text; the unit of embedding and retrieval.
///
/// - `content`: the text payload of the chunk
/// - `source`: file name of the document the chunk came from
/// - `chunk_index`/`total_chunks`: position within the parent document
///
/// Chunks carry no identity beyond their position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

impl Chunk {
    /// Human-readable citation, e.g. `report.pdf, chunk 3` (1-based).
    pub fn citation(&self) -> String {
        format!("{}, chunk {}", self.source, self.chunk_index + 1)
    }
}

/// A retrieved chunk and its distance to the query. Lower is closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Which generation step a prompt belongs to. Each maps to its own model
/// and output budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    Summarize,
    Answer,
    Question,
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Summarize => "summarize",
            Self::Answer => "answer",
            Self::Question => "question",
        };
        f.write_str(name)
    }
}
