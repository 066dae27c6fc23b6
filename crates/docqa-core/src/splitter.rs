//! Recursive character splitter.
//!
//! Tries separators from coarse to fine (`"\n\n"`, `"\n"`, `" "`, `""`),
//! greedily merges the resulting pieces into chunks of at most `chunk_size`
//! characters and carries up to `chunk_overlap` trailing characters into the
//! next chunk. Pieces that are still too long are split again with the next
//! separator. Lengths are counted in `char`s, never bytes.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 400, chunk_overlap: 100 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecursiveSplitter {
    config: ChunkingConfig,
}

impl RecursiveSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split `text` into ordered, trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
            .into_iter()
            .filter_map(|chunk| {
                let trimmed = chunk.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keep_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let ChunkingConfig { chunk_size, chunk_overlap } = self.config;
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > chunk_size && !window.is_empty() {
                if let Some(chunk) = join(&window) {
                    merged.push(chunk);
                }
                // keep at most `chunk_overlap` chars, and leave room for `piece`
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }
        if let Some(chunk) = join(&window) {
            merged.push(chunk);
        }
        merged
    }
}

/// Split on `separator`, keeping each separator attached to the start of the
/// piece that follows it. An empty separator splits into single chars.
fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
