use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::Tokenizer;

use docqa_core::config::GenerationSettings;

/// Cuts generator input down to a model's context window.
///
/// With a tokenizer the cut is exact; without one it keeps roughly three
/// words per four tokens.
pub struct InputWindow {
    tokenizer: Option<Tokenizer>,
}

impl InputWindow {
    pub fn new(tokenizer: Option<Tokenizer>) -> Self { Self { tokenizer } }

    pub fn approximate() -> Self { Self { tokenizer: None } }

    pub fn from_tokenizer_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
        Ok(Self::new(Some(tokenizer)))
    }

    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        match &settings.tokenizer {
            Some(path) => Self::from_tokenizer_file(path),
            None => Ok(Self::approximate()),
        }
    }

    /// `text` limited to `max_tokens`. Text that already fits is returned as is.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> Result<String> {
        match &self.tokenizer {
            Some(tokenizer) => {
                let encoding = tokenizer
                    .encode(text, false)
                    .map_err(|e| anyhow!("tokenizing generator input: {e}"))?;
                let ids = encoding.get_ids();
                if ids.len() <= max_tokens {
                    return Ok(text.to_string());
                }
                tracing::debug!(tokens = ids.len(), max_tokens, "truncating generator input");
                tokenizer
                    .decode(&ids[..max_tokens], true)
                    .map_err(|e| anyhow!("decoding truncated input: {e}"))
            }
            None => {
                let budget = max_tokens * 3 / 4;
                let words: Vec<&str> = text.split_whitespace().collect();
                if words.len() <= budget {
                    return Ok(text.to_string());
                }
                tracing::debug!(words = words.len(), budget, "truncating generator input by words");
                Ok(words[..budget].join(" "))
            }
        }
    }
}
