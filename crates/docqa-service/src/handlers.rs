use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;

use docqa_core::config::Settings;
use docqa_core::error::Error;
use docqa_core::loader::load_and_split;
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::{Chunk, GenerationTask, ScoredChunk};
use docqa_embed::get_default_embedder;
use docqa_generate::{answer_prompt, clean_question, get_default_generator, question_prompt, summary_prompt, InputWindow};
use docqa_vector::{IndexBuilder, IndexQuery};

use crate::responses::{
    AskResponse, DocumentsResponse, EmbedResponse, EvaluateResponse, QuestionsResponse, SummaryResponse,
    EMBED_STATUS, NO_SUPPORT,
};
use crate::uploads::UploadStore;

const PREVIEW_CHARS: usize = 200;
const JUSTIFICATION_CHARS: usize = 120;

/// Where a document comes from: a fresh upload or a file already in the
/// upload directory.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Upload { file_name: String, bytes: Vec<u8> },
    Existing(String),
}

/// Entry point for every document operation.
///
/// Holds no per-document state: the only thing shared between calls is the
/// index directory, which `embed` replaces wholesale.
pub struct DocQa {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    uploads: UploadStore,
    window: InputWindow,
}

impl DocQa {
    pub fn new(settings: Settings, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Result<Self> {
        let window = InputWindow::from_settings(&settings.generation)?;
        let uploads = UploadStore::new(&settings.storage.upload_dir);
        Ok(Self { settings, embedder, generator, uploads, window })
    }

    /// Build the embedder and generator named in `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
        let generator = get_default_generator(&settings.generation)?;
        Self::new(settings, embedder, generator)
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub async fn embed(&self, source: DocumentSource) -> Result<EmbedResponse> {
        let chunks = self.load_chunks(source).await?;
        tracing::info!(chunks = chunks.len(), "embedding document");
        for chunk in &chunks {
            tracing::debug!(chunk = chunk.chunk_index + 1, preview = %preview(&chunk.content, PREVIEW_CHARS), "chunk");
        }
        let builder = IndexBuilder::new(&self.settings.storage.index_dir, &self.settings.storage.table);
        let written = builder.build(&chunks, Arc::clone(&self.embedder)).await?;
        Ok(EmbedResponse { status: EMBED_STATUS.to_string(), chunks: written })
    }

    pub async fn summarize(&self, source: DocumentSource) -> Result<SummaryResponse> {
        let chunks = self.load_non_empty(source).await?;
        let text = join_contents(chunks.iter());
        let input = self.window.truncate(&text, self.settings.generation.summary_window)?;
        let summary = self.generator.generate(GenerationTask::Summarize, &summary_prompt(&input)).await?;
        Ok(SummaryResponse { summary: summary.trim().to_string() })
    }

    /// Answer from the single closest chunk, or the fixed no-match reply when
    /// nothing is within `retrieval.score_threshold`.
    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".into()).into());
        }
        let hits = self.search(question).await?;
        tracing::info!(question, results = hits.len(), "retrieved chunks");
        for (rank, hit) in hits.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                distance = hit.distance,
                citation = %hit.chunk.citation(),
                preview = %preview(&hit.chunk.content, PREVIEW_CHARS),
                "search result"
            );
        }

        let threshold = self.settings.retrieval.score_threshold;
        let Some(best) = hits.into_iter().next().filter(|h| h.distance <= threshold) else {
            tracing::info!(threshold, "no chunk within threshold");
            return Ok(AskResponse::no_match());
        };
        let answer = self
            .generator
            .generate(GenerationTask::Answer, &answer_prompt(&best.chunk.content, question))
            .await?;
        Ok(AskResponse {
            answer: answer.trim().to_string(),
            citation: best.chunk.citation(),
            snippet: best.chunk.content,
            score: Some(best.distance),
        })
    }

    pub async fn generate_questions(&self, source: DocumentSource) -> Result<QuestionsResponse> {
        let chunks = self.load_non_empty(source).await?;
        let text = join_contents(sample_chunks(&chunks).into_iter());
        let input = self.window.truncate(&text, self.settings.generation.question_window)?;
        let raw = self.generator.generate(GenerationTask::Question, &question_prompt(&input)).await?;
        Ok(QuestionsResponse { questions: vec![clean_question(&raw)] })
    }

    /// Score 1 when some chunk lies within `retrieval.evaluate_threshold` of
    /// the answer. This measures topical overlap, not correctness.
    pub async fn evaluate(&self, answer: &str) -> Result<EvaluateResponse> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::InvalidRequest("answer must not be empty".into()).into());
        }
        let hits = self.search(answer).await?;
        let threshold = self.settings.retrieval.evaluate_threshold;
        match hits.first().filter(|h| h.distance <= threshold) {
            Some(hit) => {
                tracing::info!(distance = hit.distance, citation = %hit.chunk.citation(), "answer supported");
                Ok(EvaluateResponse {
                    score: 1,
                    justification: format!(
                        "Your answer is supported by: '{}...'",
                        preview(&hit.chunk.content, JUSTIFICATION_CHARS)
                    ),
                })
            }
            None => Ok(EvaluateResponse { score: 0, justification: NO_SUPPORT.to_string() }),
        }
    }

    pub fn list_documents(&self) -> DocumentsResponse {
        DocumentsResponse { documents: self.uploads.list() }
    }

    async fn search(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let index = IndexQuery::open(
            &self.settings.storage.index_dir,
            &self.settings.storage.table,
            Arc::clone(&self.embedder),
        )
        .await?;
        index.search(query, self.settings.retrieval.top_k).await
    }

    async fn materialize(&self, source: DocumentSource) -> Result<PathBuf> {
        match source {
            DocumentSource::Upload { file_name, bytes } => self.uploads.save(&file_name, &bytes).await,
            DocumentSource::Existing(name) => self.uploads.resolve_existing(&name),
        }
    }

    async fn load_chunks(&self, source: DocumentSource) -> Result<Vec<Chunk>> {
        let path = self.materialize(source).await?;
        let config = self.settings.chunking;
        tokio::task::spawn_blocking(move || load_and_split(&path, &config))
            .await
            .map_err(|e| anyhow!("document loading task failed: {e}"))?
    }

    async fn load_non_empty(&self, source: DocumentSource) -> Result<Vec<Chunk>> {
        let chunks = self.load_chunks(source).await?;
        if chunks.iter().all(|c| c.content.trim().is_empty()) {
            return Err(Error::NoExtractableText.into());
        }
        Ok(chunks)
    }
}

/// First, middle and last chunk for documents of three or more chunks,
/// otherwise all of them.
pub fn sample_chunks(chunks: &[Chunk]) -> Vec<&Chunk> {
    let n = chunks.len();
    if n >= 3 {
        vec![&chunks[0], &chunks[n / 2], &chunks[n - 1]]
    } else {
        chunks.iter().collect()
    }
}

fn join_contents<'a>(chunks: impl Iterator<Item = &'a Chunk>) -> String {
    chunks.map(|c| c.content.as_str()).collect::<Vec<_>>().join(" ")
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
