use async_trait::async_trait;

use crate::types::GenerationTask;

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Embed every text in one call. Returned vectors are L2-normalized and
    /// `dim()` long.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, task: GenerationTask, prompt: &str) -> anyhow::Result<String>;
}
