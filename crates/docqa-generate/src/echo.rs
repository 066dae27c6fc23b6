use anyhow::Result;
use async_trait::async_trait;

use docqa_core::traits::Generator;
use docqa_core::types::GenerationTask;

/// Deterministic generator: a task prefix followed by the last non-empty
/// line of the prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl EchoGenerator {
    pub fn prefix(task: GenerationTask) -> &'static str {
        match task {
            GenerationTask::Summarize => "Summary: ",
            GenerationTask::Answer => "Answer: ",
            GenerationTask::Question => "1. Question: ",
        }
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, task: GenerationTask, prompt: &str) -> Result<String> {
        let last = prompt.lines().rev().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
        Ok(format!("{}{}", Self::prefix(task), last))
    }
}
