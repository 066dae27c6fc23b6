use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use docqa_core::config::GenerationSettings;
use docqa_core::traits::Generator;
use docqa_core::types::GenerationTask;

/// Client for an OpenAI-compatible `/completions` endpoint.
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    summarize_model: String,
    answer_model: String,
    question_model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Output budget per task, in tokens.
pub const fn max_tokens(task: GenerationTask) -> u32 {
    match task {
        GenerationTask::Summarize => 150,
        GenerationTask::Answer | GenerationTask::Question => 256,
    }
}

impl HttpGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            summarize_model: settings.summarize_model.clone(),
            answer_model: settings.answer_model.clone(),
            question_model: settings.question_model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }

    fn model_for(&self, task: GenerationTask) -> &str {
        match task {
            GenerationTask::Summarize => &self.summarize_model,
            GenerationTask::Answer => &self.answer_model,
            GenerationTask::Question => &self.question_model,
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, task: GenerationTask, prompt: &str) -> Result<String> {
        let model = self.model_for(task);
        let body = CompletionRequest { model, prompt, max_tokens: max_tokens(task), temperature: 0.0 };
        let start = Instant::now();

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("calling {} for {task}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("generation request for {task} failed with {status}: {text}"));
        }
        let parsed: CompletionResponse = response.json().await.context("decoding completion response")?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| anyhow!("generation response for {task} had no choices"))?;

        tracing::info!(%task, model, elapsed_ms = start.elapsed().as_millis() as u64, "generated text");
        Ok(text)
    }
}
