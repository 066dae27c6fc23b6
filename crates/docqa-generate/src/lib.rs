//! docqa-generate
//!
//! Text generation for summaries, answers and practice questions. The real
//! backend talks to an OpenAI-compatible completions server; `EchoGenerator`
//! stands in for it in tests and offline runs.

#![deny(warnings)]
#![deny(unused_imports)]

use anyhow::Result;
use std::sync::Arc;

use docqa_core::config::GenerationSettings;
use docqa_core::traits::Generator;

pub mod echo;
pub mod http;
pub mod prompt;
pub mod window;

pub use echo::EchoGenerator;
pub use http::HttpGenerator;
pub use prompt::{answer_prompt, clean_question, question_prompt, summary_prompt};
pub use window::InputWindow;

fn fake_forced_by_env() -> bool {
    std::env::var("APP_USE_FAKE_GENERATOR")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_generator(settings: &GenerationSettings) -> Result<Arc<dyn Generator>> {
    if settings.fake || fake_forced_by_env() {
        tracing::info!("using EchoGenerator");
        return Ok(Arc::new(EchoGenerator));
    }
    Ok(Arc::new(HttpGenerator::new(settings)?))
}
