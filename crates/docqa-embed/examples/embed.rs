//! Embed each argument and print pairwise cosine similarities.
//! `APP_USE_FAKE_EMBEDDINGS=1` skips loading the model.

use docqa_core::config::EmbeddingSettings;
use docqa_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let mut texts: Vec<String> = std::env::args().skip(1).collect();
    if texts.is_empty() {
        texts = vec!["boil water for one minute".to_string(), "purify drinking water".to_string()];
    }
    let embedder = get_default_embedder(&EmbeddingSettings::default())?;
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    for i in 0..embs.len() {
        for j in (i + 1)..embs.len() {
            let sim: f32 = embs[i].iter().zip(&embs[j]).map(|(a, b)| a * b).sum();
            println!("{sim:.4}  {:?} <> {:?}", texts[i], texts[j]);
        }
    }
    Ok(())
}
