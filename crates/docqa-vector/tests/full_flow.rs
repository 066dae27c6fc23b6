use std::sync::Arc;

use docqa_core::error::Error;
use docqa_core::splitter::{ChunkingConfig, RecursiveSplitter};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_embed::FakeEmbedder;
use docqa_vector::{IndexBuilder, IndexQuery};
use tempfile::TempDir;

const TABLE: &str = "chunks";

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(FakeEmbedder::new(256))
}

fn chunks_of(source: &str, text: &str) -> Vec<Chunk> {
    let pieces = RecursiveSplitter::new(ChunkingConfig::default()).split(text);
    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| Chunk { content, source: source.to_string(), chunk_index, total_chunks: total })
        .collect()
}

fn survival_doc() -> String {
    [
        "Fire starting requires tinder kindling and fuel wood arranged so air can flow beneath the flame.",
        "Water purification can be done by boiling for one minute or by filtering through sand charcoal and cloth.",
        "Shelter should be built on high ground away from dead branches and sheltered from prevailing wind.",
        "Food storage in root cellars keeps potatoes carrots and apples fresh through the winter months.",
    ]
    .join("\n\n")
}

#[tokio::test]
async fn build_then_query_returns_exact_chunk_first() {
    let tmp = TempDir::new().expect("tmp");
    let index_dir = tmp.path().join("index");
    let mut many = Vec::new();
    for (i, para) in survival_doc().split("\n\n").enumerate() {
        many.push(Chunk { content: para.to_string(), source: "survival.txt".into(), chunk_index: i, total_chunks: 4 });
    }

    let builder = IndexBuilder::new(&index_dir, TABLE);
    let written = builder.build(&many, embedder()).await.expect("build");
    assert_eq!(written, 4);

    let query = IndexQuery::open(&index_dir, TABLE, embedder()).await.expect("open");
    let target = &many[1];
    let hits = query.search(&target.content, 3).await.expect("search");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk, *target);
    assert!(hits[0].distance.abs() < 1e-4, "exact text has ~zero distance, got {}", hits[0].distance);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance, "results ascend by distance");
    }
}

#[tokio::test]
async fn rebuilding_discards_previous_document() {
    let tmp = TempDir::new().expect("tmp");
    let index_dir = tmp.path().join("index");
    let builder = IndexBuilder::new(&index_dir, TABLE);

    let first = chunks_of("first.txt", "Lighthouse keepers logged every passing ship in a leather bound journal.");
    builder.build(&first, embedder()).await.expect("first build");

    let second = chunks_of("second.txt", "Beekeepers harvest honey in late summer after the main nectar flow.");
    builder.build(&second, embedder()).await.expect("second build");

    let query = IndexQuery::open(&index_dir, TABLE, embedder()).await.expect("open");
    let hits = query.search(&first[0].content, 3).await.expect("search");
    assert_eq!(hits.len(), 1, "only the new document remains");
    assert_eq!(hits[0].chunk.source, "second.txt");
    assert!(hits.iter().all(|h| h.chunk.content != first[0].content));
}

#[tokio::test]
async fn query_before_build_is_index_not_found() {
    let tmp = TempDir::new().expect("tmp");
    let missing = tmp.path().join("nothing-here");
    let err = IndexQuery::open(&missing, TABLE, embedder()).await.err().expect("missing index");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexNotFound(_))));

    std::fs::create_dir_all(&missing).expect("mkdir");
    let err = IndexQuery::open(&missing, TABLE, embedder()).await.err().expect("empty dir");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexNotFound(_))));
}

#[tokio::test]
async fn empty_chunk_list_keeps_existing_index() {
    let tmp = TempDir::new().expect("tmp");
    let index_dir = tmp.path().join("index");
    let builder = IndexBuilder::new(&index_dir, TABLE);
    builder.build(&chunks_of("a.txt", "alpha bravo charlie"), embedder()).await.expect("build");

    let err = builder.build(&[], embedder()).await.expect_err("empty");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoExtractableText)));
    assert!(IndexQuery::open(&index_dir, TABLE, embedder()).await.is_ok());
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { 8 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("model crashed"))
    }
}

#[tokio::test]
async fn embedding_failure_leaves_no_index() {
    let tmp = TempDir::new().expect("tmp");
    let index_dir = tmp.path().join("index");
    let builder = IndexBuilder::new(&index_dir, TABLE);
    builder.build(&chunks_of("a.txt", "alpha bravo charlie"), embedder()).await.expect("build");

    let err = builder
        .build(&chunks_of("b.txt", "delta echo foxtrot"), Arc::new(FailingEmbedder))
        .await
        .expect_err("embedding fails");
    assert!(format!("{err:#}").contains("model crashed"));
    assert!(!index_dir.exists(), "previous index was already removed");
}
