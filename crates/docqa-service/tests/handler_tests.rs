use std::sync::Arc;
use tempfile::TempDir;

use docqa_core::config::Settings;
use docqa_core::error::Error;
use docqa_core::types::Chunk;
use docqa_embed::FakeEmbedder;
use docqa_generate::EchoGenerator;
use docqa_service::handlers::sample_chunks;
use docqa_service::responses::{EMBED_STATUS, NO_MATCH_ANSWER, NO_SUPPORT};
use docqa_service::{DocQa, DocumentSource};

const WATER: &str = "Water purification starts by settling murky river water inside a bucket, pouring its clear top \
layer through cloth plus sand filters, then boiling everything at a rolling boil for one full minute before letting \
it cool under a lid.";
const BEES: &str = "Beekeeping during winter means leaving enough capped honey in every hive, reducing each entrance \
against mice, tilting boxes forward so condensation drains out, and never opening colonies on cold mornings when \
clusters stay tight.";

fn app_in(tmp: &TempDir) -> DocQa {
    app_with(tmp, |_| {})
}

fn app_with(tmp: &TempDir, tweak: impl FnOnce(&mut Settings)) -> DocQa {
    let mut settings = Settings::default();
    settings.storage.upload_dir = tmp.path().join("uploads");
    settings.storage.index_dir = tmp.path().join("uploads").join("index");
    tweak(&mut settings);
    DocQa::new(settings, Arc::new(FakeEmbedder::new(1024)), Arc::new(EchoGenerator)).expect("app")
}

fn upload(name: &str, text: &str) -> DocumentSource {
    DocumentSource::Upload { file_name: name.to_string(), bytes: text.as_bytes().to_vec() }
}

fn homestead_doc() -> String {
    format!("{WATER}\n\n{BEES}")
}

/// Single-page PDF with an empty content stream, as left by a scanner.
fn textless_pdf() -> Vec<u8> {
    use lopdf::content::Content;
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id =
        doc.add_object(Stream::new(dictionary! {}, Content { operations: Vec::new() }.encode().expect("encode")));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

fn error_of(err: &anyhow::Error) -> Option<&Error> {
    err.chain().find_map(|e| e.downcast_ref::<Error>())
}

#[tokio::test]
async fn embed_then_ask_cites_the_matching_chunk() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);

    let embedded = app.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");
    assert_eq!(embedded.status, EMBED_STATUS);
    assert_eq!(embedded.chunks, 2);

    let reply = app.ask(BEES).await.expect("ask");
    assert_eq!(reply.citation, "homestead.txt, chunk 2");
    assert_eq!(reply.snippet, BEES);
    assert!(reply.answer.starts_with("Answer: "));
    assert!(reply.score.expect("score") < 1e-3);
}

#[tokio::test]
async fn unrelated_question_gets_fixed_no_match_reply() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");

    let reply = app.ask("quantum chromodynamics lattice gauge").await.expect("ask");
    assert_eq!(reply.answer, NO_MATCH_ANSWER);
    assert_eq!(reply.citation, "N/A");
    assert_eq!(reply.snippet, "");
    assert_eq!(reply.score, None);
}

#[tokio::test]
async fn score_threshold_controls_which_questions_are_answered() {
    const UNRELATED: &str = "quantum chromodynamics lattice gauge";
    const PARTIAL: &str = "capped honey inside every hive";

    let tmp = TempDir::new().expect("tmp");
    let lenient = app_with(&tmp, |s| s.retrieval.score_threshold = 2.0);
    lenient.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");
    let reply = lenient.ask(UNRELATED).await.expect("ask");
    assert!(reply.answer.starts_with("Answer: "), "{}", reply.answer);
    assert!(reply.citation.starts_with("homestead.txt, chunk "), "{}", reply.citation);
    assert!(reply.score.is_some());

    // Near zero rather than exactly zero: identical texts still carry float noise.
    let strict = app_with(&tmp, |s| s.retrieval.score_threshold = 1e-3);
    assert_eq!(strict.ask(UNRELATED).await.expect("ask").answer, NO_MATCH_ANSWER);
    assert_eq!(strict.ask(PARTIAL).await.expect("ask").answer, NO_MATCH_ANSWER);
    let exact = strict.ask(BEES).await.expect("ask");
    assert_eq!(exact.citation, "homestead.txt, chunk 2");
    assert!(exact.answer.starts_with("Answer: "));
}

#[tokio::test]
async fn evaluate_threshold_controls_support() {
    const UNRELATED: &str = "quantum chromodynamics lattice gauge";
    const PARTIAL: &str = "boiling river water";

    let tmp = TempDir::new().expect("tmp");
    let lenient = app_with(&tmp, |s| s.retrieval.evaluate_threshold = 2.0);
    lenient.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");
    assert_eq!(lenient.evaluate(UNRELATED).await.expect("evaluate").score, 1);

    let strict = app_with(&tmp, |s| s.retrieval.evaluate_threshold = 1e-3);
    let unsupported = strict.evaluate(PARTIAL).await.expect("evaluate");
    assert_eq!(unsupported.score, 0);
    assert_eq!(unsupported.justification, NO_SUPPORT);
    assert_eq!(strict.evaluate(WATER).await.expect("evaluate").score, 1);
}

#[tokio::test]
async fn ask_and_evaluate_before_embed_are_index_not_found() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    let err = app.ask("anything?").await.expect_err("no index");
    assert!(matches!(error_of(&err), Some(Error::IndexNotFound(_))));
    let err = app.evaluate("anything").await.expect_err("no index");
    assert!(matches!(error_of(&err), Some(Error::IndexNotFound(_))));
}

#[tokio::test]
async fn empty_question_and_answer_are_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    let err = app.ask("   ").await.expect_err("empty");
    assert!(matches!(error_of(&err), Some(Error::InvalidRequest(_))));
    let err = app.evaluate("").await.expect_err("empty");
    assert!(matches!(error_of(&err), Some(Error::InvalidRequest(_))));
}

#[tokio::test]
async fn unsupported_or_empty_uploads_do_not_touch_the_index() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");

    let err = app.embed(upload("notes.docx", "plain words")).await.expect_err("docx");
    assert!(matches!(error_of(&err), Some(Error::UnsupportedFileType(_))));

    let err = app.embed(upload("blank.txt", "  \n\n  ")).await.expect_err("blank");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)));
    assert_eq!(err.to_string(), "No extractable text found in the document.");

    let reply = app.ask(WATER).await.expect("index still there");
    assert_eq!(reply.citation, "homestead.txt, chunk 1");
}

#[tokio::test]
async fn pdf_without_text_is_no_extractable_text() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");
    let scanned = || DocumentSource::Upload { file_name: "scanned.pdf".into(), bytes: textless_pdf() };

    let err = app.embed(scanned()).await.expect_err("embed");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)), "{err:#}");
    let err = app.summarize(scanned()).await.expect_err("summarize");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)), "{err:#}");
    let err = app.generate_questions(DocumentSource::Existing("scanned.pdf".into())).await.expect_err("questions");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)), "{err:#}");

    let reply = app.ask(WATER).await.expect("index still there");
    assert_eq!(reply.citation, "homestead.txt, chunk 1");
}

#[tokio::test]
async fn embedding_a_second_document_replaces_the_first() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("water.txt", WATER)).await.expect("embed water");
    app.embed(upload("bees.txt", BEES)).await.expect("embed bees");

    let reply = app.ask(WATER).await.expect("ask");
    assert_ne!(reply.citation, "water.txt, chunk 1");
    let verdict = app.evaluate(WATER).await.expect("evaluate");
    assert_eq!(verdict.score, 0);
}

#[tokio::test]
async fn summarize_uses_the_whole_document() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    let reply = app.summarize(upload("homestead.txt", &homestead_doc())).await.expect("summarize");
    assert!(reply.summary.starts_with("Summary: "));
    assert!(reply.summary.contains("cold mornings"));

    let err = app.summarize(upload("blank.txt", "")).await.expect_err("blank");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)));
}

#[tokio::test]
async fn generate_questions_returns_one_clean_question() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    let reply = app.generate_questions(upload("homestead.txt", &homestead_doc())).await.expect("questions");
    assert_eq!(reply.questions.len(), 1);
    assert!(reply.questions[0].starts_with("Question: "), "{:?}", reply.questions);

    let err = app.generate_questions(upload("blank.txt", "\n")).await.expect_err("blank");
    assert!(matches!(error_of(&err), Some(Error::NoExtractableText)));
}

#[tokio::test]
async fn evaluate_scores_supported_and_unsupported_answers() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("homestead.txt", &homestead_doc())).await.expect("embed");

    let supported = app.evaluate(WATER).await.expect("evaluate");
    assert_eq!(supported.score, 1);
    let expected_prefix: String = WATER.chars().take(120).collect();
    assert_eq!(supported.justification, format!("Your answer is supported by: '{expected_prefix}...'"));

    let unsupported = app.evaluate("quantum chromodynamics lattice gauge").await.expect("evaluate");
    assert_eq!(unsupported.score, 0);
    assert_eq!(unsupported.justification, NO_SUPPORT);
}

#[tokio::test]
async fn existing_documents_are_listed_and_reusable() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("water.txt", WATER)).await.expect("embed");
    app.summarize(upload("bees.txt", BEES)).await.expect("summarize");
    let _ = app.embed(upload("sheet.docx", "ignored")).await;

    assert_eq!(app.list_documents().documents, vec!["bees.txt".to_string(), "water.txt".to_string()]);

    let embedded = app.embed(DocumentSource::Existing("bees.txt".into())).await.expect("existing");
    assert_eq!(embedded.chunks, 1);
    let reply = app.ask(BEES).await.expect("ask");
    assert_eq!(reply.citation, "bees.txt, chunk 1");

    let err = app.embed(DocumentSource::Existing("missing.txt".into())).await.expect_err("missing");
    assert!(matches!(error_of(&err), Some(Error::InvalidRequest(_))));
}

#[tokio::test]
async fn upload_names_cannot_escape_the_upload_dir() {
    let tmp = TempDir::new().expect("tmp");
    let app = app_in(&tmp);
    app.embed(upload("../../outside.txt", WATER)).await.expect("embed");
    assert!(tmp.path().join("uploads").join("outside.txt").is_file());
    assert!(!tmp.path().join("outside.txt").exists());

    let err = app.embed(upload("..", WATER)).await.expect_err("dot-dot");
    assert!(matches!(error_of(&err), Some(Error::InvalidRequest(_))));
}

#[test]
fn question_sampling_picks_first_middle_last() {
    let chunks: Vec<Chunk> = (0..7)
        .map(|i| Chunk { content: format!("c{i}"), source: "d.txt".into(), chunk_index: i, total_chunks: 7 })
        .collect();
    let picked: Vec<&str> = sample_chunks(&chunks).iter().map(|c| c.content.as_str()).collect();
    assert_eq!(picked, vec!["c0", "c3", "c6"]);

    let two = &chunks[..2];
    assert_eq!(sample_chunks(two).len(), 2);
}
