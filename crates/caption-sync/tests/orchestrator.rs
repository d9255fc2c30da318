mod common;

use std::sync::Arc;

use caption_sync::{
    Orchestrator, ProgressUpdate, TranslationCache, TranslationReport, TranslationStrategy,
};
use common::{
    FakeProvider, HangingProvider, PREFIX, ScriptedProvider, cue_translations, lecture_page,
    select,
};
use cue_translate_interface::{MARKUP_CALL_TIMEOUT, TEXT_CALL_TIMEOUT};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn panel(doc: &caption_sync::SharedDocument) -> cue_host_dom::NodeId {
    select(&doc.borrow(), r#"[data-purpose="transcript-panel"]"#)[0]
}

#[tokio::test(start_paused = true)]
async fn test_batches_correlate_under_random_completion() {
    let sentences: Vec<String> = (0..25).map(|i| format!("Sentence number {i}.")).collect();
    let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
    let doc = lecture_page(&refs);
    let provider = Arc::new(FakeProvider::new(42));

    let orchestrator = Orchestrator::new(
        doc.clone(),
        TranslationCache::shared(),
        provider.clone(),
        "Korean",
    )
    .with_batch_size(10);
    assert_eq!(orchestrator.strategy(), TranslationStrategy::Batched);

    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(
        report,
        TranslationReport {
            groups: 25,
            cached: 0,
            translated: 25,
            failed: 0,
            units: 3,
        }
    );
    assert_eq!(provider.calls().len(), 3);

    let expected: Vec<Option<String>> = sentences
        .iter()
        .map(|s| Some(format!("{PREFIX}{s}")))
        .collect();
    assert_eq!(cue_translations(&doc.borrow()), expected);
}

#[tokio::test(start_paused = true)]
async fn test_sentence_spanning_cues_is_one_group() {
    let doc = lecture_page(&["I love Tom and", "Lilly.", "See you soon."]);
    let provider = Arc::new(FakeProvider::new(3));
    let orchestrator =
        Orchestrator::new(doc.clone(), TranslationCache::shared(), provider, "Korean");

    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(report.groups, 2);
    assert_eq!(report.units, 1);

    let whole = Some(format!("{PREFIX}I love Tom and Lilly."));
    assert_eq!(
        cue_translations(&doc.borrow()),
        vec![
            whole.clone(),
            whole,
            Some(format!("{PREFIX}See you soon.")),
        ]
    );

    let doc = doc.borrow();
    let originals: Vec<String> = select(&doc, ".cuebridge-original")
        .into_iter()
        .map(|n| doc.text_content(n))
        .collect();
    assert_eq!(originals, vec!["I love Tom and", "Lilly.", "See you soon."]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_sentences_share_one_call() {
    let doc = lecture_page(&["Hello.", "Bye.", "Hello.", "Hello."]);
    let provider = Arc::new(FakeProvider::new(9).text_only());
    let cache = TranslationCache::shared();
    let orchestrator = Orchestrator::new(doc.clone(), cache.clone(), provider.clone(), "Korean");
    assert_eq!(orchestrator.strategy(), TranslationStrategy::Incremental);

    let first = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(first.translated, 4);
    assert_eq!(first.units, 2);
    let mut inputs: Vec<String> = provider.calls().into_iter().map(|c| c.input).collect();
    inputs.sort();
    assert_eq!(inputs, vec!["Bye.", "Hello."]);
    assert!(cue_translations(&doc.borrow()).iter().all(Option::is_some));

    // A second pass reads the preserved originals and never calls again.
    let second = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(second.cached, 4);
    assert_eq!(second.units, 0);
    assert_eq!(provider.calls().len(), 2);
    assert_eq!(cache.borrow().get("Hello."), Some("[KO] Hello."));
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_leaves_others_annotated() {
    let doc = lecture_page(&["First one.", "Broken one.", "Third one."]);
    let provider = Arc::new(FakeProvider::new(11).fail_on("Broken"));
    let cache = TranslationCache::shared();
    let orchestrator = Orchestrator::new(doc.clone(), cache.clone(), provider, "Korean")
        .with_batch_size(1);

    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(report.translated, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(
        cue_translations(&doc.borrow()),
        vec![
            Some(format!("{PREFIX}First one.")),
            None,
            Some(format!("{PREFIX}Third one.")),
        ]
    );

    let cache = cache.borrow();
    assert!(!cache.is_pending("Broken one."));
    assert!(cache.get("Broken one.").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_incremental_progress_reports_each_sentence() {
    let doc = lecture_page(&["One.", "Two.", "Three."]);
    let provider = Arc::new(FakeProvider::new(5).text_only());
    let orchestrator =
        Orchestrator::new(doc.clone(), TranslationCache::shared(), provider, "Korean");

    let (tx, mut rx) = mpsc::unbounded_channel();
    orchestrator.translate_transcript(panel(&doc), &tx).await;
    drop(tx);

    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    assert_eq!(
        updates,
        vec![
            ProgressUpdate::Started { total: 3 },
            ProgressUpdate::Advanced { completed: 1, total: 3 },
            ProgressUpdate::Advanced { completed: 2, total: 3 },
            ProgressUpdate::Advanced { completed: 3, total: 3 },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_detached_panel_is_a_no_op() {
    let doc = lecture_page(&["One."]);
    let panel = panel(&doc);
    doc.borrow_mut().remove(panel).unwrap();

    let provider = Arc::new(FakeProvider::new(1));
    let orchestrator =
        Orchestrator::new(doc.clone(), TranslationCache::shared(), provider.clone(), "Korean");
    let report = orchestrator.translate_transcript(panel, &()).await;
    assert_eq!(report, TranslationReport::default());
    assert!(provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_partial_reply_fails_only_missing_group() {
    let doc = lecture_page(&["One.", "Two."]);
    let provider = Arc::new(ScriptedProvider::new(
        r#"<div data-sentence-group="0"><div data-cue-index="0">하나.</div></div>"#,
    ));
    let cache = TranslationCache::shared();
    let orchestrator = Orchestrator::new(doc.clone(), cache.clone(), provider, "Korean");

    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(
        report,
        TranslationReport {
            groups: 2,
            cached: 0,
            translated: 1,
            failed: 1,
            units: 1,
        }
    );
    assert_eq!(
        cue_translations(&doc.borrow()),
        vec![Some("하나.".to_string()), None]
    );
    assert!(!cache.borrow().is_pending("Two."));
}

#[tokio::test(start_paused = true)]
async fn test_reply_with_literal_symbols_is_applied_whole() {
    let doc = lecture_page(&["If a is less than b.", "Tom and Jerry."]);
    let provider = Arc::new(ScriptedProvider::new(concat!(
        r#"<div data-sentence-group="0"><div data-cue-index="0">if a < b then</div></div>"#,
        r#"<div data-sentence-group="1"><div data-cue-index="0">Tom & Jerry &amp; co</div></div>"#,
    )));
    let orchestrator =
        Orchestrator::new(doc.clone(), TranslationCache::shared(), provider, "Korean");

    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert_eq!(report.translated, 2);
    assert_eq!(
        cue_translations(&doc.borrow()),
        vec![
            Some("if a < b then".to_string()),
            Some("Tom & Jerry & co".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_batched_call_times_out() {
    let doc = lecture_page(&["One.", "Two."]);
    let cache = TranslationCache::shared();
    let orchestrator = Orchestrator::new(
        doc.clone(),
        cache.clone(),
        Arc::new(HangingProvider { groups: true }),
        "Korean",
    );
    assert_eq!(orchestrator.strategy(), TranslationStrategy::Batched);

    let started = Instant::now();
    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert!(started.elapsed() >= MARKUP_CALL_TIMEOUT);
    assert_eq!(report.units, 1);
    assert_eq!(report.translated, 0);
    assert_eq!(report.failed, report.groups);
    assert_eq!(cue_translations(&doc.borrow()), vec![None, None]);
    assert!(!cache.borrow().is_pending("One."));
}

#[tokio::test(start_paused = true)]
async fn test_incremental_call_times_out() {
    let doc = lecture_page(&["One.", "Two."]);
    let orchestrator = Orchestrator::new(
        doc.clone(),
        TranslationCache::shared(),
        Arc::new(HangingProvider { groups: false }),
        "Korean",
    );
    assert_eq!(orchestrator.strategy(), TranslationStrategy::Incremental);

    let started = Instant::now();
    let report = orchestrator.translate_transcript(panel(&doc), &()).await;
    assert!(started.elapsed() >= TEXT_CALL_TIMEOUT);
    assert_eq!(report.units, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.failed, report.groups);
}
