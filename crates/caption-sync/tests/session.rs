mod common;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use caption_sync::{
    CaptionController, Error, MemoryStore, Session, SessionLifecycleEvent, SharedDocument,
    TranslationConfig,
};
use common::{
    FakeProvider, PREFIX, RecordingRuntime, advance_to, cue_translations, lecture_page, select,
};
use cue_translate_interface::TranslationProvider;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const SENTENCES: &[&str] = &["I love Tom and", "Lilly.", "See you soon."];

fn enabled() -> TranslationConfig {
    TranslationConfig {
        enabled: true,
        ..Default::default()
    }
}

struct Harness {
    doc: SharedDocument,
    provider: Arc<FakeProvider>,
    runtime: Arc<RecordingRuntime>,
    config_tx: watch::Sender<TranslationConfig>,
    cancel: CancellationToken,
    session: Session,
}

fn harness(doc: SharedDocument, config: TranslationConfig) -> Harness {
    let provider = Arc::new(FakeProvider::new(17));
    let runtime = Arc::new(RecordingRuntime::default());
    let (config_tx, config_rx) = watch::channel(config.clone());
    let cancel = CancellationToken::new();

    let factory = {
        let provider = provider.clone();
        move |_: &TranslationConfig| -> Arc<dyn TranslationProvider> { provider.clone() }
    };
    let controller =
        CaptionController::new(doc.clone(), Rc::new(MemoryStore::new(config)), factory);
    let session = Session::new(controller, runtime.clone(), config_rx, cancel.clone());

    Harness {
        doc,
        provider,
        runtime,
        config_tx,
        cancel,
        session,
    }
}

fn overlay_lines(doc: &SharedDocument) -> Vec<String> {
    let doc = doc.borrow();
    let overlay = select(&doc, r#"[data-purpose="captions-cue-text"]"#)[0];
    doc.element_children(overlay)
        .into_iter()
        .map(|n| doc.text_content(n))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_session_translates_follows_playback_and_restores() {
    let Harness {
        doc,
        provider,
        runtime,
        config_tx,
        cancel,
        session,
    } = harness(lecture_page(SENTENCES), enabled());

    let driver = async {
        sleep(Duration::from_secs(5)).await;

        assert_eq!(provider.calls().len(), 1);
        assert!(cue_translations(&doc.borrow()).iter().all(Option::is_some));
        assert_eq!(
            overlay_lines(&doc),
            vec![format!("{PREFIX}I love Tom and Lilly."), "I love Tom and".to_string()]
        );
        {
            let doc = doc.borrow();
            assert!(doc.get_element_by_id("cuebridge-progress").is_none());
            assert!(!select(&doc, ".cuebridge-settings").is_empty());
        }

        // Nothing writes while the page is idle.
        let settled = doc.borrow().mutation_count();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(doc.borrow().mutation_count(), settled);

        advance_to(&mut doc.borrow_mut(), 2);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            overlay_lines(&doc),
            vec![format!("{PREFIX}See you soon."), "See you soon.".to_string()]
        );

        config_tx
            .send(TranslationConfig {
                enabled: false,
                ..enabled()
            })
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        {
            let doc = doc.borrow();
            assert!(cue_translations(&doc).iter().all(Option::is_none));
            assert!(select(&doc, "[data-original-text]").is_empty());
            assert!(select(&doc, ".cuebridge-caption, .cuebridge-settings").is_empty());
            let overlay = select(&doc, r#"[data-purpose="captions-cue-text"]"#)[0];
            assert_eq!(doc.text_content(overlay), "See you soon.");
        }

        cancel.cancel();
    };

    let (result, ()) = tokio::join!(session.run(), driver);
    result.unwrap();

    assert_eq!(
        runtime.lifecycle(),
        vec![
            SessionLifecycleEvent::Started {
                engine: "chrome".to_string()
            },
            SessionLifecycleEvent::Stopped,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_host_overwrite_is_replaced_without_feedback() {
    let Harness {
        doc,
        cancel,
        session,
        ..
    } = harness(lecture_page(SENTENCES), enabled());

    let driver = async {
        sleep(Duration::from_secs(5)).await;
        let overlay = select(&doc.borrow(), r#"[data-purpose="captions-cue-text"]"#)[0];

        // The player rewrites the caption for the same cue.
        doc.borrow_mut()
            .set_text_content(overlay, "I love Tom and")
            .unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            overlay_lines(&doc),
            vec![format!("{PREFIX}I love Tom and Lilly."), "I love Tom and".to_string()]
        );

        let settled = doc.borrow().mutation_count();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(doc.borrow().mutation_count(), settled);

        cancel.cancel();
    };

    let (result, ()) = tokio::join!(session.run(), driver);
    result.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_language_change_restarts_pipeline() {
    let Harness {
        doc,
        provider,
        runtime,
        config_tx,
        cancel,
        session,
    } = harness(lecture_page(SENTENCES), enabled());

    let driver = async {
        sleep(Duration::from_secs(5)).await;
        config_tx
            .send(TranslationConfig {
                target_language: "Japanese".to_string(),
                ..enabled()
            })
            .unwrap();
        sleep(Duration::from_secs(5)).await;

        let targets: Vec<String> = provider
            .calls()
            .into_iter()
            .map(|c| c.target_language)
            .collect();
        assert_eq!(targets, vec!["Korean", "Japanese"]);
        assert!(cue_translations(&doc.borrow()).iter().all(Option::is_some));

        cancel.cancel();
    };

    let (result, ()) = tokio::join!(session.run(), driver);
    result.unwrap();
    assert!(
        runtime
            .lifecycle()
            .contains(&SessionLifecycleEvent::Restarted)
    );
}

#[tokio::test(start_paused = true)]
async fn test_disabled_session_waits_for_enable() {
    let Harness {
        doc,
        provider,
        config_tx,
        cancel,
        runtime,
        session,
        ..
    } = harness(lecture_page(SENTENCES), TranslationConfig::default());

    let driver = async {
        sleep(Duration::from_secs(2)).await;
        assert!(provider.calls().is_empty());
        assert!(select(&doc.borrow(), ".cuebridge-settings").is_empty());

        config_tx.send(enabled()).unwrap();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.calls().len(), 1);

        cancel.cancel();
    };

    let (result, ()) = tokio::join!(session.run(), driver);
    result.unwrap();
    assert_eq!(
        runtime.lifecycle().last(),
        Some(&SessionLifecycleEvent::Stopped)
    );
    assert_eq!(
        runtime
            .lifecycle()
            .iter()
            .filter(|e| **e == SessionLifecycleEvent::Stopped)
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_panel_fails_startup() {
    let doc = lecture_page(SENTENCES);
    {
        let mut doc = doc.borrow_mut();
        let panel = select(&doc, r#"[data-purpose="transcript-panel"]"#)[0];
        doc.remove(panel).unwrap();
    }
    let Harness {
        runtime, session, ..
    } = harness(doc, enabled());

    let result = session.run().await;
    assert!(matches!(
        result,
        Err(Error::HostElementNotFound {
            detector: "transcript_panel",
            ..
        })
    ));
    assert!(matches!(
        runtime.lifecycle().last(),
        Some(SessionLifecycleEvent::StartupFailed { .. })
    ));
}
