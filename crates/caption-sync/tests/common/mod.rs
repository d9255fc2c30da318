#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use caption_sync::markup::{GroupMarkup, build_batch_markup};
use caption_sync::{
    SessionDataEvent, SessionLifecycleEvent, SessionProgressEvent, SessionRuntime,
    SharedDocument,
};
use cue_host_dom::{Document, Selector};
use cue_translate_interface::{
    BoxFuture, CUE_INDEX_ATTR, Error, SENTENCE_GROUP_ATTR, TranslationProvider,
};

pub const PREFIX: &str = "[KO] ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target_language: String,
    pub input: String,
}

/// Prefixes every sentence with [`PREFIX`] after a pseudo-random delay, so
/// concurrent calls settle out of order.
pub struct FakeProvider {
    seed: AtomicU64,
    max_delay_ms: u64,
    groups: bool,
    fail_on: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed: AtomicU64::new(seed),
            max_delay_ms: 500,
            groups: true,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reports no markup support, which selects one text call per sentence.
    pub fn text_only(mut self) -> Self {
        self.groups = false;
        self
    }

    /// Fails every call whose input contains `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, input: &str, target_language: &str) {
        self.calls.lock().unwrap().push(Call {
            target_language: target_language.to_string(),
            input: input.to_string(),
        });
    }

    fn next_delay(&self) -> Duration {
        let state = self
            .seed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some(s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
            })
            .unwrap();
        Duration::from_millis(10 + (state >> 33) % self.max_delay_ms)
    }

    fn should_fail(&self, input: &str) -> bool {
        self.fail_on.as_deref().is_some_and(|needle| input.contains(needle))
    }
}

impl TranslationProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn translate_text<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        self.record(text, target_language);
        let delay = self.next_delay();
        let fail = self.should_fail(text);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            if fail {
                return Err(Error::Api {
                    provider: "fake",
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(format!("{PREFIX}{}", text.trim()))
        })
    }

    fn translate_html<'a>(
        &'a self,
        markup: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        self.record(markup, target_language);
        let delay = self.next_delay();
        let fail = self.should_fail(markup);
        let reply = translate_markup(markup);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            if fail {
                return Err(Error::Api {
                    provider: "fake",
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(reply)
        })
    }

    fn supports_sentence_groups(&self) -> bool {
        self.groups
    }
}

/// Replies to every markup call with the same canned reply.
pub struct ScriptedProvider {
    reply: String,
}

impl ScriptedProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

impl TranslationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn translate_text<'a>(
        &'a self,
        _text: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async { Err(Error::EmptyResponse("scripted")) })
    }

    fn translate_html<'a>(
        &'a self,
        _markup: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

/// Never answers.
pub struct HangingProvider {
    pub groups: bool,
}

impl TranslationProvider for HangingProvider {
    fn name(&self) -> &'static str {
        "hanging"
    }

    fn translate_text<'a>(
        &'a self,
        _text: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(std::future::pending())
    }

    fn translate_html<'a>(
        &'a self,
        _markup: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(std::future::pending())
    }

    fn supports_sentence_groups(&self) -> bool {
        self.groups
    }
}

/// Answers a batch the way a well-behaved model does: the whole sentence in
/// the group's first cue element.
fn translate_markup(markup: &str) -> String {
    let doc = Document::parse(markup).unwrap();
    let group_sel: Selector = format!("[{SENTENCE_GROUP_ATTR}]").parse().unwrap();
    let cue_sel: Selector = format!("[{CUE_INDEX_ATTR}]").parse().unwrap();

    let groups: Vec<GroupMarkup> = doc
        .query_selector_all(doc.root(), &group_sel)
        .into_iter()
        .map(|group| {
            let sentence = doc
                .query_selector_all(group, &cue_sel)
                .into_iter()
                .map(|cue| doc.text_content(cue).trim().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            GroupMarkup {
                index: doc
                    .attribute(group, SENTENCE_GROUP_ATTR)
                    .unwrap()
                    .parse()
                    .unwrap(),
                fragments: vec![format!("{PREFIX}{sentence}")],
            }
        })
        .collect();

    build_batch_markup(&groups).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Lifecycle(SessionLifecycleEvent),
    Progress(SessionProgressEvent),
    Data(SessionDataEvent),
}

#[derive(Default)]
pub struct RecordingRuntime {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingRuntime {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn lifecycle(&self) -> Vec<SessionLifecycleEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Lifecycle(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl SessionRuntime for RecordingRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        self.events.lock().unwrap().push(Recorded::Lifecycle(event));
    }

    fn emit_progress(&self, event: SessionProgressEvent) {
        self.events.lock().unwrap().push(Recorded::Progress(event));
    }

    fn emit_data(&self, event: SessionDataEvent) {
        self.events.lock().unwrap().push(Recorded::Data(event));
    }
}

/// A lecture page with the transcript collapsed and the first cue active.
pub fn lecture_page(sentences: &[&str]) -> SharedDocument {
    let cues: String = sentences
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let current = if i == 0 { r#" aria-current="true""# } else { "" };
            format!(
                r#"<p data-purpose="transcript-cue"{current}><span data-purpose="cue-text">{text}</span></p>"#
            )
        })
        .collect();

    let first = sentences.first().copied().unwrap_or_default();
    let markup = format!(
        r#"<body>
          <div data-purpose="video-controls">
            <div class="slot"><button data-purpose="transcript-toggle" aria-expanded="false">Transcript</button></div>
          </div>
          <div data-purpose="captions-cue-text">{first}</div>
          <div data-purpose="transcript-panel">{cues}</div>
        </body>"#
    );
    Rc::new(RefCell::new(Document::parse(&markup).unwrap()))
}

pub fn select(doc: &Document, selector: &str) -> Vec<cue_host_dom::NodeId> {
    doc.query_selector_all(doc.root(), &selector.parse().unwrap())
}

/// Text of the injected translation under each cue, `None` for untouched cues.
pub fn cue_translations(doc: &Document) -> Vec<Option<String>> {
    select(doc, r#"[data-purpose="cue-text"]"#)
        .into_iter()
        .map(|text_node| {
            doc.query_selector(text_node, &".cuebridge-translation".parse().unwrap())
                .map(|n| doc.text_content(n))
        })
        .collect()
}

/// Moves the host's highlight to cue `index` and writes its text into the
/// overlay, as the player does on playback.
pub fn advance_to(doc: &mut Document, index: usize) {
    let cues = select(doc, r#"[data-purpose="transcript-cue"]"#);
    for cue in &cues {
        doc.remove_attribute(*cue, "aria-current").unwrap();
    }
    doc.set_attribute(cues[index], "aria-current", "true").unwrap();

    let text_node = select(doc, r#"[data-purpose="cue-text"]"#)[index];
    let original = doc
        .attribute(text_node, "data-original-text")
        .map(str::to_string)
        .unwrap_or_else(|| doc.text_content(text_node));
    let overlay = select(doc, r#"[data-purpose="captions-cue-text"]"#)[0];
    doc.set_text_content(overlay, &original).unwrap();
}
