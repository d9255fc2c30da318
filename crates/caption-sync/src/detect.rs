//! Host page structure, expressed as data.
//!
//! Each [`Detector`] is an ordered list of alternative selectors. The first
//! strategy that matches anything wins, so more specific selectors come first.

use std::sync::LazyLock;

use cue_host_dom::{Document, NodeId, Selector};

use crate::constants::class;

#[derive(Debug, Clone)]
pub struct Detector {
    pub name: &'static str,
    pub strategies: Vec<Selector>,
}

impl Detector {
    pub fn new(name: &'static str, sources: &[&str]) -> Self {
        let strategies = sources
            .iter()
            .filter_map(|source| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(error) => {
                    tracing::error!(detector = name, error = %error, "invalid_detector_selector");
                    None
                }
            })
            .collect();
        Self { name, strategies }
    }

    /// First descendant of `scope` matched by the highest-priority strategy
    /// that matches anything.
    pub fn find(&self, doc: &Document, scope: NodeId) -> Option<NodeId> {
        self.strategies
            .iter()
            .find_map(|selector| doc.query_selector(scope, selector))
    }

    /// Every descendant of `scope` matched by any strategy, in document order.
    pub fn find_all(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        doc.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(doc, *node))
            .collect()
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.strategies.iter().any(|s| doc.matches(node, s))
    }

    pub fn closest(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.ancestors(node)
            .into_iter()
            .find(|a| self.matches(doc, *a))
    }
}

#[derive(Debug)]
pub struct Detectors {
    pub transcript_panel: Detector,
    pub transcript_toggle: Detector,
    pub cue: Detector,
    pub cue_text: Detector,
    pub active_cue: Detector,
    pub active_cue_text: Detector,
    pub caption_overlay: Detector,
    pub video_controls: Detector,
    /// Everything this crate injects into host nodes.
    pub injected: Detector,
}

pub static DETECTORS: LazyLock<Detectors> = LazyLock::new(|| {
    let injected = [
        class::CAPTION_TRANSLATED,
        class::CAPTION_ORIGINAL,
        class::CUE_TRANSLATION,
        class::CUE_ORIGINAL,
    ]
    .map(|c| format!(".{c}"))
    .join(", ");
    build_detectors(&injected)
});

fn build_detectors(injected: &str) -> Detectors {
    Detectors {
        transcript_panel: Detector::new(
            "transcript_panel",
            &[r#"[data-purpose="transcript-panel"]"#],
        ),
        transcript_toggle: Detector::new(
            "transcript_toggle",
            &[
                r#"[data-purpose="transcript-toggle"]"#,
                r#"button[aria-label*="Transcript"]"#,
                r#"button[aria-label*="대본"]"#,
                r#"button[aria-controls*="transcript"]"#,
            ],
        ),
        cue: Detector::new("cue", &[r#"[data-purpose="transcript-cue"]"#]),
        cue_text: Detector::new("cue_text", &[r#"[data-purpose="cue-text"]"#]),
        active_cue: Detector::new(
            "active_cue",
            &[
                r#"[data-purpose="transcript-cue-active"]"#,
                r#"[data-purpose="transcript-cue"][aria-current="true"]"#,
                r#"[data-purpose="transcript-cue"].is-active"#,
                r#"[data-purpose="transcript-cue"][class*="highlight"]"#,
                r#"[data-purpose="transcript-cue"][class*="active"]"#,
                r#"[data-purpose="transcript-cue"][class*="underline-cue"]"#,
                r#"[class*="transcript-cue"][class*="highlight"]"#,
                r#"[class*="transcript-cue"][class*="active"]"#,
                r#"[class*="transcript"][class*="underline-cue"]"#,
            ],
        ),
        active_cue_text: Detector::new(
            "active_cue_text",
            &[
                r#"[data-purpose="cue-text"][data-highlighted="true"]"#,
                r#"[data-purpose="cue-text"][class*="highlight-cue"]"#,
                r#"[data-purpose="cue-text"][class*="highlight"]"#,
                r#"[data-purpose="cue-text"][class*="active"]"#,
            ],
        ),
        caption_overlay: Detector::new(
            "caption_overlay",
            &[r#"[data-purpose="captions-cue-text"]"#],
        ),
        video_controls: Detector::new("video_controls", &[r#"[data-purpose="video-controls"]"#]),
        injected: Detector::new("injected", &[injected]),
    }
}

/// The injected-node selector as a single [`Selector`], for text extraction.
pub fn injected_selector() -> Option<&'static Selector> {
    DETECTORS.injected.strategies.first()
}
