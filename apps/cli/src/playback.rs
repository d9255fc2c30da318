//! Plays the part of the host player: walks the transcript highlight from cue
//! to cue and writes each cue into the caption overlay.

use std::time::Duration;

use cue_caption_sync::SharedDocument;
use cue_host_dom::{Document, NodeId, Selector};
use tokio_util::sync::CancellationToken;

const CUE: &str = r#"[data-purpose="transcript-cue"]"#;
const CUE_TEXT: &str = r#"[data-purpose="cue-text"]"#;
const OVERLAY: &str = r#"[data-purpose="captions-cue-text"]"#;
const ORIGINAL_TEXT: &str = "data-original-text";
const TRANSLATION: &str = ".cuebridge-translation";

pub struct Player {
    doc: SharedDocument,
    interval: Duration,
    cue: Selector,
    cue_text: Selector,
    overlay: Selector,
    translation: Selector,
}

impl Player {
    pub fn new(doc: SharedDocument, interval: Duration) -> cue_host_dom::Result<Self> {
        Ok(Self {
            doc,
            interval,
            cue: CUE.parse()?,
            cue_text: CUE_TEXT.parse()?,
            overlay: OVERLAY.parse()?,
            translation: TRANSLATION.parse()?,
        })
    }

    /// Plays every cue once, `interval` apart. Returns the number of cues
    /// played before the end or cancellation.
    pub async fn play(&self, cancel: &CancellationToken) -> cue_host_dom::Result<usize> {
        let total = {
            let doc = self.doc.borrow();
            doc.query_selector_all(doc.root(), &self.cue).len()
        };

        let mut ticker = tokio::time::interval(self.interval);
        for index in 0..total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(index),
                _ = ticker.tick() => {}
            }
            self.highlight(index)?;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = ticker.tick() => {}
        }
        Ok(total)
    }

    fn highlight(&self, index: usize) -> cue_host_dom::Result<()> {
        let mut doc = self.doc.borrow_mut();
        let cues = doc.query_selector_all(doc.root(), &self.cue);
        let Some(&current) = cues.get(index) else {
            return Ok(());
        };

        for &cue in &cues {
            if cue != current {
                doc.remove_attribute(cue, "aria-current")?;
            }
        }
        doc.set_attribute(current, "aria-current", "true")?;
        tracing::debug!(cue = index, "host_cue_highlighted");

        let Some(text_node) = doc.query_selector(current, &self.cue_text) else {
            return Ok(());
        };
        let caption = host_text(&doc, text_node);
        if let Some(overlay) = doc.query_selector(doc.root(), &self.overlay) {
            doc.set_text_content(overlay, &caption)?;
        }
        Ok(())
    }

    /// Each cue as `(original, translation)`.
    pub fn transcript(&self) -> Vec<(String, Option<String>)> {
        let doc = self.doc.borrow();
        doc.query_selector_all(doc.root(), &self.cue_text)
            .into_iter()
            .map(|text_node| {
                let translation = doc
                    .query_selector(text_node, &self.translation)
                    .map(|n| doc.text_content(n));
                (host_text(&doc, text_node), translation)
            })
            .collect()
    }
}

/// The text the host itself would show for a cue, ignoring any annotation.
fn host_text(doc: &Document, text_node: NodeId) -> String {
    match doc.attribute(text_node, ORIGINAL_TEXT) {
        Some(original) => original.to_string(),
        None => doc.text_content(text_node).trim().to_string(),
    }
}
