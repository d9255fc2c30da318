//! Tracks the host's active transcript cue and its caption overlay.
//!
//! Observer records are pulled with [`SyncEngine::pump`]; the work they imply
//! is coalesced through a [`FrameScheduler`] and performed by
//! [`SyncEngine::run_frame`]. Writes to the overlay go through
//! [`SyncEngine::with_caption_write`], which suspends the caption observer and
//! drops the records produced by the write, so a write can never schedule
//! another write.

use cue_host_dom::{Document, NodeId, ObserveOptions, ObserverId};

use crate::constants::{TRANSCRIPT_ATTRIBUTE_FILTER, attr, class};
use crate::detect::DETECTORS;
use crate::render::clean_text;
use crate::scheduler::{FrameScheduler, FrameTask};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Observing,
    /// The engine itself is writing the caption overlay.
    Suspended,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    ActiveCueChanged { active: String, original: String },
    /// The host replaced the overlay while a translation was on screen.
    CaptionRestoreNeeded,
}

#[derive(Debug, Clone, Copy)]
struct Observed {
    node: NodeId,
    observer: ObserverId,
}

#[derive(Debug)]
pub struct SyncEngine {
    state: SyncState,
    transcript: Option<Observed>,
    caption: Option<Observed>,
    scheduler: FrameScheduler,
    last_active: Option<String>,
    host_caption_text: String,
    translation_displayed: bool,
    guarded_writes: u64,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            transcript: None,
            caption: None,
            scheduler: FrameScheduler::default(),
            last_active: None,
            host_caption_text: String::new(),
            translation_displayed: false,
            guarded_writes: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn transcript_panel(&self) -> Option<NodeId> {
        self.transcript.map(|o| o.node)
    }

    pub fn caption_overlay(&self) -> Option<NodeId> {
        self.caption.map(|o| o.node)
    }

    /// The overlay text most recently written by the host.
    pub fn host_caption_text(&self) -> &str {
        &self.host_caption_text
    }

    pub fn last_active(&self) -> Option<&str> {
        self.last_active.as_deref()
    }

    /// Number of overlay writes made through [`Self::with_caption_write`].
    pub fn guarded_writes(&self) -> u64 {
        self.guarded_writes
    }

    pub fn set_translation_displayed(&mut self, displayed: bool) {
        self.translation_displayed = displayed;
    }

    /// Forgets the last emitted active text so the next recomputation emits
    /// again, e.g. after cues were re-annotated.
    pub fn reset_active(&mut self) {
        self.last_active = None;
    }

    /// Starts watching `panel`, replacing any previous transcript observer, and
    /// returns the result of the initial active-cue check.
    pub fn observe_transcript(&mut self, doc: &mut Document, panel: NodeId) -> Vec<SyncEvent> {
        if let Some(previous) = self.transcript.take() {
            doc.disconnect(previous.observer);
        }
        let observer = doc.observe(
            panel,
            ObserveOptions {
                child_list: true,
                subtree: true,
                attributes: true,
                attribute_filter: Some(
                    TRANSCRIPT_ATTRIBUTE_FILTER
                        .iter()
                        .map(|a| a.to_string())
                        .collect(),
                ),
                character_data: false,
            },
        );
        self.transcript = Some(Observed {
            node: panel,
            observer,
        });
        self.scheduler.clear();
        self.enter_observing();
        tracing::debug!("transcript_observer_attached");

        self.recompute(doc).into_iter().collect()
    }

    pub fn observe_caption(&mut self, doc: &mut Document, overlay: NodeId) {
        if let Some(previous) = self.caption.take() {
            doc.disconnect(previous.observer);
        }
        let observer = doc.observe(
            overlay,
            ObserveOptions {
                child_list: true,
                subtree: true,
                character_data: true,
                ..Default::default()
            },
        );
        self.caption = Some(Observed {
            node: overlay,
            observer,
        });
        self.translation_displayed = false;
        let text = clean_text(doc, overlay);
        if !text.is_empty() {
            self.host_caption_text = text;
        }
        self.enter_observing();
        tracing::debug!("caption_observer_attached");
    }

    /// Drains observer queues and schedules the implied frame work.
    pub fn pump(&mut self, doc: &mut Document) {
        if self.state == SyncState::Disconnected {
            return;
        }

        if let Some(transcript) = self.transcript {
            if !doc.take_records(transcript.observer).is_empty() {
                self.scheduler.schedule(FrameTask::RecomputeActiveCue);
            }
        }

        self.pump_caption(doc);
    }

    fn pump_caption(&mut self, doc: &mut Document) {
        let Some(caption) = self.caption else {
            return;
        };
        if doc.take_records(caption.observer).is_empty() || self.state == SyncState::Suspended {
            return;
        }

        let text = clean_text(doc, caption.node);
        if text.is_empty() {
            return;
        }
        self.host_caption_text = text;
        if self.translation_displayed {
            self.scheduler.schedule(FrameTask::RestoreCaption);
        }
    }

    /// Runs the work scheduled for this frame.
    pub fn run_frame(&mut self, doc: &Document) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for task in self.scheduler.take_due() {
            match task {
                FrameTask::RecomputeActiveCue => events.extend(self.recompute(doc)),
                FrameTask::RestoreCaption => events.push(SyncEvent::CaptionRestoreNeeded),
            }
        }
        events
    }

    fn recompute(&mut self, doc: &Document) -> Option<SyncEvent> {
        let panel = self.transcript?.node;
        if !doc.is_connected(panel) {
            return None;
        }
        let (active, original) = active_cue_data(doc, panel)?;
        if active.is_empty() || self.last_active.as_deref() == Some(active.as_str()) {
            return None;
        }
        self.last_active = Some(active.clone());
        Some(SyncEvent::ActiveCueChanged { active, original })
    }

    /// Performs an overlay write with the caption observer suspended. Host
    /// records queued before the write are processed first; records caused by
    /// the write are discarded.
    pub fn with_caption_write<T>(
        &mut self,
        doc: &mut Document,
        write: impl FnOnce(&mut Document) -> Result<T>,
    ) -> Result<T> {
        self.pump_caption(doc);

        let previous = self.state;
        self.state = SyncState::Suspended;
        let result = write(doc);
        if let Some(caption) = self.caption {
            doc.take_records(caption.observer);
        }
        self.state = previous;
        self.guarded_writes += 1;
        result
    }

    /// Disconnects both observers. Safe to call repeatedly or before anything
    /// was observed.
    pub fn disconnect(&mut self, doc: &mut Document) {
        for observed in [self.transcript.take(), self.caption.take()]
            .into_iter()
            .flatten()
        {
            doc.disconnect(observed.observer);
        }
        self.scheduler.clear();
        self.last_active = None;
        self.translation_displayed = false;
        if self.state != SyncState::Idle {
            self.state = SyncState::Disconnected;
            tracing::debug!("sync_engine_disconnected");
        }
    }

    fn enter_observing(&mut self) {
        if self.state != SyncState::Suspended {
            self.state = SyncState::Observing;
        }
    }
}

/// Active text (the injected translation when present, else the cue text) and
/// its original for the host's currently highlighted cue.
pub fn active_cue_data(doc: &Document, panel: NodeId) -> Option<(String, String)> {
    let active = DETECTORS
        .active_cue
        .find(doc, panel)
        .or_else(|| DETECTORS.active_cue_text.find(doc, panel))?;

    let text_node = if DETECTORS.cue_text.matches(doc, active) {
        active
    } else {
        DETECTORS.cue_text.find(doc, active)?
    };

    let translation = doc
        .descendants(text_node)
        .into_iter()
        .find(|n| doc.has_class(*n, class::CUE_TRANSLATION));
    let active_text = doc
        .text_content(translation.unwrap_or(text_node))
        .trim()
        .to_string();

    let original = match doc.attribute(text_node, attr::DATA_ORIGINAL_TEXT) {
        Some(original) if !original.is_empty() => original.to_string(),
        _ => active_text.clone(),
    };

    Some((active_text, original))
}
