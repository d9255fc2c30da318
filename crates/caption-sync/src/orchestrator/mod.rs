//! Bulk transcript translation.
//!
//! A pass reads every cue, merges them into sentences, serves what it can from
//! the session cache and sends the rest to the provider, either in markup
//! batches or one sentence at a time. Every call may fail on its own; a pass
//! always runs to completion and reports what happened.

mod batch;
mod incremental;

use std::collections::HashSet;
use std::sync::Arc;

use cue_host_dom::NodeId;
use cue_sentence::group_by_sentence;
use cue_translate_interface::TranslationProvider;
use tokio::sync::mpsc;

use crate::constants::TRANSLATION_BATCH_SIZE;
use crate::cue::{self, Cue};
use crate::{SharedCache, SharedDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TranslationStrategy {
    /// Sentence groups sent together as markup, `batch_size` per call.
    Batched,
    /// One text call per sentence, applied as each one resolves.
    Incremental,
}

impl TranslationStrategy {
    pub fn for_provider(provider: &dyn TranslationProvider) -> Self {
        if provider.supports_sentence_groups() {
            Self::Batched
        } else {
            Self::Incremental
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// `total` calls are about to be dispatched.
    Started { total: usize },
    Advanced { completed: usize, total: usize },
}

pub trait ProgressSink {
    fn report(&self, update: ProgressUpdate);
}

impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

impl ProgressSink for () {
    fn report(&self, _update: ProgressUpdate) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TranslationReport {
    /// Sentence groups found in the transcript.
    pub groups: usize,
    /// Groups served from the cache without a call.
    pub cached: usize,
    /// Groups annotated from a provider reply, including in-pass duplicates.
    pub translated: usize,
    /// Groups left untouched by a failed call or a malformed reply.
    pub failed: usize,
    /// Provider calls issued.
    pub units: usize,
}

/// One sentence group of the current pass.
#[derive(Debug, Clone)]
pub(crate) struct PlannedGroup {
    pub(crate) text: String,
    pub(crate) cues: Vec<Cue>,
}

#[derive(Debug, Default)]
pub(crate) struct Plan {
    /// Groups this pass has to translate, each with a distinct text.
    pub(crate) leaders: Vec<PlannedGroup>,
    /// Groups repeating a leader's text; they take the leader's translation.
    pub(crate) followers: Vec<PlannedGroup>,
}

pub struct Orchestrator {
    doc: SharedDocument,
    cache: SharedCache,
    provider: Arc<dyn TranslationProvider>,
    target_language: String,
    show_original: bool,
    batch_size: usize,
    strategy: TranslationStrategy,
}

impl Orchestrator {
    pub fn new(
        doc: SharedDocument,
        cache: SharedCache,
        provider: Arc<dyn TranslationProvider>,
        target_language: impl Into<String>,
    ) -> Self {
        let strategy = TranslationStrategy::for_provider(provider.as_ref());
        Self {
            doc,
            cache,
            provider,
            target_language: target_language.into(),
            show_original: true,
            batch_size: TRANSLATION_BATCH_SIZE,
            strategy,
        }
    }

    pub fn with_show_original(mut self, show_original: bool) -> Self {
        self.show_original = show_original;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_strategy(mut self, strategy: TranslationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> TranslationStrategy {
        self.strategy
    }

    /// Translates every cue of `panel` in place. Never fails; failures are
    /// logged and counted in the report.
    pub async fn translate_transcript(
        &self,
        panel: NodeId,
        progress: &impl ProgressSink,
    ) -> TranslationReport {
        if self.provider.is_passthrough() {
            tracing::debug!(provider = self.provider.name(), "transcript_translation_skipped");
            return TranslationReport::default();
        }

        let mut report = TranslationReport::default();
        let plan = self.plan(panel, &mut report);
        if report.groups == 0 {
            return report;
        }

        tracing::info!(
            provider = self.provider.name(),
            strategy = %self.strategy,
            groups = report.groups,
            cached = report.cached,
            pending = plan.leaders.len(),
            "transcript_translation_started"
        );

        let in_pass: HashSet<String> = plan.leaders.iter().map(|l| l.text.clone()).collect();
        let followers = plan.followers;
        match self.strategy {
            TranslationStrategy::Batched => {
                self.run_batched(plan.leaders, &followers, progress, &mut report)
                    .await
            }
            TranslationStrategy::Incremental => {
                self.run_incremental(plan.leaders, &followers, progress, &mut report)
                    .await
            }
        }

        // Duplicates of a sentence claimed outside this pass.
        for follower in followers.iter().filter(|f| !in_pass.contains(&f.text)) {
            if self.apply_cached(follower) {
                report.translated += 1;
            } else {
                report.failed += 1;
            }
        }

        tracing::info!(
            provider = self.provider.name(),
            translated = report.translated,
            failed = report.failed,
            units = report.units,
            "transcript_translation_finished"
        );
        report
    }

    fn plan(&self, panel: NodeId, report: &mut TranslationReport) -> Plan {
        let doc = self.doc.borrow();
        if !doc.is_connected(panel) {
            return Plan::default();
        }
        let cues = cue::collect_cues(&doc, panel);
        let groups = group_by_sentence(&cues, |c| cue::source_text(&doc, c));
        drop(doc);

        report.groups = groups.len();
        let mut plan = Plan::default();
        for group in groups {
            let planned = PlannedGroup {
                text: group.text,
                cues: group.cues,
            };
            if self.apply_cached(&planned) {
                report.cached += 1;
            } else if self.cache.borrow_mut().begin(&planned.text) {
                plan.leaders.push(planned);
            } else {
                plan.followers.push(planned);
            }
        }

        let mut doc = self.doc.borrow_mut();
        for cue in plan.leaders.iter().flat_map(|g| &g.cues) {
            if doc.is_connected(cue.text_node) {
                if let Err(error) = cue::preserve_original(&mut doc, cue) {
                    tracing::debug!(error = %error, "preserve_original_failed");
                }
            }
        }

        plan
    }

    /// Annotates `group` from the cache. Returns `false` on a cache miss.
    fn apply_cached(&self, group: &PlannedGroup) -> bool {
        let Some(translation) = self.cache.borrow().get(&group.text).map(str::to_string) else {
            return false;
        };
        self.apply(group, &translation);
        true
    }

    fn apply(&self, group: &PlannedGroup, translation: &str) {
        let mut doc = self.doc.borrow_mut();
        for cue in &group.cues {
            if let Err(error) = cue::annotate(&mut doc, cue, translation, self.show_original) {
                tracing::debug!(cue = cue.order, error = %error, "cue_annotation_failed");
            }
        }
    }

    /// Records a resolved leader and annotates it along with its duplicates.
    fn resolve(
        &self,
        leader: &PlannedGroup,
        translation: &str,
        followers: &[PlannedGroup],
        report: &mut TranslationReport,
    ) {
        self.cache.borrow_mut().insert(&leader.text, translation);
        self.apply(leader, translation);
        report.translated += 1;
        for follower in followers.iter().filter(|f| f.text == leader.text) {
            self.apply(follower, translation);
            report.translated += 1;
        }
    }

    fn abandon(
        &self,
        leader: &PlannedGroup,
        followers: &[PlannedGroup],
        report: &mut TranslationReport,
    ) {
        self.cache.borrow_mut().abandon(&leader.text);
        report.failed += 1 + followers.iter().filter(|f| f.text == leader.text).count();
    }
}
