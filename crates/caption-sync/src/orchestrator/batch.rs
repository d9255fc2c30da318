use cue_translate_interface::MARKUP_CALL_TIMEOUT;
use futures_util::future::LocalBoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};

use super::{Orchestrator, PlannedGroup, ProgressSink, ProgressUpdate, TranslationReport};
use crate::markup::{GroupMarkup, build_batch_markup, parse_batch_reply};
use crate::Error;

impl Orchestrator {
    /// Sends `leaders` as markup batches, all in flight at once, and applies
    /// each reply as it arrives.
    pub(super) async fn run_batched(
        &self,
        leaders: Vec<PlannedGroup>,
        followers: &[PlannedGroup],
        progress: &impl ProgressSink,
        report: &mut TranslationReport,
    ) {
        let mut indexed: Vec<(usize, PlannedGroup)> = leaders.into_iter().enumerate().collect();
        let mut batches = Vec::new();
        while !indexed.is_empty() {
            let rest = indexed.split_off(self.batch_size.min(indexed.len()));
            batches.push(std::mem::replace(&mut indexed, rest));
        }

        let total = batches.len();
        if total == 0 {
            return;
        }
        progress.report(ProgressUpdate::Started { total });

        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Settled>> = FuturesUnordered::new();
        for (batch_index, batch) in batches.into_iter().enumerate() {
            let groups: Vec<GroupMarkup> = batch
                .iter()
                .map(|(index, group)| GroupMarkup {
                    index: *index,
                    fragments: self.fragments(group),
                })
                .collect();

            let markup = match build_batch_markup(&groups) {
                Ok(markup) => markup,
                Err(error) => {
                    in_flight.push(Box::pin(std::future::ready((batch_index, batch, Err(error)))));
                    continue;
                }
            };

            report.units += 1;
            let provider = self.provider.clone();
            let target_language = self.target_language.clone();
            in_flight.push(Box::pin(async move {
                let reply = match tokio::time::timeout(
                    MARKUP_CALL_TIMEOUT,
                    provider.translate_html(&markup, &target_language),
                )
                .await
                {
                    Ok(reply) => reply.map_err(Error::from),
                    Err(_) => Err(Error::from(cue_translate_interface::Error::Timeout(
                        MARKUP_CALL_TIMEOUT,
                    ))),
                };
                (batch_index, batch, reply)
            }));
        }

        let mut completed = 0;
        while let Some((batch_index, batch, reply)) = in_flight.next().await {
            match reply.and_then(|reply| parse_batch_reply(&reply)) {
                Ok(translations) => {
                    for (index, group) in &batch {
                        match translations.get(index) {
                            Some(translation) => self.resolve(group, translation, followers, report),
                            None => {
                                tracing::debug!(group = index, "group_missing_from_reply");
                                self.abandon(group, followers, report);
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        batch = batch_index,
                        error = %error,
                        "batch_translation_failed"
                    );
                    for (_, group) in &batch {
                        self.abandon(group, followers, report);
                    }
                }
            }

            completed += 1;
            progress.report(ProgressUpdate::Advanced { completed, total });
        }
    }

    /// Display text of each cue in the group, read from the preserved original.
    fn fragments(&self, group: &PlannedGroup) -> Vec<String> {
        let doc = self.doc.borrow();
        group
            .cues
            .iter()
            .map(|c| crate::cue::source_text(&doc, c))
            .collect()
    }
}

type Settled = (usize, Vec<(usize, PlannedGroup)>, Result<String, Error>);
