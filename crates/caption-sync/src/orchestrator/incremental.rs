use cue_translate_interface::TEXT_CALL_TIMEOUT;
use futures_util::stream::{FuturesUnordered, StreamExt};

use super::{Orchestrator, PlannedGroup, ProgressSink, ProgressUpdate, TranslationReport};
use crate::Error;

impl Orchestrator {
    /// Sends each leader sentence as its own text call and annotates it as soon
    /// as it resolves.
    pub(super) async fn run_incremental(
        &self,
        leaders: Vec<PlannedGroup>,
        followers: &[PlannedGroup],
        progress: &impl ProgressSink,
        report: &mut TranslationReport,
    ) {
        let total = leaders.len();
        if total == 0 {
            return;
        }
        progress.report(ProgressUpdate::Started { total });
        report.units += total;

        let mut in_flight: FuturesUnordered<_> = leaders
            .into_iter()
            .map(|group| {
                let provider = self.provider.clone();
                let target_language = self.target_language.clone();
                async move {
                    let reply = match tokio::time::timeout(
                        TEXT_CALL_TIMEOUT,
                        provider.translate_text(&group.text, &target_language),
                    )
                    .await
                    {
                        Ok(Ok(text)) if text.trim().is_empty() => Err(Error::from(
                            cue_translate_interface::Error::EmptyResponse(provider.name()),
                        )),
                        Ok(reply) => reply.map(|t| t.trim().to_string()).map_err(Error::from),
                        Err(_) => Err(Error::from(cue_translate_interface::Error::Timeout(
                            TEXT_CALL_TIMEOUT,
                        ))),
                    };
                    (group, reply)
                }
            })
            .collect();

        let mut completed = 0;
        while let Some((group, reply)) = in_flight.next().await {
            match reply {
                Ok(translation) => self.resolve(&group, &translation, followers, report),
                Err(error) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        group = %group.text,
                        error = %error,
                        "sentence_translation_failed"
                    );
                    self.abandon(&group, followers, report);
                }
            }

            completed += 1;
            progress.report(ProgressUpdate::Advanced { completed, total });
        }
    }
}
