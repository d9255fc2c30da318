//! Drives a [`CaptionController`] on a single-threaded runtime: waits for the
//! host page, runs the frame loop, follows settings changes and keeps one bulk
//! translation pass in flight at a time.

use std::sync::Arc;

use cue_host_dom::NodeId;
use futures_util::future::LocalBoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::constants::{FRAME_INTERVAL, WAIT_FOR_ELEMENT_TIMEOUT};
use crate::{
    CaptionController, ConfigChange, ControllerEvent, Error, ProgressUpdate, Result,
    SessionDataEvent, SessionLifecycleEvent, SessionProgressEvent, SessionRuntime,
    TranslationConfig, TranslationReport,
};

type TranslationJob = LocalBoxFuture<'static, TranslationReport>;

enum Exit {
    Cancelled,
    Stopped,
    Restart,
}

pub struct Session {
    controller: CaptionController,
    runtime: Arc<dyn SessionRuntime>,
    config_rx: watch::Receiver<TranslationConfig>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(
        controller: CaptionController,
        runtime: Arc<dyn SessionRuntime>,
        config_rx: watch::Receiver<TranslationConfig>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            controller,
            runtime,
            config_rx,
            cancel,
        }
    }

    /// Runs until cancelled. Fails only when the host page never shows the
    /// transcript panel or the caption overlay.
    pub async fn run(mut self) -> Result<()> {
        let mut should_start = self.controller.init()?;
        self.config_rx.borrow_and_update();

        // Set while the last lifecycle event sent was `Stopped`.
        let mut stopped = false;
        loop {
            if !should_start && !self.wait_for_enable().await? {
                break;
            }
            stopped = false;
            match self.run_pipeline().await? {
                Exit::Cancelled => break,
                Exit::Stopped => {
                    self.runtime.emit_lifecycle(SessionLifecycleEvent::Stopped);
                    stopped = true;
                    should_start = false;
                }
                Exit::Restart => {
                    self.runtime.emit_lifecycle(SessionLifecycleEvent::Restarted);
                    should_start = true;
                }
            }
        }

        self.controller.destroy()?;
        if !stopped {
            self.runtime.emit_lifecycle(SessionLifecycleEvent::Stopped);
        }
        Ok(())
    }

    /// Returns `false` when the session should end instead.
    async fn wait_for_enable(&mut self) -> Result<bool> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(false),
                changed = self.config_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("settings_channel_closed");
                        return Ok(false);
                    }
                    let next = self.config_rx.borrow_and_update().clone();
                    if self.controller.apply_config(next)? == ConfigChange::Start {
                        return Ok(true);
                    }
                }
            }
        }
    }

    async fn run_pipeline(&mut self) -> Result<Exit> {
        self.controller.begin_start(Instant::now());
        self.runtime.emit_lifecycle(SessionLifecycleEvent::Started {
            engine: self.controller.config().translation_engine.to_string(),
        });
        self.controller.ensure_transcript_open();

        let Some(panel) = self.wait_for_panel().await? else {
            return Ok(Exit::Cancelled);
        };
        for event in self.controller.attach_panel(panel)? {
            self.emit(event);
        }

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let mut job = self.controller.translation_job(panel, progress_tx.clone());
        let mut overlay_deadline = Some(Instant::now() + WAIT_FOR_ELEMENT_TIMEOUT);
        let mut config_open = true;

        let mut frames = interval(FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.drop_job(&mut job, &mut progress_rx)?;
                    return Ok(Exit::Cancelled);
                }
                Some(update) = progress_rx.recv() => {
                    self.controller.on_progress(update)?;
                    let (completed, total) = match update {
                        ProgressUpdate::Started { total } => (0, total),
                        ProgressUpdate::Advanced { completed, total } => (completed, total),
                    };
                    self.runtime.emit_progress(SessionProgressEvent::TranslationProgress {
                        completed,
                        total,
                    });
                }
                report = run_job(&mut job), if job.is_some() => {
                    job = None;
                    self.controller.finish_translation(&report, Instant::now())?;
                    self.runtime
                        .emit_progress(SessionProgressEvent::TranslationFinished { report });
                }
                changed = self.config_rx.changed(), if config_open => {
                    if changed.is_err() {
                        tracing::debug!("settings_channel_closed");
                        config_open = false;
                        continue;
                    }
                    let next = self.config_rx.borrow_and_update().clone();
                    match self.controller.apply_config(next)? {
                        ConfigChange::Stop => {
                            self.drop_job(&mut job, &mut progress_rx)?;
                            return Ok(Exit::Stopped);
                        }
                        ConfigChange::Restart => {
                            self.drop_job(&mut job, &mut progress_rx)?;
                            return Ok(Exit::Restart);
                        }
                        ConfigChange::None | ConfigChange::Start | ConfigChange::Restyle => {}
                    }
                }
                _ = frames.tick() => {
                    let now = Instant::now();
                    if let Some(deadline) = overlay_deadline {
                        if let Some(overlay) = self.controller.find_caption_overlay() {
                            overlay_deadline = None;
                            for event in self.controller.attach_caption(overlay)? {
                                self.emit(event);
                            }
                        } else if now >= deadline {
                            self.drop_job(&mut job, &mut progress_rx)?;
                            return Err(self.fail("caption_overlay"));
                        }
                    }

                    for event in self.controller.frame(now)? {
                        if let ControllerEvent::PanelAttached(panel) = event {
                            if job.is_none() {
                                job = self.controller.translation_job(panel, progress_tx.clone());
                            }
                        }
                        self.emit(event);
                    }
                }
            }
        }
    }

    async fn wait_for_panel(&mut self) -> Result<Option<NodeId>> {
        let deadline = Instant::now() + WAIT_FOR_ELEMENT_TIMEOUT;
        let mut poll = interval(FRAME_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(None),
                _ = poll.tick() => {
                    if let Some(panel) = self.controller.find_transcript_panel() {
                        return Ok(Some(panel));
                    }
                    if Instant::now() >= deadline {
                        return Err(self.fail("transcript_panel"));
                    }
                }
            }
        }
    }

    /// Drops an in-flight pass. The dropped future makes no further writes;
    /// progress it already queued is discarded.
    fn drop_job(
        &mut self,
        job: &mut Option<TranslationJob>,
        progress_rx: &mut mpsc::UnboundedReceiver<ProgressUpdate>,
    ) -> Result<()> {
        if job.take().is_some() {
            while progress_rx.try_recv().is_ok() {}
            self.controller.cancel_translation()?;
        }
        Ok(())
    }

    fn fail(&mut self, detector: &'static str) -> Error {
        let error = self
            .controller
            .startup_failed(detector, WAIT_FOR_ELEMENT_TIMEOUT);
        self.runtime
            .emit_lifecycle(SessionLifecycleEvent::StartupFailed {
                error: error.to_string(),
            });
        error
    }

    fn emit(&self, event: ControllerEvent) {
        match event {
            ControllerEvent::ActiveCue {
                translated,
                original,
            } => self.runtime.emit_data(SessionDataEvent::ActiveCue {
                translated,
                original,
            }),
            ControllerEvent::SettingsChanged(config) => self
                .runtime
                .emit_data(SessionDataEvent::SettingsChanged { config }),
            ControllerEvent::PanelAttached(_) => self
                .runtime
                .emit_progress(SessionProgressEvent::PanelAttached),
            ControllerEvent::CaptionAttached(_) => self
                .runtime
                .emit_progress(SessionProgressEvent::CaptionAttached),
        }
    }
}

async fn run_job(job: &mut Option<TranslationJob>) -> TranslationReport {
    match job.as_mut() {
        Some(job) => job.await,
        None => std::future::pending().await,
    }
}
