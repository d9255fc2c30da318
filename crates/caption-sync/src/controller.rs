//! Per-session owner of the pipeline: observers, renderer, progress, menu,
//! translation cache and the current settings snapshot.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cue_host_dom::{DomEvent, NodeId};
use cue_translate_interface::TranslationProvider;
use futures_util::future::LocalBoxFuture;
use tokio::time::Instant;

use crate::constants::{MAINTENANCE_INTERVAL, attr};
use crate::cue;
use crate::detect::DETECTORS;
use crate::menu::{MenuHit, SettingsMenu};
use crate::orchestrator::{
    Orchestrator, ProgressSink, ProgressUpdate, TranslationReport, TranslationStrategy,
};
use crate::progress::ProgressIndicator;
use crate::render::{CaptionRenderer, RenderOptions, clean_text, remove_injected};
use crate::sync::{SyncEngine, SyncEvent};
use crate::{
    ConfigChange, Error, Result, SharedCache, SharedDocument, TranslationCache, TranslationConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Disabled,
    Running,
    Destroyed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveCueState {
    pub current_active_text: String,
    pub original_caption_text: String,
}

/// Builds the provider for a settings snapshot.
pub trait ProviderFactory {
    fn create(&self, config: &TranslationConfig) -> Arc<dyn TranslationProvider>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&TranslationConfig) -> Arc<dyn TranslationProvider>,
{
    fn create(&self, config: &TranslationConfig) -> Arc<dyn TranslationProvider> {
        self(config)
    }
}

/// Picks the provider for the configured engine, falling back to passthrough
/// when its key is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn create(&self, config: &TranslationConfig) -> Arc<dyn TranslationProvider> {
        cue_translate::create_provider(config.translation_engine, &config.api_keys())
    }
}

/// Where settings live between sessions.
pub trait SettingsStore {
    fn load(&self) -> Result<TranslationConfig>;
    fn save(&self, config: &TranslationConfig) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    config: RefCell<TranslationConfig>,
}

impl MemoryStore {
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            config: RefCell::new(config),
        }
    }

    pub fn snapshot(&self) -> TranslationConfig {
        self.config.borrow().clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<TranslationConfig> {
        Ok(self.snapshot())
    }

    fn save(&self, config: &TranslationConfig) -> Result<()> {
        *self.config.borrow_mut() = config.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ActiveCue { translated: String, original: String },
    PanelAttached(NodeId),
    CaptionAttached(NodeId),
    /// The in-player menu changed a setting.
    SettingsChanged(TranslationConfig),
}

pub struct CaptionController {
    doc: SharedDocument,
    store: Rc<dyn SettingsStore>,
    provider_factory: Box<dyn ProviderFactory>,
    strategy: Option<TranslationStrategy>,
    state: ControllerState,
    config: TranslationConfig,
    provider: Option<Arc<dyn TranslationProvider>>,
    cache: SharedCache,
    sync: SyncEngine,
    renderer: CaptionRenderer,
    progress: ProgressIndicator,
    menu: Option<SettingsMenu>,
    active: ActiveCueState,
    translating: bool,
    next_maintenance: Option<Instant>,
}

impl CaptionController {
    pub fn new(
        doc: SharedDocument,
        store: Rc<dyn SettingsStore>,
        provider_factory: impl ProviderFactory + 'static,
    ) -> Self {
        let config = TranslationConfig::default();
        Self {
            doc,
            store,
            provider_factory: Box::new(provider_factory),
            strategy: None,
            state: ControllerState::Uninitialized,
            renderer: CaptionRenderer::new(RenderOptions::from(&config)),
            progress: ProgressIndicator::new(config.ui_language.messages()),
            config,
            provider: None,
            cache: TranslationCache::shared(),
            sync: SyncEngine::new(),
            menu: None,
            active: ActiveCueState::default(),
            translating: false,
            next_maintenance: None,
        }
    }

    /// Forces a strategy instead of picking one per provider.
    pub fn with_strategy(mut self, strategy: TranslationStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn active(&self) -> &ActiveCueState {
        &self.active
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    pub fn is_translating(&self) -> bool {
        self.translating
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Loads settings. Returns whether the pipeline should start.
    pub fn init(&mut self) -> Result<bool> {
        if self.state != ControllerState::Uninitialized {
            return Ok(self.state == ControllerState::Running);
        }
        let config = self.store.load()?;
        tracing::info!(
            enabled = config.enabled,
            engine = %config.translation_engine,
            target_language = %config.target_language,
            "settings_loaded"
        );
        self.set_config(config);
        self.state = ControllerState::Disabled;
        Ok(self.config.enabled)
    }

    fn set_config(&mut self, config: TranslationConfig) {
        self.renderer.set_options(RenderOptions::from(&config));
        self.progress.set_messages(config.ui_language.messages());
        self.config = config;
    }

    /// Moves to `Running` and builds the provider for the current snapshot.
    pub fn begin_start(&mut self, now: Instant) {
        if self.state == ControllerState::Destroyed {
            return;
        }
        let provider = self.provider_factory.create(&self.config);
        tracing::info!(provider = provider.name(), "pipeline_starting");
        self.provider = Some(provider);
        self.state = ControllerState::Running;
        self.next_maintenance = Some(now + MAINTENANCE_INTERVAL);
    }

    /// Clicks the transcript toggle when the panel is collapsed. Returns
    /// whether a toggle was found.
    pub fn ensure_transcript_open(&mut self) -> bool {
        let mut doc = self.doc.borrow_mut();
        let Some(toggle) = DETECTORS.transcript_toggle.find(&doc, doc.root()) else {
            tracing::warn!("transcript_toggle_not_found");
            return false;
        };
        if doc.attribute(toggle, attr::ARIA_EXPANDED) != Some("true") {
            tracing::info!("transcript_panel_opening");
            doc.click(toggle);
        }
        true
    }

    pub fn find_transcript_panel(&self) -> Option<NodeId> {
        let doc = self.doc.borrow();
        DETECTORS.transcript_panel.find(&doc, doc.root())
    }

    pub fn find_caption_overlay(&self) -> Option<NodeId> {
        let doc = self.doc.borrow();
        DETECTORS.caption_overlay.find(&doc, doc.root())
    }

    pub fn attach_panel(&mut self, panel: NodeId) -> Result<Vec<ControllerEvent>> {
        let sync_events = {
            let mut doc = self.doc.borrow_mut();
            self.sync.observe_transcript(&mut doc, panel)
        };
        tracing::info!("transcript_panel_attached");
        let mut events = vec![ControllerEvent::PanelAttached(panel)];
        events.extend(self.handle_sync_events(sync_events)?);
        Ok(events)
    }

    pub fn attach_caption(&mut self, overlay: NodeId) -> Result<Vec<ControllerEvent>> {
        {
            let mut doc = self.doc.borrow_mut();
            self.sync.observe_caption(&mut doc, overlay);
        }
        tracing::info!("caption_overlay_attached");
        self.render_active()?;
        self.ensure_menu()?;
        Ok(vec![ControllerEvent::CaptionAttached(overlay)])
    }

    fn ensure_menu(&mut self) -> Result<()> {
        let mut doc = self.doc.borrow_mut();
        if self.menu.as_ref().is_some_and(|m| m.is_attached(&doc)) {
            return Ok(());
        }
        if let Some(stale) = self.menu.take() {
            stale.remove(&mut doc)?;
        }
        self.menu = SettingsMenu::install(&mut doc, self.config.ui_language.messages())?;
        if let Some(menu) = &self.menu {
            menu.update_state(&mut doc, &self.config)?;
        }
        Ok(())
    }

    /// Builds the bulk translation pass for `panel`. Returns `None` while a
    /// pass is already running or when the provider does no bulk work.
    pub fn translation_job<S>(
        &mut self,
        panel: NodeId,
        progress: S,
    ) -> Option<LocalBoxFuture<'static, TranslationReport>>
    where
        S: ProgressSink + 'static,
    {
        if self.state != ControllerState::Running || self.translating {
            return None;
        }
        let provider = self.provider.clone()?;
        if provider.is_passthrough() {
            tracing::debug!(provider = provider.name(), "bulk_translation_not_needed");
            return None;
        }

        let mut orchestrator = Orchestrator::new(
            self.doc.clone(),
            self.cache.clone(),
            provider,
            self.config.target_language.clone(),
        )
        .with_show_original(self.config.show_original);
        if let Some(strategy) = self.strategy {
            orchestrator = orchestrator.with_strategy(strategy);
        }

        self.translating = true;
        Some(Box::pin(async move {
            orchestrator.translate_transcript(panel, &progress).await
        }))
    }

    pub fn on_progress(&mut self, update: ProgressUpdate) -> Result<()> {
        if !self.translating {
            return Ok(());
        }
        let mut doc = self.doc.borrow_mut();
        match update {
            ProgressUpdate::Started { total } => {
                self.progress.show(&mut doc)?;
                self.progress.update(&mut doc, 0, total)?;
            }
            ProgressUpdate::Advanced { completed, total } => {
                self.progress.update(&mut doc, completed, total)?;
            }
        }
        Ok(())
    }

    pub fn finish_translation(&mut self, report: &TranslationReport, now: Instant) -> Result<()> {
        self.translating = false;
        tracing::info!(
            groups = report.groups,
            translated = report.translated,
            failed = report.failed,
            "translation_pass_complete"
        );
        let mut doc = self.doc.borrow_mut();
        self.progress.complete(&mut doc, now)?;
        Ok(())
    }

    /// Forgets an in-flight pass whose future was dropped.
    pub fn cancel_translation(&mut self) -> Result<()> {
        if !self.translating {
            return Ok(());
        }
        self.translating = false;
        self.cache.borrow_mut().clear_pending();
        let mut doc = self.doc.borrow_mut();
        self.progress.remove(&mut doc)?;
        tracing::info!("translation_pass_cancelled");
        Ok(())
    }

    /// Applies a new settings snapshot and reports how the pipeline reacted.
    /// `Start` and `Restart` leave the startup sequence to the caller.
    pub fn apply_config(&mut self, next: TranslationConfig) -> Result<ConfigChange> {
        if self.state == ControllerState::Destroyed {
            return Ok(ConfigChange::None);
        }
        let change = self.config.classify_change(&next);
        tracing::info!(change = ?change, "settings_changed");

        match change {
            ConfigChange::None => self.set_config(next),
            ConfigChange::Start => self.set_config(next),
            ConfigChange::Stop => {
                self.teardown()?;
                self.set_config(next);
                self.state = ControllerState::Disabled;
            }
            ConfigChange::Restart => {
                self.teardown()?;
                self.set_config(next);
                self.state = ControllerState::Disabled;
            }
            ConfigChange::Restyle => {
                let relabel = self.config.ui_language != next.ui_language;
                self.set_config(next);
                if let Some(menu) = &self.menu {
                    let mut doc = self.doc.borrow_mut();
                    if relabel {
                        menu.relabel(&mut doc, self.config.ui_language.messages())?;
                    }
                    menu.update_state(&mut doc, &self.config)?;
                }
                self.render_active()?;
            }
        }
        Ok(change)
    }

    /// One frame of work: observer records, scheduled recomputations, timers,
    /// menu clicks and periodic maintenance.
    pub fn frame(&mut self, now: Instant) -> Result<Vec<ControllerEvent>> {
        if self.state != ControllerState::Running {
            return Ok(Vec::new());
        }

        let sync_events = {
            let mut doc = self.doc.borrow_mut();
            self.sync.pump(&mut doc);
            self.sync.run_frame(&doc)
        };
        let mut events = self.handle_sync_events(sync_events)?;

        {
            let mut doc = self.doc.borrow_mut();
            self.progress.tick(&mut doc, now)?;
        }

        events.extend(self.handle_clicks()?);

        if self.next_maintenance.is_some_and(|at| now >= at) {
            self.next_maintenance = Some(now + MAINTENANCE_INTERVAL);
            events.extend(self.maintain()?);
        }

        Ok(events)
    }

    fn handle_sync_events(&mut self, sync_events: Vec<SyncEvent>) -> Result<Vec<ControllerEvent>> {
        let mut events = Vec::new();
        for event in sync_events {
            match event {
                SyncEvent::ActiveCueChanged { active, original } => {
                    if active == self.active.current_active_text {
                        continue;
                    }
                    tracing::debug!(active = %active, "active_cue_changed");
                    self.active = ActiveCueState {
                        current_active_text: active.clone(),
                        original_caption_text: original.clone(),
                    };
                    self.render_active()?;
                    events.push(ControllerEvent::ActiveCue {
                        translated: active,
                        original,
                    });
                }
                SyncEvent::CaptionRestoreNeeded => {
                    tracing::debug!("caption_restore");
                    self.render_active()?;
                }
            }
        }
        Ok(events)
    }

    /// Renders the active cue into the overlay. The original line is left out
    /// when the cue has not been translated.
    fn render_active(&mut self) -> Result<bool> {
        let Some(overlay) = self.sync.caption_overlay() else {
            return Ok(false);
        };
        let translated = self.active.current_active_text.as_str();
        if translated.is_empty() {
            return Ok(false);
        }
        let original = match self.active.original_caption_text.as_str() {
            original if original == translated => "",
            original => original,
        };

        let mut doc = self.doc.borrow_mut();
        let renderer = &self.renderer;
        let wrote = self
            .sync
            .with_caption_write(&mut doc, |doc| renderer.display(doc, overlay, translated, original))?;
        if doc.is_connected(overlay) {
            self.sync.set_translation_displayed(true);
        }
        Ok(wrote)
    }

    fn handle_clicks(&mut self) -> Result<Vec<ControllerEvent>> {
        let clicks = self.doc.borrow_mut().take_events();
        let mut events = Vec::new();
        for DomEvent::Click(target) in clicks {
            let Some(hit) = self.menu.as_ref().map(|m| m.hit(&self.doc.borrow(), target)) else {
                continue;
            };
            match hit {
                MenuHit::ShowOriginal => {
                    let mut next = self.config.clone();
                    next.show_original = !next.show_original;
                    events.push(self.apply_menu_setting(next)?);
                }
                MenuHit::Position => {
                    let mut next = self.config.clone();
                    next.original_position = next.original_position.toggled();
                    events.push(self.apply_menu_setting(next)?);
                }
                MenuHit::ToggleMenu | MenuHit::Outside => {
                    let Some(menu) = &self.menu else {
                        continue;
                    };
                    let mut doc = self.doc.borrow_mut();
                    if hit == MenuHit::ToggleMenu {
                        menu.toggle_visible(&mut doc, &self.config)?;
                    } else if menu.is_open(&doc) {
                        menu.close(&mut doc)?;
                    }
                }
                MenuHit::Inside => {}
            }
        }
        Ok(events)
    }

    fn apply_menu_setting(&mut self, next: TranslationConfig) -> Result<ControllerEvent> {
        if let Err(error) = self.store.save(&next) {
            tracing::warn!(error = %error, "settings_save_failed");
        }
        self.set_config(next);
        if let Some(menu) = &self.menu {
            let mut doc = self.doc.borrow_mut();
            menu.update_state(&mut doc, &self.config)?;
        }
        self.render_active()?;
        Ok(ControllerEvent::SettingsChanged(self.config.clone()))
    }

    /// Re-attaches to host nodes that were replaced since the last check.
    fn maintain(&mut self) -> Result<Vec<ControllerEvent>> {
        let mut events = Vec::new();

        let overlay_replaced = {
            let doc = self.doc.borrow();
            self.sync
                .caption_overlay()
                .is_some_and(|overlay| !doc.is_connected(overlay))
        };
        if overlay_replaced {
            if let Some(overlay) = self.find_caption_overlay() {
                tracing::info!("caption_overlay_replaced");
                events.extend(self.attach_caption(overlay)?);
            }
        }

        let panel_replaced = {
            let doc = self.doc.borrow();
            self.sync
                .transcript_panel()
                .is_some_and(|panel| !doc.is_connected(panel))
        };
        if panel_replaced {
            if let Some(panel) = self.find_transcript_panel() {
                tracing::info!("transcript_panel_replaced");
                events.extend(self.attach_panel(panel)?);
                self.render_active()?;
            }
        }

        if self.sync.caption_overlay().is_some() {
            self.ensure_menu()?;
        }

        Ok(events)
    }

    /// Removes everything this controller injected and forgets session state.
    /// Safe to call in any state.
    pub fn teardown(&mut self) -> Result<()> {
        let panel = self.sync.transcript_panel();
        let overlay = self.sync.caption_overlay();
        let host_text = self.sync.host_caption_text().to_string();

        let mut doc = self.doc.borrow_mut();
        self.sync.disconnect(&mut doc);

        if let Some(panel) = panel {
            let restored = cue::restore_all(&mut doc, panel)?;
            tracing::debug!(restored, "cues_restored");
        }
        if let Some(overlay) = overlay {
            remove_injected(&mut doc, overlay)?;
            if doc.is_connected(overlay)
                && clean_text(&doc, overlay).is_empty()
                && !host_text.is_empty()
            {
                doc.set_text_content(overlay, &host_text)?;
            }
        }
        if let Some(menu) = self.menu.take() {
            menu.remove(&mut doc)?;
        }
        self.progress.remove(&mut doc)?;
        drop(doc);

        self.sync = SyncEngine::new();
        self.cache.borrow_mut().clear();
        self.provider = None;
        self.active = ActiveCueState::default();
        self.translating = false;
        self.next_maintenance = None;
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<()> {
        if self.state == ControllerState::Destroyed {
            return Ok(());
        }
        self.teardown()?;
        self.state = ControllerState::Destroyed;
        tracing::info!("controller_destroyed");
        Ok(())
    }

    /// Fails startup for a host element that never appeared.
    pub fn startup_failed(&mut self, detector: &'static str, waited: std::time::Duration) -> Error {
        let error = Error::HostElementNotFound { detector, waited };
        tracing::error!(error = %error, "startup_failed");
        if let Err(teardown_error) = self.destroy() {
            tracing::warn!(error = %teardown_error, "teardown_failed");
        }
        error
    }
}
