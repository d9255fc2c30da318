use crate::{TranslationConfig, TranslationReport};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionLifecycleEvent {
    Started { engine: String },
    Restarted,
    Stopped,
    StartupFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionProgressEvent {
    PanelAttached,
    CaptionAttached,
    TranslationProgress { completed: usize, total: usize },
    TranslationFinished { report: TranslationReport },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionDataEvent {
    ActiveCue { translated: String, original: String },
    SettingsChanged { config: TranslationConfig },
}

/// Receives everything a session reports.
pub trait SessionRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent);
    fn emit_progress(&self, event: SessionProgressEvent);
    fn emit_data(&self, event: SessionDataEvent);
}
