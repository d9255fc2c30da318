use cue_translate_interface::{ApiKeys, TranslationEngine};

use crate::UiLanguage;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OriginalPosition {
    Above,
    #[default]
    Below,
}

impl OriginalPosition {
    pub fn toggled(self) -> Self {
        match self {
            Self::Above => Self::Below,
            Self::Below => Self::Above,
        }
    }
}

/// User settings as stored by the settings collaborator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub target_language: String,
    pub translation_engine: TranslationEngine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepl_api_key: Option<String>,
    pub deepl_free_api: bool,
    pub show_original: bool,
    pub original_position: OriginalPosition,
    pub ui_language: UiLanguage,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_language: "Korean".to_string(),
            translation_engine: TranslationEngine::Chrome,
            deepseek_api_key: None,
            gemini_api_key: None,
            deepl_api_key: None,
            deepl_free_api: false,
            show_original: true,
            original_position: OriginalPosition::Below,
            ui_language: UiLanguage::En,
        }
    }
}

/// How the running pipeline has to react to a new settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    None,
    Start,
    Stop,
    /// Only presentation changed; re-render without touching observers.
    Restyle,
    /// Engine, language or keys changed; rebuild the pipeline.
    Restart,
}

impl TranslationConfig {
    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys {
            deepseek: self.deepseek_api_key.clone(),
            gemini: self.gemini_api_key.clone(),
            deepl: self.deepl_api_key.clone(),
            deepl_free: self.deepl_free_api,
        }
    }

    fn pipeline_differs(&self, other: &Self) -> bool {
        self.target_language != other.target_language
            || self.translation_engine != other.translation_engine
            || self.api_keys() != other.api_keys()
    }

    fn presentation_differs(&self, other: &Self) -> bool {
        self.show_original != other.show_original
            || self.original_position != other.original_position
            || self.ui_language != other.ui_language
    }

    pub fn classify_change(&self, next: &Self) -> ConfigChange {
        match (self.enabled, next.enabled) {
            (false, false) => ConfigChange::None,
            (false, true) => ConfigChange::Start,
            (true, false) => ConfigChange::Stop,
            (true, true) if self.pipeline_differs(next) => ConfigChange::Restart,
            (true, true) if self.presentation_differs(next) => ConfigChange::Restyle,
            (true, true) => ConfigChange::None,
        }
    }
}
