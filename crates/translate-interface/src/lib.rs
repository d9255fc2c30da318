mod error;

pub use error::*;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Wrapper attribute carrying the global sentence-group index in batch markup.
pub const SENTENCE_GROUP_ATTR: &str = "data-sentence-group";
/// Attribute carrying a cue's index inside its sentence group.
pub const CUE_INDEX_ATTR: &str = "data-cue-index";

pub const TEXT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const MARKUP_CALL_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TranslationEngine {
    /// The browser's built-in page translation. Nothing is translated here;
    /// the host keeps its own text.
    #[default]
    Chrome,
    DeepSeek,
    Gemini,
    DeepL,
}

impl TranslationEngine {
    /// Engines backed by an HTTP API that this workspace calls itself.
    pub fn is_api(&self) -> bool {
        !matches!(self, Self::Chrome)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub deepseek: Option<String>,
    pub gemini: Option<String>,
    pub deepl: Option<String>,
    /// Use the DeepL free-tier host instead of the paid one.
    pub deepl_free: bool,
}

impl ApiKeys {
    pub fn for_engine(&self, engine: TranslationEngine) -> Option<&str> {
        let key = match engine {
            TranslationEngine::Chrome => return None,
            TranslationEngine::DeepSeek => &self.deepseek,
            TranslationEngine::Gemini => &self.gemini,
            TranslationEngine::DeepL => &self.deepl,
        };
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// A translation backend.
///
/// `translate_html` receives batch markup of the form
/// `<div data-sentence-group="N"><div data-cue-index="k">text</div></div>` and
/// must return the same structure with the text translated. Backends that
/// cannot keep that structure report `false` from
/// [`TranslationProvider::supports_sentence_groups`] and are driven one
/// sentence at a time through `translate_text` instead.
///
/// # Object safety
///
/// The trait is object-safe via the explicit `BoxFuture` return type.
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn translate_text<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>>;

    fn translate_html<'a>(
        &'a self,
        markup: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>>;

    fn supports_sentence_groups(&self) -> bool {
        true
    }

    /// True for backends that return their input unchanged. Bulk transcript
    /// translation is skipped for them.
    fn is_passthrough(&self) -> bool {
        false
    }
}

/// Translates `text`, falling back to the untouched input on any failure.
pub async fn translate_text_or_original(
    provider: &dyn TranslationProvider,
    text: &str,
    target_language: &str,
) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    match provider.translate_text(text, target_language).await {
        Ok(translated) if !translated.trim().is_empty() => translated,
        Ok(_) => text.to_string(),
        Err(error) => {
            tracing::warn!(provider = provider.name(), error = %error, "translate_text_failed");
            text.to_string()
        }
    }
}
