use std::sync::Arc;

use cue_translate_interface::{ApiKeys, TranslationEngine, TranslationProvider};

use crate::{DeepLProvider, DeepSeekProvider, GeminiProvider, PassthroughProvider};

/// Builds the provider for `engine`. An API engine without a usable key falls
/// back to the passthrough provider.
pub fn create_provider(engine: TranslationEngine, keys: &ApiKeys) -> Arc<dyn TranslationProvider> {
    if !engine.is_api() {
        return Arc::new(PassthroughProvider);
    }

    let Some(key) = keys.for_engine(engine) else {
        tracing::warn!(engine = %engine, "api_key_missing_using_passthrough");
        return Arc::new(PassthroughProvider);
    };

    match engine {
        TranslationEngine::DeepSeek => Arc::new(DeepSeekProvider::new(key)),
        TranslationEngine::Gemini => Arc::new(GeminiProvider::new(key)),
        TranslationEngine::DeepL => Arc::new(DeepLProvider::new(key, keys.deepl_free)),
        TranslationEngine::Chrome => Arc::new(PassthroughProvider),
    }
}
