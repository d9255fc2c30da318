use cue_translate_interface::{BoxFuture, Error, TranslationProvider};

/// Leaves text untouched. Used for the browser-translation engine and as the
/// fallback when an API engine has no key.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughProvider;

impl TranslationProvider for PassthroughProvider {
    fn name(&self) -> &'static str {
        "chrome"
    }

    fn translate_text<'a>(
        &'a self,
        text: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move { Ok(text.to_string()) })
    }

    fn translate_html<'a>(
        &'a self,
        markup: &'a str,
        _target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move { Ok(markup.to_string()) })
    }

    fn is_passthrough(&self) -> bool {
        true
    }
}
