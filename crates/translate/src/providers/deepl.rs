use cue_translate_interface::{
    BoxFuture, Error, MARKUP_CALL_TIMEOUT, TEXT_CALL_TIMEOUT, TranslationProvider,
};
use serde::{Deserialize, Serialize};

use crate::{http, sanitize};

pub const DEEPL_URL: &str = "https://api.deepl.com/v2";
pub const DEEPL_FREE_URL: &str = "https://api-free.deepl.com/v2";

/// Maps a language name to a DeepL target code. Unknown names are passed
/// through upper-cased so callers can also supply codes directly.
pub fn deepl_language_code(language: &str) -> String {
    let code = match language {
        "Korean" => "KO",
        "English" => "EN",
        "Japanese" => "JA",
        "Chinese" => "ZH",
        "Spanish" => "ES",
        "French" => "FR",
        "German" => "DE",
        "Italian" => "IT",
        "Portuguese" => "PT",
        "Russian" => "RU",
        "Dutch" => "NL",
        "Polish" => "PL",
        other => return other.to_uppercase(),
    };
    code.to_string()
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_handling: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preserve_formatting: Option<bool>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

pub struct DeepLProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepLProvider {
    pub fn new(api_key: impl Into<String>, free_api: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: if free_api { DEEPL_FREE_URL } else { DEEPL_URL }.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn translate(
        &self,
        body: TranslateRequest<'_>,
        timeout: std::time::Duration,
    ) -> Result<String, Error> {
        let request = self
            .client
            .post(format!("{}/translate", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body);
        let response: TranslateResponse = http::send_json(self.name(), request, timeout).await?;

        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|t| !t.is_empty())
            .ok_or(Error::EmptyResponse(self.name()))
    }
}

impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &'static str {
        "deepl"
    }

    fn translate_text<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Ok(String::new());
            }
            let body = TranslateRequest {
                text: [text],
                target_lang: deepl_language_code(target_language),
                tag_handling: None,
                preserve_formatting: None,
            };
            self.translate(body, TEXT_CALL_TIMEOUT).await
        })
    }

    fn translate_html<'a>(
        &'a self,
        markup: &'a str,
        target_language: &'a str,
    ) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move {
            if markup.trim().is_empty() {
                return Ok(String::new());
            }
            let body = TranslateRequest {
                text: [markup],
                target_lang: deepl_language_code(target_language),
                tag_handling: Some("html"),
                preserve_formatting: Some(true),
            };
            let reply = self.translate(body, MARKUP_CALL_TIMEOUT).await?;
            Ok(sanitize::merge_group_fragments(&reply))
        })
    }

    /// DeepL translates each cue element on its own, so group markup yields
    /// fragment translations rather than one sentence per group.
    fn supports_sentence_groups(&self) -> bool {
        false
    }
}
