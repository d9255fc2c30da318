use cue_translate_interface::{
    BoxFuture, Error, MARKUP_CALL_TIMEOUT, TEXT_CALL_TIMEOUT, TranslationProvider,
};
use serde::{Deserialize, Serialize};

use crate::{http, prompt, sanitize};

pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_URL.to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(&self, prompt: String, timeout: std::time::Duration) -> Result<String, Error> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response: GenerateResponse = http::send_json(self.name(), request, timeout).await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(Error::EmptyResponse(self.name()))
    }
}

impl TranslationProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
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
            let prompt = format!(
                "{}\n\n{}",
                prompt::text_instructions(target_language),
                prompt::text_request(target_language, text)
            );
            self.generate(prompt, TEXT_CALL_TIMEOUT).await
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
            let prompt = format!(
                "{}\n\n{}",
                prompt::markup_instructions(target_language),
                prompt::markup_request(target_language, markup)
            );
            let reply = self.generate(prompt, MARKUP_CALL_TIMEOUT).await?;
            Ok(sanitize::strip_code_fences(&reply))
        })
    }
}
