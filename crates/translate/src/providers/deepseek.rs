use cue_translate_interface::{
    BoxFuture, Error, MARKUP_CALL_TIMEOUT, TEXT_CALL_TIMEOUT, TranslationProvider,
};
use serde::{Deserialize, Serialize};

use crate::{http, prompt, sanitize};

pub const DEEPSEEK_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const MODEL: &str = "deepseek-chat";

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEEPSEEK_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete(
        &self,
        system: String,
        user: String,
        temperature: f32,
        max_tokens: u32,
        timeout: std::time::Duration,
    ) -> Result<String, Error> {
        let body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let request = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: ChatResponse = http::send_json(self.name(), request, timeout).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(Error::EmptyResponse(self.name()))
    }
}

impl TranslationProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
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
            self.complete(
                prompt::text_instructions(target_language),
                prompt::text_request(target_language, text),
                0.3,
                2000,
                TEXT_CALL_TIMEOUT,
            )
            .await
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
            let reply = self
                .complete(
                    prompt::markup_instructions(target_language),
                    prompt::markup_request(target_language, markup),
                    0.1,
                    8000,
                    MARKUP_CALL_TIMEOUT,
                )
                .await?;
            Ok(sanitize::strip_code_fences(&reply))
        })
    }
}
