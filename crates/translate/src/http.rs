use std::time::Duration;

use cue_translate_interface::Error;
use serde::de::DeserializeOwned;

fn transport(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        Error::Timeout(timeout)
    } else {
        Error::Transport(Box::new(error))
    }
}

/// Pulls a human readable message out of an error body. Chat APIs nest it
/// under `error.message`, DeepL puts it at the top level.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown error".to_string())
}

pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<T, Error> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api {
            provider,
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let bytes = response.bytes().await.map_err(|e| transport(e, timeout))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Invalid key"}}"#),
            "Invalid key"
        );
        assert_eq!(error_message(r#"{"message":"Quota exceeded"}"#), "Quota exceeded");
        assert_eq!(error_message("<html>502</html>"), "Unknown error");
    }
}
