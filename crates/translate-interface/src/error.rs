use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} API key is not configured")]
    MissingApiKey(&'static str),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] BoxError),
    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("{0} returned no translation")]
    EmptyResponse(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
