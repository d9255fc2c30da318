use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{detector} not found within {waited:?}")]
    HostElementNotFound {
        detector: &'static str,
        waited: Duration,
    },
    #[error(transparent)]
    Dom(#[from] cue_host_dom::Error),
    #[error(transparent)]
    Translate(#[from] cue_translate_interface::Error),
    #[error("failed to write batch markup: {0}")]
    MarkupWrite(String),
    #[error("settings store: {0}")]
    Settings(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
