mod playback;
mod runtime;
mod settings;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cue_caption_sync::{
    CaptionController, DefaultProviderFactory, MemoryStore, OriginalPosition, Session,
    SettingsStore, TranslationConfig,
};
use cue_host_dom::Document;
use cue_translate_interface::TranslationEngine;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::playback::Player;
use crate::runtime::CliRuntime;
use crate::settings::JsonFileStore;

const LECTURE_FIXTURE: &str = include_str!("../fixtures/lecture.html");

#[derive(Parser)]
#[command(name = "cuebridge", about = "Plays a lecture page with bilingual captions")]
struct Cli {
    /// Page markup to play. Defaults to a bundled lecture.
    #[arg(long)]
    page: Option<PathBuf>,

    /// JSON settings file, created on first save.
    #[arg(long, env = "CUEBRIDGE_SETTINGS")]
    settings: Option<PathBuf>,

    #[arg(long, env = "CUEBRIDGE_ENGINE")]
    engine: Option<TranslationEngine>,

    #[arg(long, env = "CUEBRIDGE_TARGET_LANGUAGE")]
    target_language: Option<String>,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    deepseek_api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "DEEPL_API_KEY", hide_env_values = true)]
    deepl_api_key: Option<String>,

    #[arg(long, env = "DEEPL_FREE_API")]
    deepl_free_api: bool,

    #[arg(long)]
    position: Option<OriginalPosition>,

    #[arg(long)]
    hide_original: bool,

    /// Time each cue stays highlighted.
    #[arg(long, default_value_t = 2000)]
    cue_interval_ms: u64,

    /// Print session events as JSON lines.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, config: &mut TranslationConfig) {
        config.enabled = true;
        if let Some(engine) = self.engine {
            config.translation_engine = engine;
        }
        if let Some(language) = &self.target_language {
            config.target_language = language.clone();
        }
        if self.deepseek_api_key.is_some() {
            config.deepseek_api_key = self.deepseek_api_key.clone();
        }
        if self.gemini_api_key.is_some() {
            config.gemini_api_key = self.gemini_api_key.clone();
        }
        if self.deepl_api_key.is_some() {
            config.deepl_api_key = self.deepl_api_key.clone();
        }
        if self.deepl_free_api {
            config.deepl_free_api = true;
        }
        if let Some(position) = self.position {
            config.original_position = position;
        }
        if self.hide_original {
            config.show_original = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The page model is single-threaded.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let markup = match &cli.page {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => LECTURE_FIXTURE.to_string(),
    };
    let doc = Rc::new(RefCell::new(
        Document::parse(&markup).context("failed to parse page")?,
    ));

    let store: Rc<dyn SettingsStore> = match &cli.settings {
        Some(path) => Rc::new(JsonFileStore::new(path)),
        None => Rc::new(MemoryStore::default()),
    };
    let mut config = store.load()?;
    cli.apply(&mut config);
    store.save(&config)?;

    let (_config_tx, config_rx) = watch::channel(config);
    let cancel = CancellationToken::new();

    let controller = CaptionController::new(doc.clone(), store, DefaultProviderFactory);
    let session = Session::new(
        controller,
        Arc::new(CliRuntime::new(cli.json)),
        config_rx,
        cancel.clone(),
    );
    let player = Player::new(doc, Duration::from_millis(cli.cue_interval_ms))?;

    let playback = async {
        let played = tokio::select! {
            played = player.play(&cancel) => played,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted.");
                Ok(0)
            }
        };
        let transcript = player.transcript();
        cancel.cancel();
        played.map(|_| transcript)
    };

    let session = async {
        let result = session.run().await;
        cancel.cancel();
        result
    };

    let (session_result, transcript) = tokio::join!(session, playback);
    session_result?;

    if !cli.json {
        eprintln!();
        for (original, translation) in transcript? {
            match translation {
                Some(translation) => println!("{original}\n  -> {translation}"),
                None => println!("{original}"),
            }
        }
    }
    Ok(())
}
