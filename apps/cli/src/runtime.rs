use cue_caption_sync::{
    SessionDataEvent, SessionLifecycleEvent, SessionProgressEvent, SessionRuntime,
};

/// Prints session events: captions on stdout, everything else on stderr.
pub struct CliRuntime {
    json: bool,
}

impl CliRuntime {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json(&self, event: &impl serde::Serialize) {
        println!("{}", serde_json::to_string(event).unwrap_or_default());
    }
}

impl SessionRuntime for CliRuntime {
    fn emit_lifecycle(&self, event: SessionLifecycleEvent) {
        if self.json {
            return self.print_json(&event);
        }
        match &event {
            SessionLifecycleEvent::Started { engine } => {
                eprintln!("[lifecycle] started engine={engine}");
            }
            SessionLifecycleEvent::Restarted => eprintln!("[lifecycle] restarted"),
            SessionLifecycleEvent::Stopped => eprintln!("[lifecycle] stopped"),
            SessionLifecycleEvent::StartupFailed { error } => {
                eprintln!("[lifecycle] startup failed: {error}");
            }
        }
    }

    fn emit_progress(&self, event: SessionProgressEvent) {
        if self.json {
            return self.print_json(&event);
        }
        match &event {
            SessionProgressEvent::PanelAttached => eprintln!("[progress] transcript attached"),
            SessionProgressEvent::CaptionAttached => eprintln!("[progress] captions attached"),
            SessionProgressEvent::TranslationProgress { completed, total } => {
                eprintln!(
                    "[progress] {}",
                    cue_caption_sync::format_progress(*completed, *total)
                );
            }
            SessionProgressEvent::TranslationFinished { report } => {
                eprintln!(
                    "[progress] done groups={} cached={} translated={} failed={} calls={}",
                    report.groups, report.cached, report.translated, report.failed, report.units
                );
            }
        }
    }

    fn emit_data(&self, event: SessionDataEvent) {
        if self.json {
            return self.print_json(&event);
        }
        match &event {
            SessionDataEvent::ActiveCue {
                translated,
                original,
            } => {
                if original.is_empty() || original == translated {
                    println!("{translated}");
                } else {
                    println!("{translated}\n  {original}");
                }
            }
            SessionDataEvent::SettingsChanged { config } => {
                eprintln!(
                    "[data] settings show_original={} position={}",
                    config.show_original, config.original_position
                );
            }
        }
    }
}
