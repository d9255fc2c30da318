use std::time::Duration;

pub const TRANSLATION_BATCH_SIZE: usize = 10;

/// Stand-in for the host's animation frame cadence.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_millis(1500);
pub const WAIT_FOR_ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const PROGRESS_FADEOUT_DELAY: Duration = Duration::from_millis(2000);
pub const PROGRESS_REMOVAL_DELAY: Duration = Duration::from_millis(300);

pub const ORIGINAL_FONT_SCALE: f32 = 0.8;

pub mod attr {
    pub const DATA_PURPOSE: &str = "data-purpose";
    pub const DATA_ACTION: &str = "data-action";
    pub const DATA_ORIGINAL_TEXT: &str = "data-original-text";
    pub const ARIA_EXPANDED: &str = "aria-expanded";
    pub const ARIA_CURRENT: &str = "aria-current";
    pub const ARIA_CHECKED: &str = "aria-checked";
    pub const ARIA_LABEL: &str = "aria-label";
    pub const DATA_HIGHLIGHTED: &str = "data-highlighted";
}

pub mod class {
    pub const CAPTION_TRANSLATED: &str = "cuebridge-caption";
    pub const CAPTION_ORIGINAL: &str = "cuebridge-caption-original";
    pub const CUE_TRANSLATION: &str = "cuebridge-translation";
    pub const CUE_ORIGINAL: &str = "cuebridge-original";
    pub const SETTINGS_CONTAINER: &str = "cuebridge-settings";
    pub const SETTINGS_MENU: &str = "cuebridge-settings-menu";
    pub const SPINNER: &str = "cuebridge-spinner";
    pub const POSITION_INDICATOR: &str = "position-indicator";
    pub const VISIBLE: &str = "visible";
    pub const FADING_OUT: &str = "fading-out";
}

pub const PROGRESS_INDICATOR_ID: &str = "cuebridge-progress";
pub const PROGRESS_TEXT_ID: &str = "cuebridge-progress-text";

pub const ACTION_TOGGLE_ORIGINAL: &str = "toggle-original";
pub const ACTION_TOGGLE_POSITION: &str = "toggle-position";
pub const SETTINGS_TOGGLE_PURPOSE: &str = "caption-settings-toggle";

/// Attributes whose changes can move the host's active-cue highlight.
pub const TRANSCRIPT_ATTRIBUTE_FILTER: &[&str] = &[
    "class",
    attr::ARIA_CURRENT,
    attr::DATA_HIGHLIGHTED,
    attr::DATA_PURPOSE,
];
