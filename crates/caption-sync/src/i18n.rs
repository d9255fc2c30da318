#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UiLanguage {
    Ko,
    Ja,
    Zh,
    #[default]
    En,
}

impl UiLanguage {
    /// Picks the UI language for a locale tag such as `ko-KR` or `zh_CN.UTF-8`.
    pub fn from_locale(locale: &str) -> Self {
        let lower = locale.to_ascii_lowercase();
        if lower.starts_with("ko") {
            Self::Ko
        } else if lower.starts_with("ja") {
            Self::Ja
        } else if lower.starts_with("zh") {
            Self::Zh
        } else {
            Self::En
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Self::Ko => &KO,
            Self::Ja => &JA,
            Self::Zh => &ZH,
            Self::En => &EN,
        }
    }
}

#[derive(Debug)]
pub struct Messages {
    pub translating: &'static str,
    pub translation_complete: &'static str,
    pub caption_settings: &'static str,
    pub show_original: &'static str,
    pub original_position: &'static str,
    pub above: &'static str,
    pub below: &'static str,
}

static KO: Messages = Messages {
    translating: "번역 중...",
    translation_complete: "번역 완료!",
    caption_settings: "자막 설정",
    show_original: "원본 자막 표시",
    original_position: "원본 위치",
    above: "위",
    below: "아래",
};

static JA: Messages = Messages {
    translating: "翻訳中...",
    translation_complete: "翻訳完了！",
    caption_settings: "字幕設定",
    show_original: "原文字幕を表示",
    original_position: "原文の位置",
    above: "上",
    below: "下",
};

static ZH: Messages = Messages {
    translating: "翻译中...",
    translation_complete: "翻译完成！",
    caption_settings: "字幕设置",
    show_original: "显示原文字幕",
    original_position: "原文位置",
    above: "上方",
    below: "下方",
};

static EN: Messages = Messages {
    translating: "Translating...",
    translation_complete: "Translation Complete!",
    caption_settings: "Caption Settings",
    show_original: "Show Original Subtitle",
    original_position: "Original Position",
    above: "Above",
    below: "Below",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_locale() {
        assert_eq!(UiLanguage::from_locale("ko-KR"), UiLanguage::Ko);
        assert_eq!(UiLanguage::from_locale("ja_JP.UTF-8"), UiLanguage::Ja);
        assert_eq!(UiLanguage::from_locale("zh-Hant"), UiLanguage::Zh);
        assert_eq!(UiLanguage::from_locale("de-DE"), UiLanguage::En);
        assert_eq!(UiLanguage::from_locale(""), UiLanguage::En);
    }

    #[test]
    fn test_messages() {
        assert_eq!(UiLanguage::Ko.messages().translating, "번역 중...");
        assert_eq!(UiLanguage::Ja.messages().below, "下");
        assert_eq!(UiLanguage::En.messages().above, "Above");
    }
}
