//! Settings button and menu injected into the player's control bar.

use cue_host_dom::{Document, NodeId};

use crate::constants::{
    ACTION_TOGGLE_ORIGINAL, ACTION_TOGGLE_POSITION, SETTINGS_TOGGLE_PURPOSE, attr, class,
};
use crate::detect::DETECTORS;
use crate::{Messages, OriginalPosition, Result, TranslationConfig};

/// Where a click landed relative to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuHit {
    ToggleMenu,
    ShowOriginal,
    Position,
    Inside,
    Outside,
}

#[derive(Debug)]
pub struct SettingsMenu {
    container: NodeId,
    button: NodeId,
    menu: NodeId,
    header: NodeId,
    show_original_button: NodeId,
    show_original_label: NodeId,
    position_button: NodeId,
    position_label: NodeId,
    position_indicator: NodeId,
}

impl SettingsMenu {
    /// Injects the button next to the transcript toggle. Returns `None` when the
    /// control bar or the toggle cannot be found.
    pub fn install(doc: &mut Document, messages: &Messages) -> Result<Option<Self>> {
        let Some(anchor) = DETECTORS
            .video_controls
            .find(doc, doc.root())
            .and_then(|controls| DETECTORS.transcript_toggle.find(doc, controls))
            .and_then(|toggle| doc.parent(toggle))
        else {
            tracing::warn!("settings_button_anchor_missing");
            return Ok(None);
        };

        let container = doc.create_element("div");
        doc.add_class(container, class::SETTINGS_CONTAINER)?;

        let button = doc.create_element("button");
        doc.set_attribute(button, "type", "button")?;
        doc.set_attribute(button, attr::DATA_PURPOSE, SETTINGS_TOGGLE_PURPOSE)?;
        doc.set_attribute(button, attr::ARIA_LABEL, messages.caption_settings)?;
        doc.append_child(container, button)?;

        let menu = doc.create_element("div");
        doc.add_class(menu, class::SETTINGS_MENU)?;
        doc.append_child(container, menu)?;

        let header = doc.create_element("div");
        doc.add_class(header, "header")?;
        doc.set_text_content(header, messages.caption_settings)?;
        doc.append_child(menu, header)?;

        let body = doc.create_element("div");
        doc.add_class(body, "menu-body")?;
        doc.append_child(menu, body)?;

        let (show_original_button, show_original_label) =
            menu_item(doc, body, ACTION_TOGGLE_ORIGINAL, messages.show_original)?;
        let slider = doc.create_element("span");
        doc.add_class(slider, "checkbox-slider")?;
        append_to_item(doc, show_original_button, slider)?;

        let (position_button, position_label) =
            menu_item(doc, body, ACTION_TOGGLE_POSITION, messages.original_position)?;
        let position_indicator = doc.create_element("span");
        doc.add_class(position_indicator, class::POSITION_INDICATOR)?;
        append_to_item(doc, position_button, position_indicator)?;

        doc.insert_after(anchor, container)?;
        tracing::info!("settings_button_added");

        Ok(Some(Self {
            container,
            button,
            menu,
            header,
            show_original_button,
            show_original_label,
            position_button,
            position_label,
            position_indicator,
        }))
    }

    pub fn is_attached(&self, doc: &Document) -> bool {
        doc.is_connected(self.container)
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_class(self.menu, class::VISIBLE)
    }

    pub fn hit(&self, doc: &Document, target: NodeId) -> MenuHit {
        if doc.contains(self.button, target) {
            MenuHit::ToggleMenu
        } else if doc.contains(self.show_original_button, target) {
            MenuHit::ShowOriginal
        } else if doc.contains(self.position_button, target) {
            MenuHit::Position
        } else if doc.contains(self.container, target) {
            MenuHit::Inside
        } else {
            MenuHit::Outside
        }
    }

    /// Opens or closes the menu, refreshing its state when it opens.
    pub fn toggle_visible(&self, doc: &mut Document, config: &TranslationConfig) -> Result<()> {
        let open = !self.is_open(doc);
        doc.toggle_class(self.menu, class::VISIBLE, open)?;
        if open {
            self.update_state(doc, config)?;
        }
        Ok(())
    }

    pub fn close(&self, doc: &mut Document) -> Result<()> {
        doc.remove_class(self.menu, class::VISIBLE)?;
        Ok(())
    }

    pub fn update_state(&self, doc: &mut Document, config: &TranslationConfig) -> Result<()> {
        let checked = config.show_original.to_string();
        if doc.attribute(self.show_original_button, attr::ARIA_CHECKED) != Some(checked.as_str()) {
            doc.set_attribute(self.show_original_button, attr::ARIA_CHECKED, &checked)?;
        }

        let messages = config.ui_language.messages();
        let label = match config.original_position {
            OriginalPosition::Above => messages.above,
            OriginalPosition::Below => messages.below,
        };
        if doc.text_content(self.position_indicator) != label {
            doc.set_text_content(self.position_indicator, label)?;
        }
        Ok(())
    }

    /// Rewrites the static labels after a UI language change.
    pub fn relabel(&self, doc: &mut Document, messages: &Messages) -> Result<()> {
        doc.set_attribute(self.button, attr::ARIA_LABEL, messages.caption_settings)?;
        doc.set_text_content(self.header, messages.caption_settings)?;
        doc.set_text_content(self.show_original_label, messages.show_original)?;
        doc.set_text_content(self.position_label, messages.original_position)?;
        Ok(())
    }

    pub fn remove(&self, doc: &mut Document) -> Result<()> {
        if doc.parent(self.container).is_some() {
            doc.remove(self.container)?;
        }
        Ok(())
    }
}

/// `<button data-action=…><div class="item-content"><span>label</span></div></button>`
fn menu_item(
    doc: &mut Document,
    parent: NodeId,
    action: &str,
    label: &str,
) -> Result<(NodeId, NodeId)> {
    let button = doc.create_element("button");
    doc.set_attribute(button, "type", "button")?;
    doc.set_attribute(button, attr::DATA_ACTION, action)?;

    let content = doc.create_element("div");
    doc.add_class(content, "item-content")?;
    doc.append_child(button, content)?;

    let label_node = doc.create_element("span");
    doc.set_text_content(label_node, label)?;
    doc.append_child(content, label_node)?;

    doc.append_child(parent, button)?;
    Ok((button, label_node))
}

fn append_to_item(doc: &mut Document, button: NodeId, node: NodeId) -> Result<()> {
    let content = doc.element_children(button).first().copied().unwrap_or(button);
    doc.append_child(content, node)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::UiLanguage;

    const CONTROLS: &str = indoc! {r#"
        <div data-purpose="video-controls">
          <div class="toggle-slot"><button data-purpose="transcript-toggle">T</button></div>
          <div class="volume"></div>
        </div>
        <div class="elsewhere"></div>
    "#};

    fn by_class(doc: &Document, class: &str) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|n| doc.has_class(*n, class))
            .unwrap()
    }

    #[test]
    fn test_install_next_to_toggle() {
        let mut doc = Document::parse(CONTROLS).unwrap();
        let menu = SettingsMenu::install(&mut doc, UiLanguage::En.messages())
            .unwrap()
            .unwrap();

        let slot = by_class(&doc, "toggle-slot");
        let controls = doc.parent(slot).unwrap();
        let children = doc.element_children(controls);
        assert_eq!(children[1], menu.container);
        assert_eq!(
            doc.attribute(menu.button, attr::DATA_PURPOSE),
            Some(SETTINGS_TOGGLE_PURPOSE)
        );
        assert_eq!(doc.text_content(menu.header), "Caption Settings");
    }

    #[test]
    fn test_missing_anchor() {
        let mut doc = Document::parse(r#"<div class="player"></div>"#).unwrap();
        assert!(
            SettingsMenu::install(&mut doc, UiLanguage::En.messages())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_hits_and_state() {
        let mut doc = Document::parse(CONTROLS).unwrap();
        let menu = SettingsMenu::install(&mut doc, UiLanguage::Ko.messages())
            .unwrap()
            .unwrap();
        let config = TranslationConfig {
            ui_language: UiLanguage::Ko,
            ..Default::default()
        };

        assert_eq!(menu.hit(&doc, menu.button), MenuHit::ToggleMenu);
        assert_eq!(menu.hit(&doc, menu.show_original_label), MenuHit::ShowOriginal);
        assert_eq!(menu.hit(&doc, menu.position_indicator), MenuHit::Position);
        assert_eq!(menu.hit(&doc, menu.header), MenuHit::Inside);
        assert_eq!(menu.hit(&doc, by_class(&doc, "elsewhere")), MenuHit::Outside);

        menu.toggle_visible(&mut doc, &config).unwrap();
        assert!(menu.is_open(&doc));
        assert_eq!(
            doc.attribute(menu.show_original_button, attr::ARIA_CHECKED),
            Some("true")
        );
        assert_eq!(doc.text_content(menu.position_indicator), "아래");

        let config = TranslationConfig {
            original_position: OriginalPosition::Above,
            show_original: false,
            ..config
        };
        menu.update_state(&mut doc, &config).unwrap();
        assert_eq!(doc.text_content(menu.position_indicator), "위");
        assert_eq!(
            doc.attribute(menu.show_original_button, attr::ARIA_CHECKED),
            Some("false")
        );

        menu.close(&mut doc).unwrap();
        assert!(!menu.is_open(&doc));

        menu.remove(&mut doc).unwrap();
        assert!(!menu.is_attached(&doc));
    }
}
