//! Caption overlay rendering.

use cue_host_dom::{Document, NodeId};

use crate::constants::{ORIGINAL_FONT_SCALE, class};
use crate::detect::{DETECTORS, injected_selector};
use crate::{OriginalPosition, Result, TranslationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_original: bool,
    pub original_position: OriginalPosition,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_original: true,
            original_position: OriginalPosition::Below,
        }
    }
}

impl From<&TranslationConfig> for RenderOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            show_original: config.show_original,
            original_position: config.original_position,
        }
    }
}

/// Writes the translated line, and optionally the original line, into the
/// host's caption overlay.
#[derive(Debug, Default)]
pub struct CaptionRenderer {
    options: RenderOptions,
}

impl CaptionRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Renders `translated` (and `original`) into `container`. Returns whether
    /// anything was written; rendering the state already on screen writes
    /// nothing.
    pub fn display(
        &self,
        doc: &mut Document,
        container: NodeId,
        translated: &str,
        original: &str,
    ) -> Result<bool> {
        if translated.is_empty() || !doc.is_connected(container) {
            return Ok(false);
        }

        let show_original = self.options.show_original && !original.is_empty();
        let host_text = clean_text(doc, container);
        let font_size = doc.computed_font_size(container);
        let base_font = format_px(font_size);
        let original_font = format_px(font_size * ORIGINAL_FONT_SCALE);

        let existing_translated = find_child(doc, container, class::CAPTION_TRANSLATED);
        let existing_original = find_child(doc, container, class::CAPTION_ORIGINAL);

        if host_text.is_empty()
            && self.is_current(
                doc,
                container,
                existing_translated,
                existing_original,
                (translated, &base_font),
                show_original.then_some((original, original_font.as_str())),
            )
        {
            return Ok(false);
        }

        let translated_node = match existing_translated {
            Some(node) if host_text.is_empty() => node,
            existing => {
                doc.clear_children(container)?;
                let node = match existing {
                    Some(node) => node,
                    None => {
                        let node = doc.create_element("div");
                        doc.add_class(node, class::CAPTION_TRANSLATED)?;
                        node
                    }
                };
                doc.append_child(container, node)?;
                node
            }
        };
        write_line(doc, translated_node, translated, &base_font)?;

        let original_node = existing_original.filter(|n| doc.parent(*n) == Some(container));
        if !show_original {
            if let Some(node) = original_node {
                doc.remove(node)?;
            }
            return Ok(true);
        }

        let original_node = match original_node.or(existing_original) {
            Some(node) => node,
            None => {
                let node = doc.create_element("div");
                doc.add_class(node, class::CAPTION_ORIGINAL)?;
                node
            }
        };
        write_line(doc, original_node, original, &original_font)?;

        let position = self.options.original_position;
        if !in_position(doc, container, translated_node, original_node, position) {
            match position {
                OriginalPosition::Above => {
                    doc.insert_before(container, original_node, Some(translated_node))?;
                }
                OriginalPosition::Below => doc.append_child(container, original_node)?,
            }
        }

        Ok(true)
    }

    fn is_current(
        &self,
        doc: &Document,
        container: NodeId,
        translated_node: Option<NodeId>,
        original_node: Option<NodeId>,
        translated: (&str, &str),
        original: Option<(&str, &str)>,
    ) -> bool {
        let Some(translated_node) = translated_node else {
            return false;
        };
        if !line_matches(doc, translated_node, translated) {
            return false;
        }
        match (original, original_node) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(expected), Some(node)) => {
                line_matches(doc, node, expected)
                    && in_position(
                        doc,
                        container,
                        translated_node,
                        node,
                        self.options.original_position,
                    )
            }
        }
    }
}

/// Overlay text with every injected node left out, trimmed.
pub fn clean_text(doc: &Document, container: NodeId) -> String {
    let text = match injected_selector() {
        Some(selector) => doc.text_content_excluding(container, selector),
        None => doc.text_content(container),
    };
    text.trim().to_string()
}

/// Detaches every injected node below `scope`. Returns how many were removed.
pub fn remove_injected(doc: &mut Document, scope: NodeId) -> Result<usize> {
    let injected = DETECTORS.injected.find_all(doc, scope);
    let mut removed = 0;
    for node in injected {
        // Nested injected nodes go with their injected ancestor.
        if doc.parent(node).is_some_and(|p| DETECTORS.injected.closest(doc, p).is_some()) {
            continue;
        }
        doc.remove(node)?;
        removed += 1;
    }
    Ok(removed)
}

fn find_child(doc: &Document, container: NodeId, class: &str) -> Option<NodeId> {
    doc.element_children(container)
        .into_iter()
        .find(|c| doc.has_class(*c, class))
}

fn line_matches(doc: &Document, node: NodeId, (text, font): (&str, &str)) -> bool {
    doc.text_content(node) == text && doc.style_property(node, "font-size").as_deref() == Some(font)
}

fn write_line(doc: &mut Document, node: NodeId, text: &str, font: &str) -> Result<()> {
    if doc.text_content(node) != text {
        doc.set_text_content(node, text)?;
    }
    doc.set_style_property(node, "font-size", font)?;
    Ok(())
}

fn in_position(
    doc: &Document,
    container: NodeId,
    translated: NodeId,
    original: NodeId,
    position: OriginalPosition,
) -> bool {
    let children = doc.children(container);
    let index_of = |id: NodeId| children.iter().position(|c| *c == id);
    match (index_of(translated), index_of(original)) {
        (Some(t), Some(o)) => match position {
            OriginalPosition::Above => o + 1 == t,
            OriginalPosition::Below => t + 1 == o,
        },
        _ => false,
    }
}

fn format_px(size: f32) -> String {
    let rounded = (size * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}px")
    } else {
        let text = format!("{rounded:.2}");
        format!("{}px", text.trim_end_matches('0'))
    }
}
