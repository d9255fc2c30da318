//! Reading and annotating transcript cues.

use cue_host_dom::{Document, NodeId};

use crate::constants::{attr, class};
use crate::detect::DETECTORS;
use crate::Result;

/// One caption fragment exposed by the host. Holds node handles only; the
/// nodes may be detached at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cue {
    pub node: NodeId,
    pub text_node: NodeId,
    pub order: usize,
}

/// Transcript cues in document order. Cues without a text element are skipped.
pub fn collect_cues(doc: &Document, panel: NodeId) -> Vec<Cue> {
    DETECTORS
        .cue
        .find_all(doc, panel)
        .into_iter()
        .filter_map(|node| {
            let text_node = DETECTORS.cue_text.find(doc, node)?;
            Some((node, text_node))
        })
        .enumerate()
        .map(|(order, (node, text_node))| Cue {
            node,
            text_node,
            order,
        })
        .collect()
}

/// The cue's untranslated text. The preserved original wins over whatever is
/// displayed, so a second pass never merges translated text.
pub fn source_text(doc: &Document, cue: &Cue) -> String {
    match doc.attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT) {
        Some(original) => original.to_string(),
        None => doc.text_content(cue.text_node),
    }
}

/// Records the displayed text as the original unless one was recorded already.
pub fn preserve_original(doc: &mut Document, cue: &Cue) -> Result<()> {
    if doc.has_attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT) {
        return Ok(());
    }
    let text = doc.text_content(cue.text_node);
    doc.set_attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT, &text)?;
    Ok(())
}

/// Replaces the cue text with the translation, followed by the original when
/// `show_original` is set. Returns `false` when the cue is no longer attached.
pub fn annotate(doc: &mut Document, cue: &Cue, translation: &str, show_original: bool) -> Result<bool> {
    if !doc.is_connected(cue.text_node) {
        return Ok(false);
    }

    preserve_original(doc, cue)?;
    let original = doc
        .attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT)
        .unwrap_or_default()
        .to_string();

    doc.clear_children(cue.text_node)?;

    let translated = doc.create_element("div");
    doc.add_class(translated, class::CUE_TRANSLATION)?;
    doc.set_text_content(translated, translation)?;
    doc.append_child(cue.text_node, translated)?;

    if show_original && !original.trim().is_empty() {
        let original_node = doc.create_element("div");
        doc.add_class(original_node, class::CUE_ORIGINAL)?;
        doc.set_text_content(original_node, &original)?;
        doc.append_child(cue.text_node, original_node)?;
    }

    Ok(true)
}

pub fn is_annotated(doc: &Document, cue: &Cue) -> bool {
    doc.element_children(cue.text_node)
        .into_iter()
        .any(|c| doc.has_class(c, class::CUE_TRANSLATION))
}

/// Puts the preserved original text back and drops the marker attribute.
pub fn restore(doc: &mut Document, cue: &Cue) -> Result<()> {
    let Some(original) = doc
        .attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT)
        .map(str::to_string)
    else {
        return Ok(());
    };
    doc.set_text_content(cue.text_node, &original)?;
    doc.remove_attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT)?;
    Ok(())
}

/// Restores every cue of `panel`, returning how many were touched.
pub fn restore_all(doc: &mut Document, panel: NodeId) -> Result<usize> {
    let mut restored = 0;
    for cue in collect_cues(doc, panel) {
        if doc.has_attribute(cue.text_node, attr::DATA_ORIGINAL_TEXT) {
            restore(doc, &cue)?;
            restored += 1;
        }
    }
    Ok(restored)
}
