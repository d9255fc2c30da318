//! Cleanup for provider replies that do not follow the requested format.

use cue_host_dom::{Document, Selector, parse_fragment};
use cue_translate_interface::{CUE_INDEX_ATTR, SENTENCE_GROUP_ATTR};

/// Removes a surrounding markdown code fence (```` ``` ```` or ```` ```html ````)
/// that chat models sometimes add despite being told not to.
pub fn strip_code_fences(reply: &str) -> String {
    let mut out = reply.trim();

    if let Some(rest) = out.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(lang) if lang.eq_ignore_ascii_case("html") => &rest[4..],
            _ => rest,
        };
        out = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest.strip_suffix('\n').unwrap_or(rest);
    }

    out.trim().to_string()
}

/// Makes every cue of a sentence group carry the whole group's translation.
///
/// Machine translation services translate each cue element on its own, so a
/// group comes back as translated fragments. Joining them gives each cue the
/// complete sentence, which is what the batch protocol expects.
pub fn merge_group_fragments(markup: &str) -> String {
    let (Ok(group_sel), Ok(cue_sel)) = (
        Selector::parse(&format!("[{SENTENCE_GROUP_ATTR}]")),
        Selector::parse(&format!("[{CUE_INDEX_ATTR}]")),
    ) else {
        return markup.to_string();
    };

    let mut doc = Document::new();
    let root = doc.root();
    if let Err(error) = parse_fragment(&mut doc, root, markup) {
        tracing::warn!(error = %error, "group_markup_unparseable");
        return markup.to_string();
    }

    for group in doc.query_selector_all(root, &group_sel) {
        let cues = doc.query_selector_all(group, &cue_sel);
        if cues.is_empty() {
            continue;
        }
        let complete = cues
            .iter()
            .map(|cue| doc.text_content(*cue).trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        for cue in cues {
            if doc.set_text_content(cue, &complete).is_err() {
                return markup.to_string();
            }
        }
    }

    doc.inner_html(root)
}
