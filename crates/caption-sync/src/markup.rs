//! Batch markup exchanged with markup-capable providers.

use std::collections::BTreeMap;

use cue_host_dom::{Document, Selector, parse_fragment};
use cue_translate_interface::{CUE_INDEX_ATTR, SENTENCE_GROUP_ATTR};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::{Error, Result};

/// A sentence group as sent to the provider: its global index and the text of
/// each of its cues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMarkup {
    pub index: usize,
    pub fragments: Vec<String>,
}

/// Renders `<div data-sentence-group="N"><div data-cue-index="k">…</div></div>`
/// for every group, with `k` counted inside the group.
pub fn build_batch_markup(groups: &[GroupMarkup]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    for group in groups {
        let index = group.index.to_string();
        writer
            .write_event(Event::Start(
                BytesStart::new("div").with_attributes([(SENTENCE_GROUP_ATTR, index.as_str())]),
            ))
            .map_err(write_error)?;

        for (cue_index, fragment) in group.fragments.iter().enumerate() {
            let cue_index = cue_index.to_string();
            writer
                .write_event(Event::Start(
                    BytesStart::new("div").with_attributes([(CUE_INDEX_ATTR, cue_index.as_str())]),
                ))
                .map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::new(fragment.trim())))
                .map_err(write_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("div")))
                .map_err(write_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("div")))
            .map_err(write_error)?;
    }

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::MarkupWrite(e.to_string())
}

/// Reads a provider reply into `group index -> translation`, taking the text
/// of each group's first cue element. Groups with a missing or unparseable
/// index, or an empty translation, are left out.
pub fn parse_batch_reply(reply: &str) -> Result<BTreeMap<usize, String>> {
    let group_sel = Selector::parse(&format!("[{SENTENCE_GROUP_ATTR}]"))?;
    let cue_sel = Selector::parse(&format!("[{CUE_INDEX_ATTR}]"))?;

    let mut doc = Document::new();
    let root = doc.root();
    parse_fragment(&mut doc, root, reply)?;

    let mut translations = BTreeMap::new();
    for group in doc.query_selector_all(root, &group_sel) {
        let Some(index) = doc
            .attribute(group, SENTENCE_GROUP_ATTR)
            .and_then(|v| v.trim().parse::<usize>().ok())
        else {
            continue;
        };
        let Some(first_cue) = doc.query_selector(group, &cue_sel) else {
            continue;
        };
        let text = doc.text_content(first_cue).trim().to_string();
        if text.is_empty() {
            continue;
        }
        translations.entry(index).or_insert(text);
    }

    Ok(translations)
}
