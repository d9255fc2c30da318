use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::is_void;
use crate::{Document, Error, NodeId, Result};

fn resolve_entity(entity: &str) -> Option<char> {
    if let Some(code) = entity.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value);
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "copy" => '\u{a9}',
        _ => return None,
    })
}

/// Resolves each entity on its own. An unknown entity or a bare `&` stays
/// literal, as in HTML.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = tail.find(';').and_then(|end| {
            let name = &tail[..end];
            let well_formed = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
            well_formed
                .then(|| resolve_entity(name))
                .flatten()
                .map(|c| (c, end + 1))
        });
        match resolved {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes every `<` that cannot open a tag, so `a < b` stays text the way
/// an HTML parser reads it.
fn escape_stray_lt(markup: &str) -> Cow<'_, str> {
    let bytes = markup.as_bytes();
    let opens_tag = |i: usize| {
        bytes
            .get(i + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
    };

    let mut out = String::new();
    let mut last = 0;
    for (i, _) in markup.match_indices('<').filter(|(i, _)| !opens_tag(*i)) {
        out.push_str(&markup[last..i]);
        out.push_str("&lt;");
        last = i + 1;
    }
    if last == 0 {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[last..]);
    Cow::Owned(out)
}

fn is_inline(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "cite"
            | "code"
            | "em"
            | "font"
            | "i"
            | "kbd"
            | "mark"
            | "q"
            | "s"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "u"
            | "var"
    )
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase()
}

fn create_element(doc: &mut Document, start: &BytesStart<'_>) -> Result<NodeId> {
    let node = doc.create_element(&tag_name(start));
    for attr in start.html_attributes().with_checks(false).flatten() {
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        doc.set_attribute(node, &name, &value)?;
    }
    Ok(node)
}

/// Whether whitespace after the last child of `parent` separates inline content.
fn follows_inline(doc: &Document, parent: NodeId) -> bool {
    doc.children(parent)
        .last()
        .is_some_and(|&last| doc.tag_name(last).is_none_or(is_inline))
}

/// Parses `markup` and appends the resulting nodes to `parent`, returning the
/// top-level nodes that were created.
///
/// The parser is lenient in the ways real pages and model replies need: void
/// elements need no closing tag, mismatched closing tags close the nearest
/// matching open element or are ignored, and a stray `<` is text. Whitespace
/// between inline siblings becomes one space. Other whitespace-only text is
/// dropped.
pub fn parse_fragment(doc: &mut Document, parent: NodeId, markup: &str) -> Result<Vec<NodeId>> {
    let markup = escape_stray_lt(markup);
    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack: Vec<(String, NodeId)> = Vec::new();
    let mut top_level = Vec::new();
    // Whitespace seen after inline content, kept only if inline content follows.
    let mut pending_space: Option<NodeId> = None;

    loop {
        let event = reader.read_event().map_err(|e| Error::Markup {
            position: reader.error_position(),
            message: e.to_string(),
        })?;

        let current = stack.last().map(|(_, id)| *id).unwrap_or(parent);
        let space_before = pending_space.take().filter(|&p| p == current);
        let mut push = |doc: &mut Document, node: NodeId| -> Result<()> {
            doc.append_child(current, node)?;
            if stack.is_empty() {
                top_level.push(node);
            }
            Ok(())
        };

        match event {
            Event::Eof => break,
            Event::Start(start) => {
                let tag = tag_name(&start);
                if space_before.is_some() && is_inline(&tag) {
                    let space = doc.create_text(" ");
                    push(doc, space)?;
                }
                let node = create_element(doc, &start)?;
                push(doc, node)?;
                if !is_void(&tag) {
                    stack.push((tag, node));
                }
            }
            Event::Empty(start) => {
                if space_before.is_some() && is_inline(&tag_name(&start)) {
                    let space = doc.create_text(" ");
                    push(doc, space)?;
                }
                let node = create_element(doc, &start)?;
                push(doc, node)?;
            }
            Event::End(end) => {
                let tag = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if let Some(index) = stack.iter().rposition(|(t, _)| *t == tag) {
                    stack.truncate(index);
                }
            }
            Event::Text(text) => {
                let value = decode_entities(&String::from_utf8_lossy(&text));
                if value.trim().is_empty() {
                    if follows_inline(doc, current) {
                        pending_space = Some(current);
                    }
                    continue;
                }
                let node = doc.create_text(&value);
                push(doc, node)?;
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                let node = doc.create_text(&value);
                push(doc, node)?;
            }
            _ => {}
        }
    }

    Ok(top_level)
}

impl Document {
    /// Builds a document whose root holds the parsed `markup`.
    pub fn parse(markup: &str) -> Result<Self> {
        let mut doc = Self::new();
        let root = doc.root();
        parse_fragment(&mut doc, root, markup)?;
        Ok(doc)
    }
}
