//! A small selector language covering what the caption detectors need:
//! comma-separated compound selectors made of an optional tag name, `#id`,
//! `.class` and attribute tests (`[a]`, `[a=v]`, `[a*=v]`, `[a~=v]`,
//! `[a^=v]`, `[a$=v]`). Combinators are rejected.

use std::str::FromStr;

use crate::node::Element;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
}

impl AttrTest {
    fn matches(&self, el: &Element) -> bool {
        let Some(value) = el.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
            AttrOp::Includes(v) => value.split_ascii_whitespace().any(|w| w == v),
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if self.tag.as_ref().is_some_and(|tag| *tag != el.tag) {
            return false;
        }
        if self
            .id
            .as_ref()
            .is_some_and(|id| el.attr("id") != Some(id.as_str()))
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.classes().any(|ec| ec == c)) {
            return false;
        }
        self.attrs.iter().all(|a| a.matches(el))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidSelector {
            selector: source.to_string(),
            reason,
        };

        let alternatives = split_top_level(source)
            .into_iter()
            .map(|part| parse_compound(part.trim()).map_err(invalid))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches_element(&self, el: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(el))
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&ch) = chars.peek() {
        if !is_ident_char(ch) {
            break;
        }
        out.push(ch);
        chars.next();
    }
    out
}

fn parse_compound(part: &str) -> std::result::Result<Compound, &'static str> {
    if part.is_empty() {
        return Err("empty selector");
    }

    let mut compound = Compound::default();
    let mut chars = part.chars().peekable();

    if chars.peek() == Some(&'*') {
        chars.next();
    } else if chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let id = take_ident(&mut chars);
                if id.is_empty() {
                    return Err("expected an id after '#'");
                }
                compound.id = Some(id);
            }
            '.' => {
                let class = take_ident(&mut chars);
                if class.is_empty() {
                    return Err("expected a class name after '.'");
                }
                compound.classes.push(class);
            }
            '[' => compound.attrs.push(parse_attr(&mut chars)?),
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err("combinators are not supported");
            }
            _ => return Err("unexpected character"),
        }
    }

    Ok(compound)
}

fn parse_attr(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> std::result::Result<AttrTest, &'static str> {
    let name = take_ident(chars).to_ascii_lowercase();
    if name.is_empty() {
        return Err("expected an attribute name");
    }

    let modifier = match chars.peek() {
        Some(&c @ ('*' | '~' | '^' | '$')) => {
            chars.next();
            Some(c)
        }
        _ => None,
    };

    match chars.next() {
        Some(']') if modifier.is_none() => {
            return Ok(AttrTest {
                name,
                op: AttrOp::Exists,
            });
        }
        Some('=') => {}
        _ => return Err("malformed attribute test"),
    }

    let value = match chars.peek() {
        Some(&q @ ('"' | '\'')) => {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == q => break,
                    Some(c) => value.push(c),
                    None => return Err("unterminated string"),
                }
            }
            value
        }
        _ => take_ident(chars),
    };

    if chars.next() != Some(']') {
        return Err("expected ']'");
    }

    let op = match modifier {
        None => AttrOp::Equals(value),
        Some('*') => AttrOp::Contains(value),
        Some('~') => AttrOp::Includes(value),
        Some('^') => AttrOp::Prefix(value),
        Some(_) => AttrOp::Suffix(value),
    };

    Ok(AttrTest { name, op })
}
