use std::borrow::Cow;

use crate::node::{Node, NodeData};
use crate::observer::ObserverRegistry;
use crate::{
    Error, MutationKind, MutationRecord, NodeId, ObserveOptions, ObserverId, Result, Selector,
};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// User interaction recorded by the document, drained by whoever drives the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Click(NodeId),
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    observers: ObserverRegistry,
    events: Vec<DomEvent>,
    mutation_count: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::element("html")],
            root: NodeId(0),
            observers: ObserverRegistry::default(),
            events: Vec::new(),
            mutation_count: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of mutations applied since the document was created.
    pub fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(Error::UnknownNode(id))
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node::element(tag));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.push(Node::text(text));
        NodeId(self.nodes.len() - 1)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .ok()
            .and_then(|n| n.as_element())
            .map(|el| el.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Inclusive ancestor chain, starting with `id`.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.node(id).ok().map(|_| id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.parent(current);
        }
        chain
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        self.mutation_count += 1;
        let ancestors = self.ancestors(target);
        self.observers
            .deliver(&MutationRecord { target, kind }, &ancestors);
    }

    fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(old_parent) = self.node(child)?.parent else {
            return Ok(());
        };
        self.node_mut(old_parent)?.children.retain(|c| *c != child);
        self.node_mut(child)?.parent = None;
        self.record(old_parent, MutationKind::ChildList);
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.node(parent)?.as_element().is_none() {
            return Err(Error::NotAnElement);
        }
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(Error::HierarchyRequest);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    /// Inserts `child` before `reference`, or appends it when `reference` is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        if reference == child {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(Error::NotAChild);
        }
        self.detach(child)?;
        let node = self.node_mut(parent)?;
        let index = node
            .children
            .iter()
            .position(|c| *c == reference)
            .ok_or(Error::NotAChild)?;
        node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    /// Inserts `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(Error::NotAChild)?;
        let next = self
            .children(parent)
            .iter()
            .skip_while(|c| **c != reference)
            .nth(1)
            .copied();
        self.insert_before(parent, node, next)
    }

    /// Detaches `id` from its parent. Detached nodes stay addressable.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)
    }

    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        if children.is_empty() {
            return Ok(());
        }
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.record(id, MutationKind::ChildList);
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).ok()?.as_element()?.attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let el = self.node_mut(id)?.as_element_mut().ok_or(Error::NotAnElement)?;
        match el.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name.clone(), value.to_string())),
        }
        self.record(id, MutationKind::Attributes { name });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<()> {
        let el = self.node_mut(id)?.as_element_mut().ok_or(Error::NotAnElement)?;
        let before = el.attrs.len();
        el.attrs.retain(|(k, _)| k != name);
        if el.attrs.len() != before {
            self.record(
                id,
                MutationKind::Attributes {
                    name: name.to_string(),
                },
            );
        }
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id)
            .ok()
            .and_then(|n| n.as_element())
            .is_some_and(|el| el.classes().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &value)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let value = self
            .attribute(id, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &value)
    }

    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) -> Result<()> {
        if on {
            self.add_class(id, class)
        } else {
            self.remove_class(id, class)
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, None, &mut out);
        out
    }

    /// Text content that skips every element subtree matching `exclude`.
    pub fn text_content_excluding(&self, id: NodeId, exclude: &Selector) -> String {
        let mut out = String::new();
        self.collect_text(id, Some(exclude), &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, exclude: Option<&Selector>, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(el) => {
                if exclude.is_some_and(|s| s.matches_element(el)) {
                    return;
                }
                for child in &node.children {
                    self.collect_text(*child, exclude, out);
                }
            }
        }
    }

    /// Replaces the children of an element with a single text node, or rewrites
    /// the data of a text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        if let NodeData::Text(data) = &mut self.node_mut(id)?.data {
            *data = text.to_string();
            self.record(id, MutationKind::CharacterData);
            return Ok(());
        }

        let old = std::mem::take(&mut self.node_mut(id)?.children);
        for child in old {
            self.node_mut(child)?.parent = None;
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.node_mut(node)?.parent = Some(id);
            self.node_mut(id)?.children.push(node);
        }
        self.record(id, MutationKind::ChildList);
        Ok(())
    }

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.node(id)
            .ok()
            .and_then(|n| n.as_element())
            .is_some_and(|el| selector.matches_element(el))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.matches(*id, selector))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.matches(*id, selector))
            .collect()
    }

    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.ancestors(id)
            .into_iter()
            .find(|a| self.matches(*a, selector))
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(element_id))
    }

    pub fn click(&mut self, id: NodeId) {
        self.events.push(DomEvent::Click(id));
    }

    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        self.observers.register(target, options)
    }

    /// Stops delivery and drops queued records. Calling it twice is harmless.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.disconnect(observer);
    }

    pub fn is_observing(&self, observer: ObserverId) -> bool {
        self.observers.is_connected(observer)
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take(observer)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(&escape(text)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push_str(&format!(" {name}=\"{}\"", escape(value)));
                }
                out.push('>');
                if is_void(&el.tag) {
                    return;
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
        }
    }
}

fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_tree_operations() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.create_element("ul");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        let c = doc.create_element("li");

        doc.append_child(root, list).unwrap();
        doc.append_child(list, a).unwrap();
        doc.append_child(list, c).unwrap();
        doc.insert_after(a, b).unwrap();
        assert_eq!(doc.children(list), &[a, b, c]);

        doc.remove(b).unwrap();
        assert_eq!(doc.children(list), &[a, c]);
        assert!(!doc.is_connected(b));
        assert!(doc.is_connected(c));

        assert!(matches!(
            doc.append_child(a, list),
            Err(Error::HierarchyRequest)
        ));
        let text = doc.create_text("x");
        assert!(matches!(doc.append_child(text, a), Err(Error::NotAnElement)));
    }

    #[test]
    fn test_class_helpers_and_queries() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.add_class(inner, "cue").unwrap();
        doc.add_class(inner, "active").unwrap();
        doc.add_class(inner, "active").unwrap();
        assert_eq!(doc.attribute(inner, "class"), Some("cue active"));

        assert_eq!(doc.query_selector(root, &sel(".cue.active")), Some(inner));
        assert_eq!(doc.closest(inner, &sel("div")), Some(outer));

        doc.toggle_class(inner, "active", false).unwrap();
        assert_eq!(doc.attribute(inner, "class"), Some("cue"));
        assert_eq!(doc.query_selector(root, &sel(".active")), None);
    }

    #[test]
    fn test_text_content_excluding() {
        let mut doc = Document::new();
        let root = doc.root();
        let overlay = doc.create_element("div");
        let injected = doc.create_element("div");
        doc.append_child(root, overlay).unwrap();
        let host_text = doc.create_text("host line");
        doc.append_child(overlay, host_text).unwrap();
        doc.append_child(overlay, injected).unwrap();
        doc.add_class(injected, "injected").unwrap();
        doc.set_text_content(injected, "ours").unwrap();

        assert_eq!(doc.text_content(overlay), "host lineours");
        assert_eq!(
            doc.text_content_excluding(overlay, &sel(".injected")),
            "host line"
        );
    }

    #[test]
    fn test_observer_filters_and_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let panel = doc.create_element("div");
        let cue = doc.create_element("p");
        doc.append_child(root, panel).unwrap();
        doc.append_child(panel, cue).unwrap();

        let observer = doc.observe(
            panel,
            ObserveOptions {
                child_list: true,
                subtree: true,
                attributes: true,
                attribute_filter: Some(vec!["aria-current".into()]),
                ..Default::default()
            },
        );

        doc.set_attribute(cue, "aria-current", "true").unwrap();
        doc.set_attribute(cue, "title", "ignored").unwrap();
        doc.set_text_content(cue, "hello").unwrap();

        let records = doc.take_records(observer);
        assert_eq!(
            records,
            vec![
                MutationRecord {
                    target: cue,
                    kind: MutationKind::Attributes {
                        name: "aria-current".into()
                    }
                },
                MutationRecord {
                    target: cue,
                    kind: MutationKind::ChildList
                },
            ]
        );
        assert!(doc.take_records(observer).is_empty());

        doc.disconnect(observer);
        doc.disconnect(observer);
        doc.set_attribute(cue, "aria-current", "false").unwrap();
        assert!(doc.take_records(observer).is_empty());
        assert!(!doc.is_observing(observer));
    }

    #[test]
    fn test_outer_html_escapes() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "data-x", "a\"b").unwrap();
        doc.set_text_content(div, "1 < 2").unwrap();
        assert_eq!(
            doc.outer_html(div),
            "<div data-x=\"a&quot;b\">1 &lt; 2</div>"
        );
    }
}
