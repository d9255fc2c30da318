/// Handle to a node inside a [`crate::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn element(tag: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            }),
        }
    }

    pub(crate) fn text(text: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data: NodeData::Text(text.to_string()),
        }
    }

    pub(crate) fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }
}
