use crate::{Document, NodeId, Result};

const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let (name, value) = (name.trim(), value.trim());
        (!name.is_empty()).then_some((name, value))
    })
}

fn parse_px(value: &str) -> Option<f32> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

impl Document {
    /// Reads a property from the inline `style` attribute.
    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attribute(id, "style")?;
        declarations(style)
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .last()
            .map(|(_, v)| v.to_string())
    }

    /// Writes a property into the inline `style` attribute. An empty value
    /// removes the property.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let current = self.attribute(id, "style").unwrap_or("");
        let mut decls: Vec<(String, String)> = declarations(current)
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        match decls.iter().position(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(index) if value.is_empty() => {
                decls.remove(index);
            }
            Some(index) => decls[index].1 = value.to_string(),
            None if value.is_empty() => {}
            None => decls.push((name.to_string(), value.to_string())),
        }

        let serialized = decls
            .iter()
            .map(|(n, v)| format!("{n}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        if self.attribute(id, "style").unwrap_or("") == serialized {
            return Ok(());
        }
        if serialized.is_empty() {
            self.remove_attribute(id, "style")
        } else {
            self.set_attribute(id, "style", &serialized)
        }
    }

    /// Resolved font size in pixels: the closest inline `font-size` in pixels on
    /// the node or its ancestors, or the user-agent default.
    pub fn computed_font_size(&self, id: NodeId) -> f32 {
        self.ancestors(id)
            .into_iter()
            .find_map(|a| {
                self.style_property(a, "font-size")
                    .as_deref()
                    .and_then(parse_px)
            })
            .unwrap_or(DEFAULT_FONT_SIZE_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_roundtrip_and_inheritance() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert_eq!(doc.computed_font_size(inner), 16.0);

        doc.set_style_property(outer, "font-size", "20px").unwrap();
        doc.set_style_property(outer, "color", "white").unwrap();
        assert_eq!(doc.style_property(outer, "font-size").as_deref(), Some("20px"));
        assert_eq!(doc.computed_font_size(inner), 20.0);

        let before = doc.mutation_count();
        doc.set_style_property(outer, "color", "white").unwrap();
        assert_eq!(doc.mutation_count(), before);

        doc.set_style_property(outer, "font-size", "").unwrap();
        doc.set_style_property(outer, "color", "").unwrap();
        assert_eq!(doc.attribute(outer, "style"), None);
    }
}
