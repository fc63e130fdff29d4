//! Decoded markup tree.

use std::collections::HashMap;

/// One decoded markup node.
///
/// Children keep node-table order; attribute iteration order is not
/// significant. `content` holds trimmed, non-empty text only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Tag name.
    pub tag: String,
    /// Attribute name -> value.
    pub attributes: HashMap<String, String>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
    /// Trimmed text content, if any.
    pub content: Option<String>,
}

impl XmlNode {
    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Total node count of this subtree, the node itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(XmlNode::subtree_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let node = XmlNode {
            tag: "root".into(),
            attributes: [("a".to_string(), "1".to_string())].into_iter().collect(),
            children: vec![
                XmlNode {
                    tag: "item".into(),
                    ..Default::default()
                },
                XmlNode {
                    tag: "item".into(),
                    ..Default::default()
                },
                XmlNode {
                    tag: "other".into(),
                    ..Default::default()
                },
            ],
            content: None,
        };

        assert_eq!(node.attr("a"), Some("1"));
        assert_eq!(node.attr("b"), None);
        assert_eq!(node.child("other").unwrap().tag, "other");
        assert_eq!(node.children_named("item").count(), 2);
        assert_eq!(node.subtree_len(), 4);
    }
}
