//! Markup re-emission.
//!
//! Indented XML output with escaping, for structural verification of decoded
//! trees. A byte-exact round trip with the original encoder is explicitly
//! not a goal.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{Error, Result, XmlNode};

impl XmlNode {
    /// Serialize this subtree as indented XML text.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_xml(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Serialize this subtree into a writer.
    pub fn write_xml<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml = Writer::new_with_indent(writer, b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;
        write_element(&mut xml, self)
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    let mut element = BytesStart::new(node.tag.as_str());

    // HashMap iteration order is arbitrary; sort for stable output.
    let mut attrs: Vec<(&String, &String)> = node.attributes.iter().collect();
    attrs.sort();
    for (name, value) in attrs {
        element.push_attribute((name.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.content.is_none() {
        return writer
            .write_event(Event::Empty(element))
            .map_err(|e| Error::Xml(e.to_string()));
    }

    writer
        .write_event(Event::Start(element))
        .map_err(|e| Error::Xml(e.to_string()))?;

    if let Some(content) = &node.content {
        writer
            .write_event(Event::Text(BytesText::new(content)))
            .map_err(|e| Error::Xml(e.to_string()))?;
    }

    for child in &node.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(|e| Error::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_indented_escaped_xml() {
        let node = XmlNode {
            tag: "item".into(),
            attributes: [("label".to_string(), "a<b&\"c\"".to_string())]
                .into_iter()
                .collect(),
            children: vec![XmlNode {
                tag: "note".into(),
                content: Some("x & y".into()),
                ..Default::default()
            }],
            content: None,
        };

        let xml = node.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("a&lt;b&amp;&quot;c&quot;"));
        assert!(xml.contains("x &amp; y"));
        assert!(xml.contains("<note>"));
        assert!(xml.contains("</item>"));
    }

    #[test]
    fn leaf_without_content_self_closes() {
        let node = XmlNode {
            tag: "empty".into(),
            ..Default::default()
        };
        assert!(node.to_xml_string().unwrap().contains("<empty/>"));
    }
}
