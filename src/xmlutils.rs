use std::cell::RefCell;
use std::rc::Rc;

use xml::attribute::OwnedAttribute;
use xml::name::OwnedName;
use xml::reader::{EventReader, ParserConfig, XmlEvent};

// Using RefCell because we need to edit the children vec during the parsing.
pub type ChildNodeRef = Rc<RefCell<XMLNode>>;

#[derive(Debug, thiserror::Error)]
pub enum XMLError {
    #[error("XML Reader Error: {0}")]
    Reader(#[from] xml::reader::Error),
    #[error("The document has no root element")]
    NoElement,
}

pub struct XMLReader;

impl XMLReader {
    fn reader(content: &[u8]) -> EventReader<&[u8]> {
        ParserConfig::new()
            .add_entity("nbsp", " ")
            .add_entity("copy", "©")
            .add_entity("reg", "®")
            .allow_multiple_root_elements(false)
            .create_reader(content)
    }

    /// Reads the whole document, keeping nothing.
    pub fn check(content: &[u8]) -> Result<(), XMLError> {
        let mut seen_root = false;
        for e in Self::reader(content) {
            if let XmlEvent::StartElement { .. } = e? {
                seen_root = true;
            }
        }
        if seen_root {
            Ok(())
        } else {
            Err(XMLError::NoElement)
        }
    }

    pub fn parse(content: &[u8]) -> Result<ChildNodeRef, XMLError> {
        let reader = Self::reader(content);

        let mut root: Option<ChildNodeRef> = None;
        let mut parents: Vec<ChildNodeRef> = vec![];

        for e in reader {
            match e? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let node = Rc::new(RefCell::new(XMLNode {
                        name,
                        attrs: attributes,
                        text: None,
                        children: vec![],
                    }));

                    if let Some(parent) = parents.last() {
                        parent.borrow_mut().children.push(Rc::clone(&node));
                    }
                    if root.is_none() {
                        root = Some(Rc::clone(&node));
                    }
                    parents.push(node);
                }
                XmlEvent::EndElement { .. } => {
                    parents.pop();
                }
                XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                    if let Some(current) = parents.last() {
                        current
                            .borrow_mut()
                            .text
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
                _ => continue,
            }
        }

        root.ok_or(XMLError::NoElement)
    }
}

#[derive(Debug)]
pub struct XMLNode {
    pub name: OwnedName,
    pub attrs: Vec<OwnedAttribute>,
    pub text: Option<String>,
    pub children: Vec<ChildNodeRef>,
}

impl XMLNode {
    pub fn get_attr(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|attr| attr.name.local_name == name)
            .map(|attr| attr.value.clone())
    }

    /// Whether this element is `tag` in the namespace `ns`.
    pub fn is(&self, ns: &str, tag: &str) -> bool {
        self.name.local_name == tag && self.name.namespace.as_deref() == Some(ns)
    }

    /// First descendant named `tag` in the namespace `ns`, depth first.
    pub fn find(&self, ns: &str, tag: &str) -> Option<ChildNodeRef> {
        for c in &self.children {
            if c.borrow().is(ns, tag) {
                return Some(Rc::clone(c));
            }
            if let Some(n) = c.borrow().find(ns, tag) {
                return Some(n);
            }
        }
        None
    }

    /// Every descendant named `tag` in the namespace `ns`, in document order.
    pub fn find_all(&self, ns: &str, tag: &str) -> Vec<ChildNodeRef> {
        let mut found = vec![];
        self.collect(ns, tag, &mut found);
        found
    }

    fn collect(&self, ns: &str, tag: &str, found: &mut Vec<ChildNodeRef>) {
        for c in &self.children {
            if c.borrow().is(ns, tag) {
                found.push(Rc::clone(c));
            }
            c.borrow().collect(ns, tag, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[test]
    fn finds_nested_elements_by_namespace() {
        let doc = br#"<root xmlns="urn:test" xmlns:o="urn:other">
            <a><item id="1"/></a>
            <o:item id="ignored"/>
            <item id="2">some&nbsp;text</item>
        </root>"#;
        let root = XMLReader::parse(doc).unwrap();
        let items = root.borrow().find_all(NS, "item");
        let ids: Vec<_> = items
            .iter()
            .filter_map(|i| i.borrow().get_attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(items[1].borrow().text.as_deref(), Some("some text"));
        assert!(root.borrow().find(NS, "a").is_some());
        assert!(root.borrow().find(NS, "missing").is_none());
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(matches!(
            XMLReader::parse(b"<root><open></root>"),
            Err(XMLError::Reader(_))
        ));
        assert!(XMLReader::parse(b"").is_err());
    }

    #[test]
    fn check_rejects_a_second_root() {
        assert!(XMLReader::check(b"<a/>").is_ok());
        assert!(XMLReader::check(b"<a/><b/>").is_err());
        assert!(XMLReader::check(b"<a/>tail").is_err());
    }
}
