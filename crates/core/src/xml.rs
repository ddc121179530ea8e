//! XML → normalized key/value tree.
//!
//! Attributes and child elements land in the same mapping. A key seen once holds
//! [`Entry::Single`]; a repeated key is promoted to [`Entry::Many`] in document
//! order. Text nodes are stored under `text` (the `#text` pseudo-tag with its
//! marker stripped), CDATA sections under `cdata-section`.

use std::collections::BTreeMap;

use quick_xml::{Reader, events::BytesStart, events::Event};
use serde::Serialize;

use crate::error::{ElisumError, Result};

const TEXT_NODE: &str = "#text";
const CDATA_NODE: &str = "#cdata-section";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedNode {
    Text(String),
    Map(BTreeMap<String, Entry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Single(NormalizedNode),
    Many(Vec<NormalizedNode>),
}

impl NormalizedNode {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedNode::Text(text) => Some(text),
            NormalizedNode::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Entry>> {
        match self {
            NormalizedNode::Map(map) => Some(map),
            NormalizedNode::Text(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Follow a path of keys through `Single` entries.
    pub fn at(&self, path: &[&str]) -> Option<&NormalizedNode> {
        path.iter().try_fold(self, |node, key| node.get(key)?.as_single())
    }
}

impl Entry {
    pub fn as_single(&self) -> Option<&NormalizedNode> {
        match self {
            Entry::Single(node) => Some(node),
            Entry::Many(_) => None,
        }
    }

    /// Iterate both shapes uniformly.
    pub fn nodes(&self) -> std::slice::Iter<'_, NormalizedNode> {
        match self {
            Entry::Single(node) => std::slice::from_ref(node).iter(),
            Entry::Many(nodes) => nodes.iter(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Entry::Single(_) => 1,
            Entry::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, node: NormalizedNode) {
        match self {
            Entry::Many(nodes) => nodes.push(node),
            Entry::Single(existing) => {
                let existing = std::mem::replace(existing, NormalizedNode::Text(String::new()));
                *self = Entry::Many(vec![existing, node]);
            }
        }
    }
}

/// Strip the synthetic-node marker: `#text` → `text`.
fn node_key(name: &str) -> &str {
    name.strip_prefix('#').unwrap_or(name)
}

fn insert_child(map: &mut BTreeMap<String, Entry>, name: &str, node: NormalizedNode) {
    let key = node_key(name);
    match map.get_mut(key) {
        Some(entry) => entry.push(node),
        None => {
            map.insert(key.to_string(), Entry::Single(node));
        }
    }
}

struct OpenElement {
    name: String,
    has_attributes: bool,
    map: BTreeMap<String, Entry>,
}

impl OpenElement {
    fn start(element: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let mut map = BTreeMap::new();
        let mut has_attributes = false;

        for attribute in element.attributes() {
            let attribute = attribute
                .map_err(|e| ElisumError::malformed(format!("bad attribute on <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            insert_child(&mut map, &key, NormalizedNode::Text(value));
            has_attributes = true;
        }

        Ok(Self {
            name,
            has_attributes,
            map,
        })
    }

    /// An attribute-less element whose only content is one text node becomes that text.
    fn finish(mut self) -> (String, NormalizedNode) {
        let text_only = !self.has_attributes
            && self.map.len() == 1
            && matches!(
                self.map.get("text"),
                Some(Entry::Single(NormalizedNode::Text(_)))
            );
        if text_only {
            if let Some(Entry::Single(text)) = self.map.remove("text") {
                return (self.name, text);
            }
        }
        (self.name, NormalizedNode::Map(self.map))
    }
}

/// Parse an XML document and normalize it. The document node is a mapping holding
/// the root element under its tag name.
pub fn normalize_xml(xml: &str) -> Result<NormalizedNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut document: BTreeMap<String, Entry> = BTreeMap::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(OpenElement::start(e)?),
            Event::Empty(ref e) => {
                let (name, node) = OpenElement::start(e)?.finish();
                attach(&mut stack, &mut document, &name, node)?;
            }
            Event::End(_) => {
                let Some(open) = stack.pop() else {
                    return Err(ElisumError::malformed("closing tag without an open element"));
                };
                let (name, node) = open.finish();
                attach(&mut stack, &mut document, &name, node)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.into_owned();
                match stack.last_mut() {
                    Some(parent) => {
                        insert_child(&mut parent.map, TEXT_NODE, NormalizedNode::Text(text))
                    }
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(ElisumError::malformed(
                            "text content outside the root element",
                        ));
                    }
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                let Some(parent) = stack.last_mut() else {
                    return Err(ElisumError::malformed("CDATA outside the root element"));
                };
                insert_child(&mut parent.map, CDATA_NODE, NormalizedNode::Text(text));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes are not tree nodes.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ElisumError::malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    if document.is_empty() {
        return Err(ElisumError::malformed("document has no root element"));
    }

    Ok(NormalizedNode::Map(document))
}

fn attach(
    stack: &mut [OpenElement],
    document: &mut BTreeMap<String, Entry>,
    name: &str,
    node: NormalizedNode,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.map, name, node),
        None if document.is_empty() => insert_child(document, name, node),
        None => return Err(ElisumError::malformed("more than one root element")),
    }
    Ok(())
}
