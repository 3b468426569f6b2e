//! Document tree types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to another node, serialized as `{"$ref": "#/texts/0"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    #[serde(rename = "$ref")]
    pub cref: String,
}

impl NodeRef {
    /// Create a reference from a JSON pointer.
    pub fn new(cref: impl Into<String>) -> Self {
        Self { cref: cref.into() }
    }

    /// Split the pointer into collection name and optional index.
    ///
    /// `#/texts/3` → `("texts", Some(3))`, `#/body` → `("body", None)`.
    pub fn target(&self) -> Option<(&str, Option<usize>)> {
        let path = self.cref.strip_prefix("#/")?;
        let mut parts = path.splitn(2, '/');
        let collection = parts.next().filter(|c| !c.is_empty())?;
        match parts.next() {
            None => Some((collection, None)),
            Some(index) => index.parse().ok().map(|i| (collection, Some(i))),
        }
    }
}

/// Which layer of the page a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentLayer {
    #[default]
    Body,
    Furniture,
    Background,
    Invisible,
    Notes,
}

/// Where the document came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOrigin {
    pub mimetype: String,
    #[serde(default)]
    pub binary_hash: u64,
    pub filename: String,
    #[serde(default)]
    pub uri: Option<String>,
}

/// A container node: the body and furniture roots, and every entry of `groups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupItem {
    pub self_ref: String,
    #[serde(default)]
    pub parent: Option<NodeRef>,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default = "default_group_name")]
    pub name: String,
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_group_name() -> String {
    "group".to_string()
}

fn default_label() -> String {
    "unspecified".to_string()
}

impl GroupItem {
    fn root(self_ref: &str, layer: ContentLayer) -> Self {
        Self {
            self_ref: self_ref.to_string(),
            parent: None,
            children: Vec::new(),
            content_layer: layer,
            name: "_root_".to_string(),
            label: default_label(),
        }
    }

    /// Empty `#/body` root.
    pub fn body_root() -> Self {
        Self::root("#/body", ContentLayer::Body)
    }

    /// Empty `#/furniture` root.
    pub fn furniture_root() -> Self {
        Self::root("#/furniture", ContentLayer::Furniture)
    }
}

/// A text leaf (paragraph, heading, caption, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub self_ref: String,
    #[serde(default)]
    pub parent: Option<NodeRef>,
    #[serde(default)]
    pub children: Vec<NodeRef>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub orig: String,
    pub text: String,
}

/// A resolved node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeItem<'a> {
    Group(&'a GroupItem),
    Text(&'a TextItem),
    Opaque(&'a Value),
}

/// A validated Docling document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoclingDocument {
    pub schema_name: String,
    pub version: String,
    #[serde(default = "default_document_name")]
    pub name: String,
    #[serde(default)]
    pub origin: Option<DocumentOrigin>,
    #[serde(default = "GroupItem::body_root")]
    pub body: GroupItem,
    #[serde(default = "GroupItem::furniture_root")]
    pub furniture: GroupItem,
    #[serde(default)]
    pub groups: Vec<GroupItem>,
    #[serde(default)]
    pub texts: Vec<TextItem>,
    #[serde(default)]
    pub tables: Vec<Value>,
    #[serde(default)]
    pub pictures: Vec<Value>,
    #[serde(default)]
    pub key_value_items: Vec<Value>,
    #[serde(default)]
    pub pages: BTreeMap<String, Value>,
}

fn default_document_name() -> String {
    "untitled".to_string()
}

impl DoclingDocument {
    /// Whether the body has any children.
    pub fn has_body_content(&self) -> bool {
        !self.body.children.is_empty()
    }

    /// Total number of content nodes outside the two roots.
    pub fn node_count(&self) -> usize {
        self.groups.len()
            + self.texts.len()
            + self.tables.len()
            + self.pictures.len()
            + self.key_value_items.len()
    }

    /// Look up the node a reference points at.
    pub fn resolve(&self, node: &NodeRef) -> Option<NodeItem<'_>> {
        match node.target()? {
            ("body", None) => Some(NodeItem::Group(&self.body)),
            ("furniture", None) => Some(NodeItem::Group(&self.furniture)),
            ("groups", Some(i)) => self.groups.get(i).map(NodeItem::Group),
            ("texts", Some(i)) => self.texts.get(i).map(NodeItem::Text),
            ("tables", Some(i)) => self.tables.get(i).map(NodeItem::Opaque),
            ("pictures", Some(i)) => self.pictures.get(i).map(NodeItem::Opaque),
            ("key_value_items", Some(i)) => self.key_value_items.get(i).map(NodeItem::Opaque),
            _ => None,
        }
    }

    /// Body text in reading order, following children depth-first.
    pub fn body_text(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_text(&self.body.children, &mut out, 0);
        out
    }

    fn collect_text<'a>(&'a self, children: &[NodeRef], out: &mut Vec<&'a str>, depth: usize) {
        // Guard against reference cycles in hand-edited files.
        if depth > 64 {
            return;
        }
        for child in children {
            match self.resolve(child) {
                Some(NodeItem::Text(text)) => {
                    out.push(text.text.as_str());
                    self.collect_text(&text.children, out, depth + 1);
                }
                Some(NodeItem::Group(group)) => self.collect_text(&group.children, out, depth + 1),
                _ => {}
            }
        }
    }
}
