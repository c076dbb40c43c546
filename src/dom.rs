//! In-Memory Document Model
//!
//! The recording engine operates on an owned, arena-based snapshot of the page
//! DOM. Whatever drives the engine (a CDP adapter, the HTTP harness, a test)
//! populates this document and then feeds events referencing nodes by id.
//!
//! Node ids are assigned in creation order; `Document::from_spec` builds the
//! tree in pre-order, so the n-th element of a `NodeSpec` tree gets id n.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle to an element in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Client-coordinate layout rectangle of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    inner_html: String,
    outline: String,
    layout: Option<LayoutRect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    detached: bool,
}

/// An element tree addressed by [`NodeId`].
///
/// Detaching a node removes it from its parent but keeps the arena slot alive,
/// so late style writes (outline-reset timers) against a removed element stay
/// harmless.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<ElementNode>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element. Tags are normalized to lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementNode {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            inner_html: String::new(),
            outline: String::new(),
            layout: None,
            parent: None,
            children: Vec::new(),
            detached: false,
        });
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True when the id refers to a slot in this arena. Ids arriving from
    /// outside (harness JSON) must be checked before use; detached slots
    /// remain valid.
    pub fn is_valid(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Appends a child, removing it from its previous parent first. The old
    /// parent's child list must never keep a stale entry.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].detached = false;
        self.nodes[parent.0].children.push(child);
    }

    /// Removes an element from its parent. The arena slot stays valid so
    /// handles held elsewhere (timer queue, cursor state) never dangle.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        self.nodes[id.0].detached = true;
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        !self.nodes[id.0].detached
    }

    /// Lowercase tag name, as stored.
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    /// Uppercase tag name, matching the DOM `tagName` convention.
    pub fn tag_name(&self, id: NodeId) -> String {
        self.nodes[id.0].tag.to_ascii_uppercase()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes[id.0]
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.0].text = text.to_string();
    }

    /// Current form value (inputs, selects, textareas).
    pub fn value(&self, id: NodeId) -> &str {
        &self.nodes[id.0].value
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        self.nodes[id.0].value = value.to_string();
    }

    pub fn inner_html(&self, id: NodeId) -> &str {
        &self.nodes[id.0].inner_html
    }

    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.nodes[id.0].inner_html = html.to_string();
    }

    /// Inline `outline` style, empty when unset.
    pub fn outline(&self, id: NodeId) -> &str {
        &self.nodes[id.0].outline
    }

    /// Writing the outline of a detached element is allowed and harmless.
    pub fn set_outline(&mut self, id: NodeId, outline: &str) {
        self.nodes[id.0].outline = outline.to_string();
    }

    pub fn layout(&self, id: NodeId) -> Option<LayoutRect> {
        self.nodes[id.0].layout
    }

    pub fn set_layout(&mut self, id: NodeId, rect: LayoutRect) {
        self.nodes[id.0].layout = Some(rect);
    }

    /// True if `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes[id.0].parent;
        }
        false
    }

    /// All attached elements in document (pre-)order.
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.walk(root, &mut out);
        }
        out
    }

    fn walk(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in &self.nodes[id.0].children {
            self.walk(*child, out);
        }
    }

    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id_attr))
    }

    /// Elements sharing a (lowercase) tag name, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.all_elements()
            .into_iter()
            .filter(|n| self.nodes[n.0].tag == tag)
            .collect()
    }

    /// 0-based index of the element among all same-tag elements in the page.
    /// Used for variable-name generation.
    pub fn index_among_same_tag(&self, id: NodeId) -> usize {
        self.elements_by_tag(self.tag(id))
            .iter()
            .position(|n| *n == id)
            .unwrap_or(0)
    }

    /// 1-based index of the element among same-tag siblings, with the sibling
    /// count. Used for positional xpath/selector segments.
    pub fn sibling_tag_index(&self, id: NodeId) -> (usize, usize) {
        let tag = &self.nodes[id.0].tag;
        let siblings: Vec<NodeId> = match self.nodes[id.0].parent {
            Some(parent) => self.nodes[parent.0]
                .children
                .iter()
                .copied()
                .filter(|c| &self.nodes[c.0].tag == tag)
                .collect(),
            None => vec![id],
        };
        let pos = siblings.iter().position(|n| *n == id).unwrap_or(0);
        (pos + 1, siblings.len())
    }

    /// Root-to-element chain, root first.
    pub fn ancestor_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.0].parent {
            path.push(parent);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Builds a document from a JSON tree description.
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let mut doc = Document::new();
        doc.build_node(spec, None);
        doc
    }

    fn build_node(&mut self, spec: &NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.create_element(&spec.tag);
        for (name, value) in &spec.attributes {
            self.set_attribute(id, name, value);
        }
        self.set_text(id, &spec.text);
        self.set_value(id, &spec.value);
        self.set_inner_html(id, &spec.inner_html);
        if let Some(rect) = spec.layout {
            self.set_layout(id, rect);
        }
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        for child in &spec.children {
            self.build_node(child, Some(id));
        }
        id
    }
}

/// JSON description of an element subtree, consumed by [`Document::from_spec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub tag: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub inner_html: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutRect>,

    #[serde(default)]
    pub children: Vec<NodeSpec>,
}
