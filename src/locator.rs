//! Locator Generation
//!
//! Produces the three locator flavors attached to every recorded action: an
//! XPath (criteria-driven, deterministic), a CSS selector, and a full
//! root-to-element selector path. Also owns the session-scoped override map
//! that lets a user replace a generated xpath with a hand-tuned one.

use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How one attribute participates in an xpath predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Attribute value the predicate must match.
    pub value: String,

    /// Exact equality when true, substring containment otherwise.
    pub exact: bool,
}

/// Attribute-selection criteria, keyed by attribute name.
///
/// `None` means "attribute present, any value"; `Some(criterion)` pins the
/// value. A `BTreeMap` keeps predicate order deterministic.
pub type AttributeCriteria = BTreeMap<String, Option<Criterion>>;

/// Generates the xpath for an element under the given criteria.
///
/// The path runs from the document root to the element. Each segment carries
/// the predicates its criteria produce (`element_criteria` for the target,
/// `ancestor_criteria` for everything above it); a segment with no applicable
/// predicate that has same-tag siblings falls back to a 1-based positional
/// index. The same element and criteria always yield the same string.
pub fn generate_xpath(
    doc: &Document,
    elem: NodeId,
    ancestor_criteria: &AttributeCriteria,
    element_criteria: &AttributeCriteria,
) -> String {
    let mut segments = Vec::new();
    for node in doc.ancestor_path(elem) {
        let criteria = if node == elem {
            element_criteria
        } else {
            ancestor_criteria
        };
        segments.push(xpath_segment(doc, node, criteria));
    }
    format!("/{}", segments.join("/"))
}

fn xpath_segment(doc: &Document, node: NodeId, criteria: &AttributeCriteria) -> String {
    let mut segment = doc.tag(node).to_string();
    let mut predicated = false;
    for (attr, criterion) in criteria {
        if doc.attribute(node, attr).is_none() {
            continue;
        }
        match criterion {
            None => segment.push_str(&format!("[@{}]", attr)),
            Some(c) if c.exact => {
                segment.push_str(&format!("[@{}=\"{}\"]", attr, c.value));
            }
            Some(c) => {
                segment.push_str(&format!("[contains(@{},\"{}\")]", attr, c.value));
            }
        }
        predicated = true;
    }
    if !predicated {
        let (index, count) = doc.sibling_tag_index(node);
        if count > 1 {
            segment.push_str(&format!("[{}]", index));
        }
    }
    segment
}

/// The canonical xpath: generated with empty criteria on both maps. This is
/// the form used as the override-map key.
pub fn canonical_xpath(doc: &Document, elem: NodeId) -> String {
    let empty = AttributeCriteria::new();
    generate_xpath(doc, elem, &empty, &empty)
}

/// Generates a short CSS selector for the element: id when available, then
/// classes, then a positional `nth-of-type` fallback.
pub fn generate_selector(doc: &Document, elem: NodeId) -> String {
    let tag = doc.tag(elem);
    if let Some(id) = doc.attribute(elem, "id") {
        if !id.is_empty() {
            return format!("{}#{}", tag, id);
        }
    }
    if let Some(class) = doc.attribute(elem, "class") {
        if !class.is_empty() {
            let classes: Vec<&str> = class.split_whitespace().collect();
            return format!("{}.{}", tag, classes.join("."));
        }
    }
    let (index, _) = doc.sibling_tag_index(elem);
    format!("{}:nth-of-type({})", tag, index)
}

/// Generates the full ancestor-indexed selector path, root to element. Every
/// segment is positional so the path survives attribute churn.
pub fn generate_selector_path(doc: &Document, elem: NodeId) -> String {
    let segments: Vec<String> = doc
        .ancestor_path(elem)
        .into_iter()
        .map(|node| {
            let (index, _) = doc.sibling_tag_index(node);
            format!("{}:nth-of-type({})", doc.tag(node), index)
        })
        .collect();
    segments.join(" > ")
}

/// Session-scoped map of canonical xpath to user-edited replacement.
///
/// Lookups use exact string equality against the canonical form, never the
/// override value itself. No eviction; entries live for the session.
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    entries: HashMap<String, String>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves an edited xpath for a canonical key. Saving twice overwrites.
    pub fn save(&mut self, canonical: &str, edited: &str) {
        self.entries
            .insert(canonical.to_string(), edited.to_string());
    }

    pub fn resolve(&self, canonical: &str) -> Option<&str> {
        self.entries.get(canonical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The locator actually emitted with actions: the user's override when one is
/// saved for the element's canonical xpath, the canonical xpath otherwise.
pub fn effective_xpath(doc: &Document, elem: NodeId, overrides: &OverrideStore) -> String {
    let canonical = canonical_xpath(doc, elem);
    match overrides.resolve(&canonical) {
        Some(edited) => edited.to_string(),
        None => canonical,
    }
}
