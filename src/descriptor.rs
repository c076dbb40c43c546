//! Element Descriptor Collaborator
//!
//! The engine does not interpret descriptors itself: generating the rich
//! element fingerprint, parsing one back into live elements, extracting
//! element text, and method-based lookup all belong to a collaborator behind
//! the [`ElementInspector`] trait. [`JsonInspector`] is the bundled default so
//! the crate works out of the box; hosts with their own descriptor service
//! plug in here.

use crate::dom::{Document, NodeId};
use crate::error::{RecorderError, Result};
use crate::locator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The element-descriptor service consumed by the recording engine.
pub trait ElementInspector {
    /// Serializes a fingerprint of the element. Opaque to the engine.
    fn generate_descriptor(&self, doc: &Document, elem: NodeId) -> String;

    /// Resolves a descriptor back to zero, one, or many live elements.
    fn parse_descriptor(&self, doc: &Document, descriptor: &str) -> Result<Vec<NodeId>>;

    /// Visible text of the element, used as click/double-click content.
    fn text_of(&self, doc: &Document, elem: NodeId) -> String;

    /// Resolves a single element by lookup method and value.
    fn element_by(&self, doc: &Document, method: &str, value: &str) -> Option<NodeId>;

    /// Id of the host's injected UI container, demarcating the excluded
    /// recording area.
    fn host_container_id(&self) -> &str;
}

/// Fingerprint payload used by [`JsonInspector`]: tag, attributes, and text.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Fingerprint {
    tag: String,

    #[serde(default)]
    attributes: BTreeMap<String, String>,

    #[serde(default)]
    text: String,
}

/// Default inspector with a JSON fingerprint format.
pub struct JsonInspector {
    container_id: String,
}

/// Container id used when the host does not supply one.
pub const DEFAULT_CONTAINER_ID: &str = "recorder-console-container";

impl JsonInspector {
    pub fn new() -> Self {
        Self::with_container_id(DEFAULT_CONTAINER_ID)
    }

    pub fn with_container_id(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
        }
    }
}

impl Default for JsonInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementInspector for JsonInspector {
    fn generate_descriptor(&self, doc: &Document, elem: NodeId) -> String {
        let fingerprint = Fingerprint {
            tag: doc.tag(elem).to_string(),
            attributes: doc
                .attributes(elem)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: doc.text(elem).to_string(),
        };
        // A struct of strings cannot fail to serialize.
        serde_json::to_string(&fingerprint).unwrap_or_default()
    }

    fn parse_descriptor(&self, doc: &Document, descriptor: &str) -> Result<Vec<NodeId>> {
        let fingerprint: Fingerprint = serde_json::from_str(descriptor)
            .map_err(|e| RecorderError::Descriptor(e.to_string()))?;
        let matches = doc
            .elements_by_tag(&fingerprint.tag)
            .into_iter()
            .filter(|elem| {
                let attrs_match = fingerprint
                    .attributes
                    .iter()
                    .all(|(k, v)| doc.attribute(*elem, k) == Some(v.as_str()));
                let text_match = fingerprint.text.is_empty() || doc.text(*elem) == fingerprint.text;
                attrs_match && text_match
            })
            .collect();
        Ok(matches)
    }

    fn text_of(&self, doc: &Document, elem: NodeId) -> String {
        let own = doc.text(elem);
        if !own.is_empty() {
            return own.to_string();
        }
        // Fall back to concatenated descendant text.
        let mut parts = Vec::new();
        for child in doc.children(elem) {
            let text = self.text_of(doc, *child);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    fn element_by(&self, doc: &Document, method: &str, value: &str) -> Option<NodeId> {
        match method {
            "id" => doc.element_by_id(value),
            "name" => doc
                .all_elements()
                .into_iter()
                .find(|n| doc.attribute(*n, "name") == Some(value)),
            "class" => doc.all_elements().into_iter().find(|n| {
                doc.attribute(*n, "class")
                    .map(|c| c.split_whitespace().any(|cls| cls == value))
                    .unwrap_or(false)
            }),
            "tag" => doc.elements_by_tag(value).into_iter().next(),
            // No general XPath evaluator in scope: an xpath probe passes when
            // it equals some element's canonical xpath.
            "xpath" => doc
                .all_elements()
                .into_iter()
                .find(|n| locator::canonical_xpath(doc, *n) == value),
            _ => None,
        }
    }

    fn host_container_id(&self) -> &str {
        &self.container_id
    }
}
