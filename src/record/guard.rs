//! Recording Area Guard
//!
//! The recorder injects its own tuning dialog into the page; interactions
//! with that subtree must never be captured as user actions. The guard drops
//! any event whose element sits inside the host UI container.

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone)]
pub struct RecordingAreaGuard {
    container_id: String,
}

impl RecordingAreaGuard {
    pub fn new(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
        }
    }

    /// True when the element may be recorded. An absent element is allowed;
    /// the container itself and everything inside it is not.
    pub fn allows(&self, doc: &Document, elem: Option<NodeId>) -> bool {
        let Some(elem) = elem else {
            return true;
        };
        match doc.element_by_id(&self.container_id) {
            Some(container) => !doc.contains(container, elem),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_excludes_container_subtree() {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        let console = doc.create_element("div");
        let console_button = doc.create_element("button");
        let page_button = doc.create_element("button");
        doc.append_child(html, body);
        doc.append_child(body, console);
        doc.append_child(console, console_button);
        doc.append_child(body, page_button);
        doc.set_attribute(console, "id", "recorder-console-container");

        let guard = RecordingAreaGuard::new("recorder-console-container");
        assert!(!guard.allows(&doc, Some(console)));
        assert!(!guard.allows(&doc, Some(console_button)));
        assert!(guard.allows(&doc, Some(page_button)));
        assert!(guard.allows(&doc, None));
    }

    #[test]
    fn test_guard_allows_everything_without_container() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let guard = RecordingAreaGuard::new("recorder-console-container");
        assert!(guard.allows(&doc, Some(body)));
    }
}
