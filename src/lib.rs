pub mod descriptor;
pub mod dom;
pub mod error;
pub mod locator;
pub mod record;
pub mod server;

// Re-export commonly used items
pub use descriptor::{ElementInspector, JsonInspector, DEFAULT_CONTAINER_ID};
pub use dom::{Document, LayoutRect, NodeId, NodeSpec};
pub use error::RecorderError;
pub use locator::{
    canonical_xpath, effective_xpath, generate_selector, generate_selector_path, generate_xpath,
    AttributeCriteria, Criterion, OverrideStore,
};
pub use record::{
    ActionMessage, ActionSink, ActionType, CommandResponse, CursorState, DomEvent, EventKind,
    FrameContext, IframeInfo, Key, LocatorCheck, LocatorProbe, LocatorSuggestions, MouseButton,
    OutboundMessage, Position, Recorder, RecordingAreaGuard, RecordingMode,
};
