pub mod engine;
pub mod events;
pub mod guard;
pub mod message;
pub mod verify;

pub use engine::{CursorState, FrameContext, LocatorSuggestions, Recorder, RecordingMode};
pub use events::{DomEvent, EventKind, Key, MouseButton};
pub use guard::RecordingAreaGuard;
pub use message::{ActionMessage, ActionSink, ActionType, IframeInfo, OutboundMessage, Position};
pub use verify::{CommandResponse, InboundCommand, LocatorCheck, LocatorProbe};
