//! Raw DOM Event Types
//!
//! The low-level events the capture controller classifies. Serde-tagged so a
//! host process can feed them over the harness as JSON.

use crate::dom::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Keys the capture controller cares about. Everything else arrives as
/// `Other` and is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Enter,
    Shift,
    #[serde(other)]
    Other,
}

/// A raw page event, as observed in the capturing phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomEvent {
    #[serde(rename_all = "camelCase")]
    PointerDown {
        target: NodeId,
        button: MouseButton,
        screen_x: i32,
        screen_y: i32,
        client_x: i32,
        client_y: i32,
    },

    #[serde(rename_all = "camelCase")]
    PointerUp {
        target: NodeId,
        button: MouseButton,
        screen_x: i32,
        screen_y: i32,
        client_x: i32,
        client_y: i32,
    },

    PointerOver {
        target: NodeId,
    },

    PointerOut {
        target: NodeId,
    },

    ValueChange {
        target: NodeId,
    },

    Submit {
        target: NodeId,
    },

    KeyDown {
        key: Key,
    },

    #[serde(rename_all = "camelCase")]
    DoubleClick {
        target: NodeId,
        client_x: i32,
        client_y: i32,
    },

    Blur {
        target: NodeId,
    },
}

impl DomEvent {
    /// The element the event fired on, if the kind carries one.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            DomEvent::PointerDown { target, .. }
            | DomEvent::PointerUp { target, .. }
            | DomEvent::PointerOver { target }
            | DomEvent::PointerOut { target }
            | DomEvent::ValueChange { target }
            | DomEvent::Submit { target }
            | DomEvent::DoubleClick { target, .. }
            | DomEvent::Blur { target } => Some(*target),
            DomEvent::KeyDown { .. } => None,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomEvent::PointerDown { .. } => EventKind::PointerDown,
            DomEvent::PointerUp { .. } => EventKind::PointerUp,
            DomEvent::PointerOver { .. } => EventKind::PointerOver,
            DomEvent::PointerOut { .. } => EventKind::PointerOut,
            DomEvent::ValueChange { .. } => EventKind::ValueChange,
            DomEvent::Submit { .. } => EventKind::Submit,
            DomEvent::KeyDown { .. } => EventKind::KeyDown,
            DomEvent::DoubleClick { .. } => EventKind::DoubleClick,
            DomEvent::Blur { .. } => EventKind::Blur,
        }
    }
}

/// Stable identity for a listener registration. Registering twice is a no-op,
/// unregistering removes exactly the kind registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerOver,
    PointerOut,
    ValueChange,
    Submit,
    KeyDown,
    DoubleClick,
    Blur,
}

impl EventKind {
    /// Full listener set attached while recording.
    pub fn recording_set() -> &'static [EventKind] {
        &[
            EventKind::PointerDown,
            EventKind::PointerUp,
            EventKind::PointerOver,
            EventKind::PointerOut,
            EventKind::ValueChange,
            EventKind::Submit,
            EventKind::KeyDown,
            EventKind::DoubleClick,
            EventKind::Blur,
        ]
    }

    /// Reduced set attached in locator-updater mode.
    pub fn updater_set() -> &'static [EventKind] {
        &[
            EventKind::PointerDown,
            EventKind::PointerOver,
            EventKind::PointerOut,
            EventKind::KeyDown,
        ]
    }
}
