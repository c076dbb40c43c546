//! Outbound Message Contract
//!
//! Defines the wire shape of everything the engine sends to its host: one
//! action message per recognized interaction, plus the top-frame page-load
//! announcement. Messages travel through the send-only [`ActionSink`]
//! capability; delivery is best-effort and never blocks or errors the
//! capture session.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Semantic action classifications emitted by the capture controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "click")]
    Click,

    #[serde(rename = "rightclick")]
    RightClick,

    #[serde(rename = "drag")]
    Drag,

    #[serde(rename = "doubleClick")]
    DoubleClick,

    #[serde(rename = "submit")]
    Submit,

    #[serde(rename = "change")]
    Change,

    #[serde(rename = "type")]
    Type,

    #[serde(rename = "select")]
    Select,

    #[serde(rename = "enter")]
    Enter,

    #[serde(rename = "replaceHtml")]
    ReplaceHtml,
}

/// Element position and the triggering cursor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub event_x: i32,
    pub event_y: i32,
}

/// Frame location, attached only by nested-frame instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IframeInfo {
    pub host: String,
    pub pathname: String,
}

/// The unit sent to the host on every recognized interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    /// Ordered pair: CSS selector, then full selector path.
    pub selectors: Vec<String>,

    /// Escaped string payload (click text, input value, drag delta).
    pub content: String,

    /// Tag name of the target element, empty for synthetic actions.
    pub node_type: String,

    pub action: ActionType,

    /// Opaque element fingerprint from the descriptor collaborator.
    pub descriptor: String,

    /// Generated identifier, not guaranteed globally unique.
    pub elem_var_name: String,

    pub iframe_info: Option<IframeInfo>,

    pub position: Option<Position>,

    /// True when recording runs without the host console UI.
    pub no_console: bool,

    /// "rpf", "updater", or "".
    pub mode: String,

    /// Single-element sequence holding the effective (override-resolved)
    /// xpath; empty for synthetic actions.
    pub xpaths: Vec<String>,
}

/// Everything the engine emits, tagged by `command` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum OutboundMessage {
    #[serde(rename = "GetActionInfo")]
    Action(ActionMessage),

    #[serde(rename = "RecordPageLoadedComplete")]
    PageLoaded { url: String },
}

/// Send-only capability for outbound messages. Implementations must never
/// block; a lost message is an accepted data-loss boundary.
pub trait ActionSink {
    fn dispatch(&self, message: OutboundMessage);
}

impl ActionSink for mpsc::UnboundedSender<OutboundMessage> {
    fn dispatch(&self, message: OutboundMessage) {
        if mpsc::UnboundedSender::send(self, message).is_err() {
            log::warn!("Host channel closed, action dropped");
        }
    }
}

/// Legacy JS `escape()` encoding for the `content` field.
///
/// The host decodes with `unescape()`, so the exact legacy alphabet matters:
/// ASCII alphanumerics and `@ * _ + - . /` pass through, other Latin-1 bytes
/// become `%XX`, and all other UTF-16 units become `%uXXXX` (surrogate pairs
/// produce two sequences).
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for unit in input.encode_utf16() {
        match char::from_u32(unit as u32) {
            Some(c)
                if c.is_ascii_alphanumeric() || matches!(c, '@' | '*' | '_' | '+' | '-' | '.' | '/') =>
            {
                out.push(c);
            }
            _ if unit < 256 => out.push_str(&format!("%{:02X}", unit)),
            _ => out.push_str(&format!("%u{:04X}", unit)),
        }
    }
    out
}
