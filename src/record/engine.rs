//! Event Capture Controller
//!
//! [`Recorder`] is the in-page recording engine: it owns the document
//! snapshot, the cursor/hover state, and the classification state machine
//! that turns raw DOM events into semantic actions. One instance runs per
//! frame; instances are independent and single-threaded, and every handler
//! runs to completion before the next event is looked at.

use crate::descriptor::ElementInspector;
use crate::dom::{Document, NodeId};
use crate::error::{RecorderError, Result};
use crate::locator::{self, OverrideStore};
use crate::record::events::{DomEvent, EventKind, Key, MouseButton};
use crate::record::guard::RecordingAreaGuard;
use crate::record::message::{
    escape, ActionMessage, ActionSink, ActionType, IframeInfo, OutboundMessage, Position,
};
use rand::Rng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Outline applied to the hovered/recorded element.
pub const HIGHLIGHT_OUTLINE: &str = "medium solid yellow";

/// Outline applied to elements matched during descriptor re-resolution.
pub const VERIFY_OUTLINE: &str = "medium solid blue";

/// Outline applied to elements matched by a locator batch check.
pub const CHECK_OUTLINE: &str = "medium solid red";

/// How long a verification outline stays before the one-shot reset.
pub const OUTLINE_RESET_DELAY: Duration = Duration::from_millis(1500);

/// Pointer-up deltas inside the open interval (-DEADZONE, DEADZONE) on both
/// axes are treated as hand tremor during a click, not a drag.
const DRAG_DEADZONE: i32 = 10;

/// Exclusive upper bound for the variable-name random suffix.
const VAR_NAME_RANDOM_MAX: u32 = 999;

/// Which frame of the page this engine instance runs in. Nested instances
/// attach `iframeInfo` to every action and stay silent on top-frame duties
/// (page-load announcement, tuning-dialog opening).
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub is_top: bool,
    pub host: String,
    pub pathname: String,
}

impl FrameContext {
    pub fn top(host: &str, pathname: &str) -> Self {
        Self {
            is_top: true,
            host: host.to_string(),
            pathname: pathname.to_string(),
        }
    }

    pub fn nested(host: &str, pathname: &str) -> Self {
        Self {
            is_top: false,
            host: host.to_string(),
            pathname: pathname.to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.host, self.pathname)
    }

    fn iframe_info(&self) -> Option<IframeInfo> {
        if self.is_top {
            None
        } else {
            Some(IframeInfo {
                host: self.host.clone(),
                pathname: self.pathname.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    Off,
    Rpf,
    Updater,
}

impl RecordingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::Off => "",
            RecordingMode::Rpf => "rpf",
            RecordingMode::Updater => "updater",
        }
    }
}

/// Transient cursor state, re-armed on every recording start.
#[derive(Debug, Clone)]
pub struct CursorState {
    /// Element currently under the cursor. Never retained past the next
    /// hover.
    pub hovered: Option<NodeId>,

    /// Outline the hovered element had before highlighting, restored on the
    /// next hover-out or re-highlight.
    pub saved_outline: String,

    pub mouse_down: Option<NodeId>,

    pub mouse_down_screen: (i32, i32),

    /// Whether hovering refreshes the locator suggestions. Toggled by Shift.
    pub hover_preview: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            hovered: None,
            saved_outline: String::new(),
            mouse_down: None,
            mouse_down_screen: (0, 0),
            hover_preview: true,
        }
    }
}

/// Data surface fed to the tuning dialog: the hovered element's attributes
/// and its effective xpath. Rendering is the host's concern.
#[derive(Debug, Clone)]
pub struct LocatorSuggestions {
    pub target: NodeId,
    pub attributes: Vec<(String, String)>,
    pub xpath: String,
}

#[derive(Debug, Clone, Copy)]
struct OutlineTimer {
    target: NodeId,
    due: Instant,
}

/// The per-frame recording engine.
pub struct Recorder<S: ActionSink> {
    doc: Document,
    inspector: Box<dyn ElementInspector + Send>,
    sink: S,
    guard: RecordingAreaGuard,
    frame: FrameContext,
    mode: RecordingMode,
    cursor: CursorState,
    armed: BTreeSet<EventKind>,
    host_ui_present: bool,
    suggestions: Option<LocatorSuggestions>,
    overrides: OverrideStore,
    timers: Vec<OutlineTimer>,
    context_menu_suppressed: bool,
}

impl<S: ActionSink> Recorder<S> {
    pub fn new(
        doc: Document,
        inspector: Box<dyn ElementInspector + Send>,
        sink: S,
        frame: FrameContext,
    ) -> Self {
        let guard = RecordingAreaGuard::new(inspector.host_container_id());
        Self {
            doc,
            inspector,
            sink,
            guard,
            frame,
            mode: RecordingMode::Off,
            cursor: CursorState::default(),
            armed: BTreeSet::new(),
            host_ui_present: false,
            suggestions: None,
            overrides: OverrideStore::new(),
            timers: Vec::new(),
            context_menu_suppressed: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Swaps in a freshly loaded page. Node handles, the override map, and
    /// pending outline timers all belong to the old page and are dropped.
    pub fn set_document(&mut self, doc: Document) {
        self.doc = doc;
        self.cursor = CursorState::default();
        self.suggestions = None;
        self.overrides = OverrideStore::new();
        self.timers.clear();
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn is_armed(&self, kind: EventKind) -> bool {
        self.armed.contains(&kind)
    }

    pub fn suggestions(&self) -> Option<&LocatorSuggestions> {
        self.suggestions.as_ref()
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Whether the native context menu is currently flagged as suppressed.
    pub fn context_menu_suppressed(&self) -> bool {
        self.context_menu_suppressed
    }

    pub(crate) fn inspector(&self) -> &(dyn ElementInspector + Send) {
        self.inspector.as_ref()
    }

    // ===== SESSION CONTROL =====

    /// Starts recording. Always stops first so listeners are never
    /// double-registered; safe to call from any prior state.
    pub fn start_recording(&mut self, host_ui_present: bool) {
        self.stop_recording();
        self.mode = RecordingMode::Rpf;
        self.host_ui_present = host_ui_present;
        self.cursor = CursorState::default();
        for kind in EventKind::recording_set() {
            self.armed.insert(*kind);
        }
        if host_ui_present {
            self.context_menu_suppressed = true;
            if self.frame.is_top {
                // The host opens the tuning dialog; its data surface is
                // refreshed through `suggestions` on hover.
                log::debug!("Top frame ready for tuning dialog");
            }
        }
        log::info!(
            "Recording started (host ui: {}, frame: {})",
            host_ui_present,
            if self.frame.is_top { "top" } else { "nested" }
        );
    }

    /// Stops recording. Idempotent; unregisters every capture listener and
    /// discards the cursor state.
    pub fn stop_recording(&mut self) {
        for kind in EventKind::recording_set() {
            self.armed.remove(kind);
        }
        self.mode = RecordingMode::Off;
        self.cursor = CursorState::default();
        self.suggestions = None;
        self.context_menu_suppressed = false;
        log::info!("Recording stopped");
    }

    /// Enters locator-updater mode: hover/click inspection only, no full
    /// capture set.
    pub fn enter_updater_mode(&mut self) {
        self.mode = RecordingMode::Updater;
        // Updater mode always runs alongside the tuning dialog.
        self.host_ui_present = true;
        for kind in EventKind::updater_set() {
            self.armed.insert(*kind);
        }
        if self.frame.is_top {
            log::debug!("Top frame ready for tuning dialog");
        }
        log::info!("Updater mode entered");
    }

    pub fn end_updater_mode(&mut self) {
        for kind in EventKind::updater_set() {
            self.armed.remove(kind);
        }
        self.mode = RecordingMode::Off;
        self.suggestions = None;
        log::info!("Updater mode ended");
    }

    /// Top-frame instances announce the page load to the host; nested
    /// instances stay silent.
    pub fn announce_page_loaded(&self) {
        if self.frame.is_top {
            self.sink.dispatch(OutboundMessage::PageLoaded {
                url: self.frame.url(),
            });
        }
    }

    // ===== EVENT CLASSIFICATION =====

    /// Feeds one raw event through the classifier. Events whose kind has no
    /// armed listener are ignored, as are events whose target id does not
    /// exist in the current document.
    pub fn handle_event(&mut self, event: DomEvent) {
        if !self.armed.contains(&event.kind()) {
            return;
        }
        if let Some(target) = event.target() {
            if !self.doc.is_valid(target) {
                log::debug!("Event targets unknown element {:?}, discarded", target);
                return;
            }
        }
        match event {
            DomEvent::PointerDown {
                target,
                button,
                screen_x,
                screen_y,
                client_x,
                client_y,
            } => self.on_pointer_down(target, button, screen_x, screen_y, client_x, client_y),
            DomEvent::PointerUp {
                button,
                screen_x,
                screen_y,
                client_x,
                client_y,
                ..
            } => self.on_pointer_up(button, screen_x, screen_y, client_x, client_y),
            DomEvent::PointerOver { target } => self.on_pointer_over(target),
            DomEvent::PointerOut { target } => self.on_pointer_out(target),
            DomEvent::ValueChange { target } => self.on_value_change(target),
            DomEvent::Submit { target } => self.on_submit(target),
            DomEvent::KeyDown { key } => self.on_key_down(key),
            DomEvent::DoubleClick {
                target,
                client_x,
                client_y,
            } => self.on_double_click(target, client_x, client_y),
            DomEvent::Blur { target } => self.on_blur(target),
        }
    }

    fn on_pointer_down(
        &mut self,
        target: NodeId,
        button: MouseButton,
        screen_x: i32,
        screen_y: i32,
        client_x: i32,
        client_y: i32,
    ) {
        if self.cursor.hovered.is_none() {
            self.cursor.hovered = Some(target);
        }
        let elem = match self.cursor.hovered {
            Some(elem) => elem,
            None => return,
        };
        let content = self.inspector.text_of(&self.doc, elem);
        match button {
            MouseButton::Primary if self.mode == RecordingMode::Rpf => {
                self.cursor.mouse_down_screen = (screen_x, screen_y);
                // Selection controls report through the change handler; a
                // click here would double-report them.
                if self.doc.tag(elem) != "select" {
                    self.cursor.mouse_down = Some(elem);
                    self.send_action(elem, &content, ActionType::Click, Some((client_x, client_y)));
                }
            }
            MouseButton::Secondary => {
                self.send_action(
                    elem,
                    &content,
                    ActionType::RightClick,
                    Some((client_x, client_y)),
                );
            }
            _ => {}
        }
    }

    fn on_pointer_up(
        &mut self,
        button: MouseButton,
        screen_x: i32,
        screen_y: i32,
        client_x: i32,
        client_y: i32,
    ) {
        if button != MouseButton::Primary {
            return;
        }
        let (down_x, down_y) = self.cursor.mouse_down_screen;
        let dx = screen_x - down_x;
        let dy = screen_y - down_y;
        if dx.abs() < DRAG_DEADZONE && dy.abs() < DRAG_DEADZONE {
            log::debug!("Minor mouse drag ({}x{}), ignored", dx, dy);
            return;
        }
        if !self.guard.allows(&self.doc, self.cursor.mouse_down) {
            return;
        }
        let elem = match self.cursor.hovered.or(self.cursor.mouse_down) {
            Some(elem) => elem,
            None => return,
        };
        log::debug!("Visible mouse drag ({}x{}), recording", dx, dy);
        self.send_action(
            elem,
            &format!("{}x{}", dx, dy),
            ActionType::Drag,
            Some((client_x, client_y)),
        );
    }

    fn on_pointer_over(&mut self, target: NodeId) {
        if let Some(prev) = self.cursor.hovered {
            let saved = self.cursor.saved_outline.clone();
            self.doc.set_outline(prev, &saved);
        }
        self.cursor.hovered = Some(target);
        self.cursor.saved_outline = self.doc.outline(target).to_string();
        if self.host_ui_present && self.guard.allows(&self.doc, Some(target)) {
            self.refresh_suggestions(target);
            self.doc.set_outline(target, HIGHLIGHT_OUTLINE);
        }
    }

    /// The pointer-out target is authoritative for the reset, not the
    /// tracked hovered element.
    fn on_pointer_out(&mut self, target: NodeId) {
        self.doc.set_outline(target, "");
    }

    fn on_value_change(&mut self, target: NodeId) {
        if self.is_toggle_input(target) {
            log::debug!("Change on checkbox/radio, discarded");
            return;
        }
        let action = match self.doc.tag(target) {
            "input" => ActionType::Type,
            "select" => ActionType::Select,
            _ => ActionType::Change,
        };
        let content = self.doc.value(target).to_string();
        self.send_action(target, &content, action, Some((0, 0)));
    }

    fn on_submit(&mut self, target: NodeId) {
        self.send_action(target, "", ActionType::Submit, Some((0, 0)));
    }

    fn on_key_down(&mut self, key: Key) {
        match key {
            Key::Enter if self.mode == RecordingMode::Rpf => {
                // Synthetic action: no element context at all.
                self.send_message(
                    Vec::new(),
                    "",
                    "",
                    ActionType::Enter,
                    "",
                    "",
                    None,
                    None,
                    Vec::new(),
                );
            }
            Key::Shift => {
                self.cursor.hover_preview = !self.cursor.hover_preview;
                log::debug!("Hover preview {}", self.cursor.hover_preview);
            }
            _ => {}
        }
    }

    fn on_double_click(&mut self, target: NodeId, client_x: i32, client_y: i32) {
        let elem = self.cursor.hovered.unwrap_or(target);
        let content = self.inspector.text_of(&self.doc, elem);
        self.send_action(
            elem,
            &content,
            ActionType::DoubleClick,
            Some((client_x, client_y)),
        );
    }

    fn on_blur(&mut self, target: NodeId) {
        if self.doc.attribute(target, "contenteditable").is_none() {
            return;
        }
        let content = self.doc.inner_html(target).to_string();
        self.send_action(target, &content, ActionType::ReplaceHtml, Some((0, 0)));
    }

    fn is_toggle_input(&self, elem: NodeId) -> bool {
        self.doc.tag(elem) == "input"
            && matches!(
                self.doc.attribute(elem, "type"),
                Some("checkbox") | Some("radio")
            )
    }

    // ===== LOCATOR SUGGESTIONS / OVERRIDES =====

    fn refresh_suggestions(&mut self, target: NodeId) {
        if !self.cursor.hover_preview {
            return;
        }
        self.suggestions = Some(LocatorSuggestions {
            target,
            attributes: self
                .doc
                .attributes(target)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            xpath: locator::effective_xpath(&self.doc, target, &self.overrides),
        });
    }

    /// Saves a hand-edited xpath for the element currently shown in the
    /// tuning dialog, keyed by that element's canonical xpath.
    pub fn save_locator_override(&mut self, edited: &str) -> Result<()> {
        let target = self
            .suggestions
            .as_ref()
            .map(|s| s.target)
            .ok_or(RecorderError::NoFinderElement)?;
        let canonical = locator::canonical_xpath(&self.doc, target);
        self.overrides.save(&canonical, edited);
        log::info!("Saved locator override for {}", canonical);
        Ok(())
    }

    // ===== ACTION ENCODING =====

    /// Full encoding pipeline for an element-backed action: guard check,
    /// outline restore, locator/descriptor generation, re-highlight,
    /// variable name, then dispatch.
    fn send_action(
        &mut self,
        elem: NodeId,
        content: &str,
        action: ActionType,
        client: Option<(i32, i32)>,
    ) {
        if !self.guard.allows(&self.doc, Some(elem)) {
            log::debug!("Element inside recording console, {:?} dropped", action);
            return;
        }
        let saved = self.cursor.saved_outline.clone();
        self.doc.set_outline(elem, &saved);
        let descriptor = self.inspector.generate_descriptor(&self.doc, elem);
        let selectors = vec![
            locator::generate_selector(&self.doc, elem),
            locator::generate_selector_path(&self.doc, elem),
        ];
        let xpaths = vec![locator::effective_xpath(&self.doc, elem, &self.overrides)];
        self.doc.set_outline(elem, HIGHLIGHT_OUTLINE);
        let var_name = self.create_var_name(elem);
        let node_type = self.doc.tag_name(elem);
        self.send_message(
            selectors,
            content,
            &node_type,
            action,
            &descriptor,
            &var_name,
            Some(elem),
            client,
            xpaths,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn send_message(
        &mut self,
        selectors: Vec<String>,
        content: &str,
        node_type: &str,
        action: ActionType,
        descriptor: &str,
        var_name: &str,
        elem: Option<NodeId>,
        client: Option<(i32, i32)>,
        xpaths: Vec<String>,
    ) {
        if !self.guard.allows(&self.doc, elem.or(self.cursor.hovered)) {
            return;
        }
        // Headless capture leaves the native context menu alone.
        if !self.host_ui_present && action == ActionType::RightClick {
            log::debug!("Right click suppressed without host UI");
            return;
        }
        log::info!("Caught event: {:?}", action);
        let position = elem.map(|e| {
            let rect = self.doc.layout(e).unwrap_or_default();
            let (event_x, event_y) = client.unwrap_or((0, 0));
            Position {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                event_x,
                event_y,
            }
        });
        self.sink.dispatch(OutboundMessage::Action(ActionMessage {
            selectors,
            content: escape(content),
            node_type: node_type.to_string(),
            action,
            descriptor: descriptor.to_string(),
            elem_var_name: var_name.to_string(),
            iframe_info: self.frame.iframe_info(),
            position,
            no_console: !self.host_ui_present,
            mode: self.mode.as_str().to_string(),
            xpaths,
        }));
    }

    /// `{TAG}{indexAmongSameTag}-{random}`. Collisions across the page are
    /// tolerated; callers depend on best-effort, not strict uniqueness.
    fn create_var_name(&self, elem: NodeId) -> String {
        format!(
            "{}{}-{}",
            self.doc.tag_name(elem),
            self.doc.index_among_same_tag(elem),
            rand::thread_rng().gen_range(0..VAR_NAME_RANDOM_MAX)
        )
    }

    // ===== OUTLINE TIMERS =====

    /// Schedules a one-shot outline reset. Fire-and-forget: never cancelled,
    /// and firing against a since-detached element is a harmless write.
    pub fn schedule_outline_reset(&mut self, target: NodeId) {
        self.timers.push(OutlineTimer {
            target,
            due: Instant::now() + OUTLINE_RESET_DELAY,
        });
    }

    /// Fires every timer due at `now`. Pumped by the host's event turn.
    pub fn fire_due(&mut self, now: Instant) {
        let mut due = Vec::new();
        self.timers.retain(|timer| {
            if timer.due <= now {
                due.push(timer.target);
                false
            } else {
                true
            }
        });
        for target in due {
            self.doc.set_outline(target, "");
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
