//! Integration tests for the event classification state machine and the
//! outbound action contract.

use page_recorder::{
    ActionMessage, ActionType, Document, DomEvent, FrameContext, JsonInspector, Key, LayoutRect,
    MouseButton, NodeId, OutboundMessage, Recorder,
};
use tokio::sync::mpsc;

struct Fixture {
    recorder: Recorder<mpsc::UnboundedSender<OutboundMessage>>,
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
    body: NodeId,
    buttons: [NodeId; 3],
    select: NodeId,
    checkbox: NodeId,
    text_input: NodeId,
    editable: NodeId,
    console_button: NodeId,
}

/// A page with three buttons, form controls, a contenteditable div, and the
/// recorder's own console subtree.
fn fixture(frame: FrameContext) -> Fixture {
    let mut doc = Document::new();
    let html = doc.create_element("html");
    let body = doc.create_element("body");
    doc.append_child(html, body);

    let mut buttons = [NodeId(0); 3];
    for (i, slot) in buttons.iter_mut().enumerate() {
        let button = doc.create_element("button");
        doc.append_child(body, button);
        doc.set_text(button, "Go");
        doc.set_layout(
            button,
            LayoutRect {
                x: 10.0 * (i as f64 + 1.0),
                y: 20.0,
                width: 80.0,
                height: 24.0,
            },
        );
        *slot = button;
    }

    let select = doc.create_element("select");
    doc.append_child(body, select);

    let checkbox = doc.create_element("input");
    doc.append_child(body, checkbox);
    doc.set_attribute(checkbox, "type", "checkbox");

    let text_input = doc.create_element("input");
    doc.append_child(body, text_input);
    doc.set_attribute(text_input, "type", "text");

    let editable = doc.create_element("div");
    doc.append_child(body, editable);
    doc.set_attribute(editable, "contenteditable", "true");
    doc.set_inner_html(editable, "<b>edited</b>");

    let console = doc.create_element("div");
    doc.append_child(body, console);
    doc.set_attribute(console, "id", "recorder-console-container");
    let console_button = doc.create_element("button");
    doc.append_child(console, console_button);

    let (tx, rx) = mpsc::unbounded_channel();
    let recorder = Recorder::new(doc, Box::new(JsonInspector::new()), tx, frame);
    Fixture {
        recorder,
        rx,
        body,
        buttons,
        select,
        checkbox,
        text_input,
        editable,
        console_button,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<ActionMessage> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let OutboundMessage::Action(action) = message {
            out.push(action);
        }
    }
    out
}

fn pointer_down(target: NodeId, x: i32, y: i32) -> DomEvent {
    DomEvent::PointerDown {
        target,
        button: MouseButton::Primary,
        screen_x: x,
        screen_y: y,
        client_x: x,
        client_y: y,
    }
}

fn pointer_up(target: NodeId, x: i32, y: i32) -> DomEvent {
    DomEvent::PointerUp {
        target,
        button: MouseButton::Primary,
        screen_x: x,
        screen_y: y,
        client_x: x,
        client_y: y,
    }
}

#[test]
fn test_drag_deadzone_suppresses_small_deltas() {
    for (dx, dy) in [(0, 0), (9, 9), (-9, 5), (5, -9), (-9, -9)] {
        let mut f = fixture(FrameContext::top("example.com", "/"));
        f.recorder.start_recording(false);
        f.recorder.handle_event(pointer_down(f.buttons[0], 100, 100));
        f.recorder
            .handle_event(pointer_up(f.buttons[0], 100 + dx, 100 + dy));
        let actions = drain(&mut f.rx);
        assert!(
            actions.iter().all(|a| a.action != ActionType::Drag),
            "delta ({}, {}) must not produce a drag",
            dx,
            dy
        );
    }
}

#[test]
fn test_drag_outside_deadzone_emits_exactly_one_drag() {
    for (dx, dy) in [(10, 0), (0, -10), (15, -3), (-40, 40)] {
        let mut f = fixture(FrameContext::top("example.com", "/"));
        f.recorder.start_recording(false);
        f.recorder.handle_event(pointer_down(f.buttons[0], 100, 100));
        f.recorder
            .handle_event(pointer_up(f.buttons[0], 100 + dx, 100 + dy));
        let drags: Vec<_> = drain(&mut f.rx)
            .into_iter()
            .filter(|a| a.action == ActionType::Drag)
            .collect();
        assert_eq!(drags.len(), 1, "delta ({}, {}) must drag once", dx, dy);
        assert_eq!(drags[0].content, format!("{}x{}", dx, dy));
    }
}

#[test]
fn test_click_scenario_on_third_button() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    let button = f.buttons[2];
    f.recorder.handle_event(pointer_down(button, 30, 20));
    f.recorder.handle_event(pointer_up(button, 30, 20));

    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1, "same-coordinate up must not add a drag");
    let click = &actions[0];
    assert_eq!(click.action, ActionType::Click);
    assert_eq!(click.node_type, "BUTTON");
    assert_eq!(click.content, "Go");
    assert_eq!(click.mode, "rpf");
    assert!(click.no_console);

    let position = click.position.expect("click carries a position");
    assert_eq!(position.x, 30.0);
    assert_eq!(position.width, 80.0);
    assert_eq!((position.event_x, position.event_y), (30, 20));

    // BUTTON2-<0..998>: third button among four page buttons, but the
    // console button comes later in document order.
    let (prefix, suffix) = click
        .elem_var_name
        .split_once('-')
        .expect("var name has a random suffix");
    assert_eq!(prefix, "BUTTON2");
    let suffix: u32 = suffix.parse().expect("numeric suffix");
    assert!(suffix < 999);

    assert_eq!(click.selectors.len(), 2);
    assert_eq!(click.xpaths, vec!["/html/body/button[3]".to_string()]);
}

#[test]
fn test_select_defers_click_to_change_handler() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder.handle_event(pointer_down(f.select, 50, 50));
    assert!(
        drain(&mut f.rx).is_empty(),
        "pointer-down on a select must not click"
    );

    f.recorder.document_mut().set_value(f.select, "red");
    f.recorder.handle_event(DomEvent::ValueChange { target: f.select });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::Select);
    assert_eq!(actions[0].content, "red");
}

#[test]
fn test_checkbox_and_radio_changes_are_discarded() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder
        .handle_event(DomEvent::ValueChange { target: f.checkbox });
    f.recorder
        .document_mut()
        .set_attribute(f.checkbox, "type", "radio");
    f.recorder
        .handle_event(DomEvent::ValueChange { target: f.checkbox });
    assert!(drain(&mut f.rx).is_empty());
}

#[test]
fn test_text_input_change_is_a_type_action() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder
        .document_mut()
        .set_value(f.text_input, "hello world");
    f.recorder
        .handle_event(DomEvent::ValueChange { target: f.text_input });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::Type);
    // Content travels escaped.
    assert_eq!(actions[0].content, "hello%20world");
}

#[test]
fn test_guarded_subtree_produces_no_messages() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(true);
    f.recorder
        .handle_event(pointer_down(f.console_button, 10, 10));
    f.recorder.handle_event(pointer_up(f.console_button, 60, 60));
    f.recorder.handle_event(DomEvent::DoubleClick {
        target: f.console_button,
        client_x: 10,
        client_y: 10,
    });
    f.recorder
        .handle_event(DomEvent::Submit { target: f.console_button });
    assert!(drain(&mut f.rx).is_empty());
}

#[test]
fn test_rightclick_needs_host_ui() {
    let right_down = |target| DomEvent::PointerDown {
        target,
        button: MouseButton::Secondary,
        screen_x: 10,
        screen_y: 10,
        client_x: 10,
        client_y: 10,
    };

    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder.handle_event(right_down(f.buttons[0]));
    assert!(drain(&mut f.rx).is_empty(), "headless capture drops rightclick");

    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(true);
    f.recorder.handle_event(right_down(f.buttons[0]));
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::RightClick);
}

#[test]
fn test_enter_emits_synthetic_action_without_element() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder.handle_event(DomEvent::KeyDown { key: Key::Enter });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    let enter = &actions[0];
    assert_eq!(enter.action, ActionType::Enter);
    assert!(enter.selectors.is_empty());
    assert!(enter.descriptor.is_empty());
    assert!(enter.node_type.is_empty());
    assert!(enter.position.is_none());
    assert!(enter.xpaths.is_empty());
}

#[test]
fn test_shift_toggles_hover_preview_without_emitting() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(true);
    assert!(f.recorder.cursor().hover_preview);
    f.recorder.handle_event(DomEvent::KeyDown { key: Key::Shift });
    assert!(!f.recorder.cursor().hover_preview);
    assert!(drain(&mut f.rx).is_empty());

    // With preview paused, hovering must not refresh suggestions.
    f.recorder
        .handle_event(DomEvent::PointerOver { target: f.buttons[0] });
    assert!(f.recorder.suggestions().is_none());

    f.recorder.handle_event(DomEvent::KeyDown { key: Key::Shift });
    f.recorder
        .handle_event(DomEvent::PointerOver { target: f.buttons[1] });
    assert_eq!(f.recorder.suggestions().unwrap().target, f.buttons[1]);
}

#[test]
fn test_double_click_uses_hovered_element() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder
        .handle_event(DomEvent::PointerOver { target: f.buttons[1] });
    f.recorder.handle_event(DomEvent::DoubleClick {
        target: f.body,
        client_x: 5,
        client_y: 5,
    });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::DoubleClick);
    assert_eq!(actions[0].node_type, "BUTTON");
}

#[test]
fn test_submit_always_has_empty_content() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    f.recorder
        .handle_event(DomEvent::Submit { target: f.text_input });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::Submit);
    assert_eq!(actions[0].content, "");
}

#[test]
fn test_contenteditable_blur_replaces_html() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(false);
    // Blur on a plain element is ignored.
    f.recorder.handle_event(DomEvent::Blur { target: f.buttons[0] });
    assert!(drain(&mut f.rx).is_empty());

    f.recorder.handle_event(DomEvent::Blur { target: f.editable });
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action, ActionType::ReplaceHtml);
    assert_eq!(actions[0].content, "%3Cb%3Eedited%3C/b%3E");
}

#[test]
fn test_nested_frame_attaches_iframe_info() {
    let mut f = fixture(FrameContext::nested("shop.example.com", "/cart"));
    f.recorder.start_recording(false);
    f.recorder.handle_event(pointer_down(f.buttons[0], 10, 10));
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    let info = actions[0].iframe_info.as_ref().expect("nested frame info");
    assert_eq!(info.host, "shop.example.com");
    assert_eq!(info.pathname, "/cart");

    // Nested frames never announce the page load.
    f.recorder.announce_page_loaded();
    assert!(f.rx.try_recv().is_err());
}

#[test]
fn test_saved_override_rides_along_with_actions() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.start_recording(true);
    f.recorder
        .handle_event(DomEvent::PointerOver { target: f.buttons[0] });
    f.recorder
        .save_locator_override("//button[contains(@class,\"cta\")]")
        .unwrap();

    f.recorder.handle_event(pointer_down(f.buttons[0], 10, 10));
    let actions = drain(&mut f.rx);
    assert_eq!(actions.len(), 1);
    assert_eq!(
        actions[0].xpaths,
        vec!["//button[contains(@class,\"cta\")]".to_string()]
    );
}

#[test]
fn test_updater_mode_records_no_clicks() {
    let mut f = fixture(FrameContext::top("example.com", "/"));
    f.recorder.enter_updater_mode();
    f.recorder.handle_event(pointer_down(f.buttons[0], 10, 10));
    f.recorder
        .handle_event(DomEvent::ValueChange { target: f.text_input });
    assert!(drain(&mut f.rx).is_empty());

    // Hover inspection still works and feeds the dialog surface.
    f.recorder
        .handle_event(DomEvent::PointerOver { target: f.buttons[0] });
    assert_eq!(f.recorder.suggestions().unwrap().target, f.buttons[0]);
    assert_eq!(
        f.recorder.suggestions().unwrap().xpath,
        "/html/body/button[1]"
    );
}
