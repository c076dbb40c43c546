//! HTTP Harness
//!
//! Exposes one recording-engine instance to a host process: load a page
//! description, drive the session, feed raw events, poll recorded actions,
//! and run verification commands. This is a demo host surface; the engine's
//! contract is the library API, not these routes.

use crate::descriptor::JsonInspector;
use crate::dom::{Document, NodeSpec};
use crate::record::engine::{FrameContext, Recorder};
use crate::record::events::DomEvent;
use crate::record::message::OutboundMessage;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use warp::Filter;

/// Shared harness state: the engine plus the receiving end of its outbound
/// channel, drained by `GET /actions`.
pub struct AppState {
    recorder: Mutex<Recorder<mpsc::UnboundedSender<OutboundMessage>>>,
    outbound: Mutex<mpsc::UnboundedReceiver<OutboundMessage>>,
}

impl AppState {
    pub fn new(frame: FrameContext) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Recorder::new(Document::new(), Box::new(JsonInspector::new()), tx, frame);
        Arc::new(Self {
            recorder: Mutex::new(recorder),
            outbound: Mutex::new(rx),
        })
    }

    /// Swaps in a freshly loaded page snapshot and announces it. Returns the
    /// element count.
    pub async fn load_page(&self, spec: &NodeSpec) -> usize {
        let mut recorder = self.recorder.lock().await;
        let doc = Document::from_spec(spec);
        let nodes = doc.all_elements().len();
        recorder.set_document(doc);
        recorder.announce_page_loaded();
        log::info!("Page loaded with {} elements", nodes);
        nodes
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest {
    #[serde(default)]
    host_ui_present: bool,
}

/// All harness routes.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    let with_state = warp::any().map(move || state.clone());

    let page = warp::path("page")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(handle_page);

    let record_start = warp::path!("record" / "start")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(handle_record_start);

    let record_stop = warp::path!("record" / "stop")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(handle_record_stop);

    let updater_start = warp::path!("updater" / "start")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(handle_updater_start);

    let updater_stop = warp::path!("updater" / "stop")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(handle_updater_stop);

    let event = warp::path("event")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(handle_event);

    let command = warp::path("command")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(handle_command);

    let actions = warp::path("actions")
        .and(warp::get())
        .and(with_state)
        .and_then(handle_actions);

    health
        .or(page)
        .or(record_start)
        .or(record_stop)
        .or(updater_start)
        .or(updater_stop)
        .or(event)
        .or(command)
        .or(actions)
}

async fn handle_page(
    spec: NodeSpec,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let nodes = state.load_page(&spec).await;
    Ok(warp::reply::json(&serde_json::json!({
        "status": "ok",
        "nodes": nodes,
    })))
}

async fn handle_record_start(
    req: StartRequest,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.start_recording(req.host_ui_present);
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

async fn handle_record_stop(state: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.stop_recording();
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

async fn handle_updater_start(state: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.enter_updater_mode();
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

async fn handle_updater_stop(state: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.end_updater_mode();
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

async fn handle_event(
    event: DomEvent,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.handle_event(event);
    // Each harness turn also pumps the one-shot outline timers.
    recorder.fire_due(Instant::now());
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

async fn handle_command(
    raw: serde_json::Value,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut recorder = state.recorder.lock().await;
    recorder.fire_due(Instant::now());
    match recorder.handle_command(&raw) {
        Some(response) => Ok(warp::reply::json(&response)),
        // The engine sends no response for unknown commands; the transport
        // still has to answer the HTTP request.
        None => Ok(warp::reply::json(&serde_json::json!({ "ignored": true }))),
    }
}

async fn handle_actions(state: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let mut outbound = state.outbound.lock().await;
    let mut drained = Vec::new();
    while let Ok(message) = outbound.try_recv() {
        drained.push(message);
    }
    Ok(warp::reply::json(&drained))
}
