//! Shared fixtures: an in-memory storage service served over real HTTP and a
//! UI that records everything it is told.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;

use crate::api::{HttpStorage, StorageApi};
use crate::config::ServerConfig;
use crate::i18n::{Catalog, Locale};
use crate::session::Session;
use crate::types::{DeleteRequest, Node, NodeId, RenameRequest, TransferRequest};
use crate::ui::{Surface, Ui};
use crate::view::{ListingView, PickerView};

/// One request as the mock service saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    /// Path plus query string.
    pub uri: String,
    /// JSON body, or the text fields of a multipart form.
    pub body: Value,
}

#[derive(Default)]
struct Inner {
    nodes: Mutex<BTreeMap<NodeId, Node>>,
    files: Mutex<HashMap<NodeId, Vec<u8>>>,
    log: Mutex<Vec<Recorded>>,
    failing: Mutex<HashSet<String>>,
    progress_script: Mutex<Vec<u8>>,
    progress: Mutex<HashMap<String, mpsc::Sender<u8>>>,
    hold_upload: Mutex<Option<Arc<Notify>>>,
    bare_ack: Mutex<bool>,
}

/// In-memory stand-in for the storage service.
#[derive(Clone, Default)]
pub struct MockStorage {
    inner: Arc<Inner>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// `/` with `docs/` (#5) and `a.txt` (#6, 120 bytes) at the top level.
    pub fn with_sample_tree() -> Self {
        let mock = Self::new();
        mock.add_dir(5, "docs", None);
        mock.add_file(6, "a.txt", None, vec![b'x'; 120]);
        mock
    }

    pub fn add_dir(&self, id: NodeId, name: &str, parent: Option<NodeId>) {
        self.insert(Node { id: Some(id), name: name.into(), is_dir: true, parent_id: parent, ..Default::default() });
    }

    pub fn add_file(&self, id: NodeId, name: &str, parent: Option<NodeId>, bytes: Vec<u8>) {
        self.insert(Node {
            id: Some(id),
            name: name.into(),
            is_dir: false,
            size: Some(bytes.len() as u64),
            parent_id: parent,
            ..Default::default()
        });
        self.inner.files.lock().unwrap().insert(id, bytes);
    }

    pub fn remove(&self, id: NodeId) {
        self.inner.nodes.lock().unwrap().remove(&id);
    }

    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.inner.nodes.lock().unwrap().get(&id).cloned()
    }

    /// Every request whose path starts with `path` answers 500.
    pub fn fail(&self, path: &str) {
        self.inner.failing.lock().unwrap().insert(path.to_string());
    }

    /// Percentages pushed on the progress stream while an upload is handled.
    pub fn script_progress(&self, values: &[u8]) {
        *self.inner.progress_script.lock().unwrap() = values.to_vec();
    }

    /// Uploads wait for [`release_upload`](Self::release_upload) before answering.
    pub fn hold_uploads(&self) {
        *self.inner.hold_upload.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_upload(&self) {
        if let Some(n) = self.inner.hold_upload.lock().unwrap().as_ref() {
            n.notify_one();
        }
    }

    /// JSON action endpoints answer with a plain-text body.
    pub fn bare_acknowledgments(&self) {
        *self.inner.bare_ack.lock().unwrap() = true;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.log.lock().unwrap().clone()
    }

    /// Requests to exactly `method uri`.
    pub fn requests_to(&self, method: &str, uri: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method == method && r.uri == uri).collect()
    }

    pub fn count(&self, method: &str, uri: &str) -> usize {
        self.requests_to(method, uri).len()
    }

    fn insert(&self, node: Node) {
        let id = node.id.expect("mock nodes carry ids");
        self.inner.nodes.lock().unwrap().insert(id, node);
    }

    fn record(&self, method: &'static str, uri: &Uri, body: Value) {
        let uri = uri.path_and_query().map(|p| p.to_string()).unwrap_or_default();
        self.inner.log.lock().unwrap().push(Recorded { method, uri, body });
    }

    fn failing(&self, uri: &Uri) -> bool {
        self.inner.failing.lock().unwrap().iter().any(|p| uri.path().starts_with(p.as_str()))
    }

    fn listing(&self, id: Option<NodeId>) -> Option<Node> {
        let nodes = self.inner.nodes.lock().unwrap();
        let mut node = match id {
            None => Node { id: None, name: "/".into(), is_dir: true, path: Some("/".into()), ..Default::default() },
            Some(id) => nodes.get(&id)?.clone(),
        };
        if node.is_dir {
            let children = nodes.values().filter(|n| n.parent_id == id).cloned().collect();
            node.children = Some(children);
        }
        Some(node)
    }

    fn next_id(&self) -> NodeId {
        self.inner.nodes.lock().unwrap().keys().max().copied().unwrap_or(0) + 1
    }

    fn ack(&self, body: Value) -> Response {
        if *self.inner.bare_ack.lock().unwrap() {
            (StatusCode::OK, "ok").into_response()
        } else {
            (StatusCode::OK, Json(body)).into_response()
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/node/", get(get_root))
            .route("/node/{id}", get(get_node))
            .route("/file/{id}", get(get_file))
            .route("/upload", post(upload))
            .route("/upload/progress", get(upload_progress))
            .route("/copy", post(copy))
            .route("/move", post(move_node))
            .route("/rename", post(rename))
            .route("/delete", post(delete))
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on an ephemeral port; returns the base URL.
    pub async fn serve(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "injected failure").into_response()
}

async fn get_root(State(mock): State<MockStorage>, uri: Uri) -> Response {
    mock.record("GET", &uri, Value::Null);
    if mock.failing(&uri) {
        return server_error();
    }
    Json(mock.listing(None)).into_response()
}

async fn get_node(State(mock): State<MockStorage>, Path(id): Path<NodeId>, uri: Uri) -> Response {
    mock.record("GET", &uri, Value::Null);
    if mock.failing(&uri) {
        return server_error();
    }
    match mock.listing(Some(id)) {
        Some(node) => Json(node).into_response(),
        None => (StatusCode::NOT_FOUND, "node not found").into_response(),
    }
}

async fn get_file(
    State(mock): State<MockStorage>,
    Path(id): Path<NodeId>,
    Query(_q): Query<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    mock.record("GET", &uri, Value::Null);
    match mock.inner.files.lock().unwrap().get(&id) {
        Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "file not found").into_response(),
    }
}

async fn upload(State(mock): State<MockStorage>, uri: Uri, mut multipart: Multipart) -> Response {
    let mut fields = serde_json::Map::new();
    let mut file_len = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            file_len = Some(field.bytes().await.unwrap().len());
        } else {
            fields.insert(name, Value::String(field.text().await.unwrap()));
        }
    }
    if let Some(len) = file_len {
        fields.insert("file_len".into(), json!(len));
    }
    let form = Value::Object(fields);
    mock.record("POST", &uri, form.clone());
    if mock.failing(&uri) {
        return server_error();
    }

    let upload_id = form["upload_id"].as_str().map(str::to_string);
    let sender = upload_id.as_ref().and_then(|id| mock.inner.progress.lock().unwrap().remove(id));
    if let Some(tx) = sender {
        let script = mock.inner.progress_script.lock().unwrap().clone();
        for pct in script {
            let _ = tx.send(pct).await;
        }
        let hold = mock.inner.hold_upload.lock().unwrap().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        // give the client a moment to drain and hang up
        let _ = tokio::time::timeout(Duration::from_millis(500), tx.closed()).await;
    }

    let name = form["filename"].as_str().unwrap_or_default().to_string();
    let is_dir = form["is_dir"].as_str() == Some("true");
    let parent = form["oya_id"].as_str().and_then(|s| s.parse().ok());
    let id = mock.next_id();
    if is_dir {
        mock.add_dir(id, &name, parent);
    } else {
        mock.add_file(id, &name, parent, vec![0; file_len.unwrap_or(0)]);
    }
    Json(json!({"success": true, "node_id": id, "name": name})).into_response()
}

async fn upload_progress(
    State(mock): State<MockStorage>,
    Query(q): Query<HashMap<String, String>>,
    uri: Uri,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    mock.record("GET", &uri, Value::Null);
    if mock.failing(&uri) {
        return Err(server_error());
    }
    let Some(upload_id) = q.get("upload_id").cloned() else {
        return Err((StatusCode::BAD_REQUEST, "upload_id query parameter is required").into_response());
    };
    let (tx, rx) = mpsc::channel(16);
    mock.inner.progress.lock().unwrap().insert(upload_id, tx);
    let stream = ReceiverStream::new(rx).map(|pct| Ok::<_, Infallible>(Event::default().data(pct.to_string())));
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(10)).text("keep-alive")))
}

async fn copy(State(mock): State<MockStorage>, uri: Uri, Json(req): Json<TransferRequest>) -> Response {
    mock.record("POST", &uri, serde_json::to_value(&req).unwrap());
    if mock.failing(&uri) {
        return server_error();
    }
    let Some(src) = mock.node(req.src_id) else {
        return (StatusCode::NOT_FOUND, "source not found").into_response();
    };
    let id = mock.next_id();
    mock.insert(Node { id: Some(id), parent_id: Some(req.dst_id), ..src.clone() });
    mock.ack(json!({ "name": src.name }))
}

async fn move_node(State(mock): State<MockStorage>, uri: Uri, Json(req): Json<TransferRequest>) -> Response {
    mock.record("POST", &uri, serde_json::to_value(&req).unwrap());
    if mock.failing(&uri) {
        return server_error();
    }
    let Some(mut src) = mock.node(req.src_id) else {
        return (StatusCode::NOT_FOUND, "source not found").into_response();
    };
    src.parent_id = Some(req.dst_id);
    let name = src.name.clone();
    mock.insert(src);
    mock.ack(json!({ "name": name }))
}

async fn rename(State(mock): State<MockStorage>, uri: Uri, Json(req): Json<RenameRequest>) -> Response {
    mock.record("POST", &uri, serde_json::to_value(&req).unwrap());
    if mock.failing(&uri) {
        return server_error();
    }
    let Some(mut node) = mock.node(req.src_id) else {
        return (StatusCode::NOT_FOUND, "node not found").into_response();
    };
    node.name = req.new_name.clone();
    mock.insert(node);
    mock.ack(json!({ "success": true }))
}

async fn delete(State(mock): State<MockStorage>, uri: Uri, Json(req): Json<DeleteRequest>) -> Response {
    mock.record("POST", &uri, serde_json::to_value(&req).unwrap());
    if mock.failing(&uri) {
        return server_error();
    }
    mock.remove(req.src_id);
    mock.ack(json!({ "success": true }))
}

/// Everything a [`RecordingUi`] was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Listing(ListingView),
    Error(String),
    Status(String),
    Alert(String),
    Confirm(String),
    Picker(PickerView),
    Progress(u8),
    Controls(bool),
    CloseModal,
}

#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    answers: Mutex<VecDeque<bool>>,
}

impl RecordingUi {
    /// Queue the answer for the next confirmation prompt. Unqueued prompts
    /// are declined.
    pub fn answer(&self, yes: bool) {
        self.answers.lock().unwrap().push_back(yes);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn last_listing(&self) -> Option<ListingView> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Listing(v) => Some(v),
            _ => None,
        })
    }

    pub fn last_picker(&self) -> Option<PickerView> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Picker(v) => Some(v),
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events().into_iter().filter_map(|e| match e {
            UiEvent::Alert(m) => Some(m),
            _ => None,
        }).collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events().into_iter().filter_map(|e| match e {
            UiEvent::Status(m) => Some(m),
            _ => None,
        }).collect()
    }

    pub fn confirms(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, UiEvent::Confirm(_))).count()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events().into_iter().filter_map(|e| match e {
            UiEvent::Progress(p) => Some(p),
            _ => None,
        }).collect()
    }

    pub fn controls(&self) -> Vec<bool> {
        self.events().into_iter().filter_map(|e| match e {
            UiEvent::Controls(c) => Some(c),
            _ => None,
        }).collect()
    }

    pub fn modal_closes(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, UiEvent::CloseModal)).count()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Ui for RecordingUi {
    fn show_listing(&self, view: &ListingView) {
        self.push(UiEvent::Listing(view.clone()));
    }
    fn show_error(&self, message: &str) {
        self.push(UiEvent::Error(message.to_string()));
    }
    fn set_status(&self, message: &str) {
        self.push(UiEvent::Status(message.to_string()));
    }
    fn alert(&self, message: &str) {
        self.push(UiEvent::Alert(message.to_string()));
    }
    fn confirm(&self, message: &str) -> bool {
        self.push(UiEvent::Confirm(message.to_string()));
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
    fn show_picker(&self, view: &PickerView) {
        self.push(UiEvent::Picker(view.clone()));
    }
    fn show_progress(&self, percent: u8) {
        self.push(UiEvent::Progress(percent));
    }
    fn set_controls_enabled(&self, enabled: bool) {
        self.push(UiEvent::Controls(enabled));
    }
    fn close_modal(&self) {
        self.push(UiEvent::CloseModal);
    }
}

/// Live mock service plus a client session wired to it.
pub struct Harness {
    pub mock: MockStorage,
    pub ui: Arc<RecordingUi>,
    pub api: Arc<dyn StorageApi>,
    pub surface: Surface,
    pub session: Session,
}

impl Harness {
    pub async fn start(mock: MockStorage) -> Self {
        let base_url = mock.serve().await;
        let api: Arc<dyn StorageApi> = Arc::new(
            HttpStorage::new(&ServerConfig { base_url, request_timeout_secs: 5, connect_timeout_secs: 5 }).unwrap(),
        );
        let ui = Arc::new(RecordingUi::default());
        let surface = Surface::new(ui.clone(), Arc::new(Catalog::new(Locale::En)));
        let session = Session::new(api.clone(), surface.clone(), Duration::ZERO);
        Self { mock, ui, api, surface, session }
    }
}

/// Poll `cond` until it holds, panicking after a few seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
