#![allow(dead_code)]
use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use regtree::dialect::Dialect;
use regtree::sources::{dialect_for, DialectKind};
use regtree::types::{CallbackTarget, Paragraph};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const CALLBACK_TOKEN: &str = "test-token";

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(filename: &str) -> String {
    let path = Path::new(&fixtures_dir()).join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn cfr() -> &'static Dialect {
    dialect_for(DialectKind::Cfr)
}

pub fn finra() -> &'static Dialect {
    dialect_for(DialectKind::Finra)
}

/// (label, level, parent label) triples, for compact tree assertions.
pub fn shape(paragraphs: &[Paragraph]) -> Vec<(String, u8, Option<String>)> {
    paragraphs
        .iter()
        .map(|p| {
            (
                p.label.clone(),
                p.level,
                p.parent.map(|parent| paragraphs[parent].label.clone()),
            )
        })
        .collect()
}

#[derive(Clone, Default)]
struct CallbackState {
    upserts: Arc<Mutex<Vec<Value>>>,
    progress: Arc<Mutex<Vec<Value>>>,
    logs: Arc<Mutex<Vec<Value>>>,
    errors: Arc<Mutex<Vec<Value>>>,
    ids: Arc<Mutex<HashMap<String, i64>>>,
    unauthorized: Arc<Mutex<usize>>,
}

/// Local stand-in for the callback host: assigns ids per natural key and
/// records every request body.
pub struct CallbackServer {
    pub base: String,
    upserts: Arc<Mutex<Vec<Value>>>,
    progress: Arc<Mutex<Vec<Value>>>,
    logs: Arc<Mutex<Vec<Value>>>,
    errors: Arc<Mutex<Vec<Value>>>,
    unauthorized: Arc<Mutex<usize>>,
}

impl CallbackServer {
    pub fn target(&self) -> CallbackTarget {
        CallbackTarget {
            base: self.base.clone(),
            token: CALLBACK_TOKEN.to_string(),
        }
    }

    pub fn upserts(&self) -> Vec<Value> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<Value> {
        self.progress.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<Value> {
        self.logs.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Value> {
        self.errors.lock().unwrap().clone()
    }

    pub fn unauthorized(&self) -> usize {
        *self.unauthorized.lock().unwrap()
    }
}

const NON_KEY_FIELDS: [&str; 5] = ["title", "body", "authority", "source", "position"];

fn authorized(state: &CallbackState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {CALLBACK_TOKEN}");
    let ok = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !ok {
        *state.unauthorized.lock().unwrap() += 1;
    }
    ok
}

async fn upsert(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
    }
    state.upserts.lock().unwrap().push(body.clone());

    if body.get("number").and_then(Value::as_str) == Some("409") {
        return (StatusCode::CONFLICT, Json(json!({ "error": "taken" })));
    }

    let mut key = body.clone();
    if let Some(object) = key.as_object_mut() {
        for field in NON_KEY_FIELDS {
            object.remove(field);
        }
    }
    let mut ids = state.ids.lock().unwrap();
    let next = ids.len() as i64 + 1;
    let id = *ids.entry(key.to_string()).or_insert(next);
    (StatusCode::OK, Json(json!({ "id": id })))
}

async fn progress(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.progress.lock().unwrap().push(body);
    StatusCode::OK
}

async fn log(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.logs.lock().unwrap().push(body);
    StatusCode::OK
}

async fn ingest_error(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED;
    }
    state.errors.lock().unwrap().push(body);
    StatusCode::OK
}

pub async fn spawn_callback_server() -> CallbackServer {
    let state = CallbackState::default();
    let server = CallbackServer {
        base: String::new(),
        upserts: state.upserts.clone(),
        progress: state.progress.clone(),
        logs: state.logs.clone(),
        errors: state.errors.clone(),
        unauthorized: state.unauthorized.clone(),
    };

    let app = Router::new()
        .route("/api/callback/upsert", post(upsert))
        .route("/api/callback/progress", post(progress))
        .route("/api/callback/log", post(log))
        .route("/api/callback/ingestError", post(ingest_error))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind callback server");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Callback server failed");
    });

    CallbackServer {
        base: format!("http://{addr}"),
        ..server
    }
}
