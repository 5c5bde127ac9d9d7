use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use regtree::ingest::ingest_batch;
use regtree::parser::parse_document;
use regtree::runtime::callbacks::post_ingest_error;
use regtree::runtime::http_store::HttpUpsertStore;
use regtree::runtime::jobs::IngestJobs;
use regtree::runtime::logging::{report_event, IngestEvent};
use regtree::runtime::sqlite::SqliteStore;
use regtree::runtime::store::UpsertAdapter;
use regtree::settings::Settings;
use regtree::sources::DialectRegistry;
use regtree::types::{IngestConfig, ParseRequest};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct AppState {
    registry: DialectRegistry,
    store: Arc<SqliteStore>,
    client: Client,
    jobs: Arc<IngestJobs>,
}

async fn handle_parse(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ParseRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let parsed = state
        .registry
        .get(&request.dialect)
        .and_then(|dialect| parse_document(&request.text, dialect));

    match parsed {
        Ok(document) => match serde_json::to_value(&document) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            ),
        },
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": err.to_string(), "kind": err.kind() })),
        ),
    }
}

async fn handle_ingest(
    State(state): State<Arc<AppState>>,
    Json(config): Json<IngestConfig>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Err(err) = state.registry.get(&config.dialect) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": err.to_string(), "kind": err.kind() })),
        );
    }

    let state_for_task = state.clone();
    state.jobs.spawn(async move {
        let state = state_for_task;
        let target = config.callback();
        let store: Arc<dyn UpsertAdapter> = match target.clone() {
            Some(target) => {
                Arc::new(HttpUpsertStore::new(state.client.clone(), target)) as Arc<dyn UpsertAdapter>
            }
            None => state.store.clone() as Arc<dyn UpsertAdapter>,
        };

        let result = ingest_batch(&state.client, &config, &state.registry, store.as_ref()).await;
        if let Err(err) = result {
            report_event(&state.client, target.as_ref(), &IngestEvent::BatchAborted { error: &err })
                .await;
            if let Some(target) = target.as_ref() {
                post_ingest_error(&state.client, target, &err.to_string()).await;
            }
        }
    });

    (StatusCode::OK, Json(json!({ "status": "accepted" })))
}

async fn handle_health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!("[regtree] {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let settings = Settings::from_env()?;
    let registry = DialectRegistry::load(&settings.dialects_file()).map_err(|e| e.to_string())?;
    let store = SqliteStore::open(&settings.db_path).map_err(|e| e.to_string())?;
    tracing::info!(
        "[regtree] Dialects: {}; database: {}",
        registry.names().join(", "),
        settings.db_path.display()
    );

    let state = Arc::new(AppState {
        registry,
        store: Arc::new(store),
        client: Client::new(),
        jobs: Arc::new(IngestJobs::new()),
    });

    let app = Router::new()
        .route("/parse", post(handle_parse))
        .route("/ingest", post(handle_ingest))
        .fallback(handle_health)
        .with_state(state.clone());

    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {addr}: {e}"))?;

    tracing::info!("[regtree] Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| format!("Server failed: {e}"))
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("[regtree] Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!(
        "[regtree] Shutting down with {} active ingest job(s) of {} started",
        state.jobs.active(),
        state.jobs.started()
    );
}
