use crate::error::StoreError;
use crate::runtime::types::{DocumentReport, UpsertOp};
use crate::types::CallbackTarget;
use reqwest::Client;
use serde::Deserialize;

pub async fn callback_fetch(
    client: &Client,
    callback_base: &str,
    callback_token: &str,
    path: &str,
    method: reqwest::Method,
    body: Option<serde_json::Value>,
) -> Result<reqwest::Response, String> {
    let url = format!("{callback_base}{path}");
    let mut builder = client
        .request(method, &url)
        .header("Authorization", format!("Bearer {callback_token}"));

    if let Some(json_body) = body {
        builder = builder.json(&json_body);
    }

    builder
        .send()
        .await
        .map_err(|e| format!("Request to {url} failed: {e}"))
}

pub(crate) async fn post_debug_log(
    client: &Client,
    callback_base: &str,
    callback_token: &str,
    level: &str,
    message: &str,
    context: Option<serde_json::Value>,
) {
    let body = serde_json::json!({
        "level": level,
        "message": message,
        "context": context,
    });

    let result = callback_fetch(
        client,
        callback_base,
        callback_token,
        "/api/callback/log",
        reqwest::Method::POST,
        Some(body),
    )
    .await;
    if let Err(err) = result {
        eprintln!(
            "[regtree][stderr] post_debug_log failed: level={} message={} err={}",
            level, message, err
        );
    }
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    id: i64,
}

/// Sends one upsert record and returns the surrogate id the receiver assigned.
/// A 409 answer is reported as a conflict so the caller can stop the document.
pub async fn post_upsert(
    client: &Client,
    target: &CallbackTarget,
    op: &UpsertOp,
) -> Result<i64, StoreError> {
    let body = serde_json::to_value(op).map_err(|e| StoreError::Backend(e.to_string()))?;
    let res = callback_fetch(
        client,
        &target.base,
        &target.token,
        "/api/callback/upsert",
        reqwest::Method::POST,
        Some(body),
    )
    .await
    .map_err(StoreError::Backend)?;

    let status = res.status();
    if status == reqwest::StatusCode::CONFLICT {
        let text = res.text().await.unwrap_or_default();
        return Err(StoreError::Conflict(format!(
            "Upsert {} rejected: {text}",
            op.kind()
        )));
    }
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(StoreError::Backend(format!(
            "Upsert {} callback failed ({status}): {text}",
            op.kind()
        )));
    }

    let parsed: UpsertResponse = res
        .json()
        .await
        .map_err(|e| StoreError::Backend(format!("Upsert {} response: {e}", op.kind())))?;
    Ok(parsed.id)
}

pub async fn post_document_progress(client: &Client, target: &CallbackTarget, report: &DocumentReport) {
    let body = serde_json::json!({
        "document": report.name,
        "status": report.status.as_str(),
        "division": report.division,
        "summary": report.summary,
        "warnings": report.warnings,
        "error": report.error,
        "errorKind": report.error_kind,
        "reportedAt": chrono::Utc::now().to_rfc3339(),
    });

    let result = callback_fetch(
        client,
        &target.base,
        &target.token,
        "/api/callback/progress",
        reqwest::Method::POST,
        Some(body),
    )
    .await;
    if let Err(err) = result {
        tracing::warn!("[regtree] Progress callback for {} failed: {}", report.name, err);
    }
}

pub async fn post_ingest_error(client: &Client, target: &CallbackTarget, error: &str) {
    let result = callback_fetch(
        client,
        &target.base,
        &target.token,
        "/api/callback/ingestError",
        reqwest::Method::POST,
        Some(serde_json::json!({ "error": error })),
    )
    .await;
    match result {
        Ok(res) if !res.status().is_success() => {
            tracing::warn!("[regtree] Ingest error callback answered {}", res.status());
        }
        Ok(_) => {}
        Err(err) => tracing::warn!("[regtree] Ingest error callback failed: {}", err),
    }
}
