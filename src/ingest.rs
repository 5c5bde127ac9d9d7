use crate::dialect::Dialect;
use crate::error::IngestError;
use crate::parser::parse_document;
use crate::runtime::callbacks::post_document_progress;
use crate::runtime::logging::{report_event, IngestEvent};
use crate::runtime::orchestrator::persist_document;
use crate::runtime::store::UpsertAdapter;
use crate::runtime::types::{BatchReport, DocumentReport, DocumentStatus, PersistSummary};
use crate::sources::DialectRegistry;
use crate::types::{CallbackTarget, DocumentEntry, IngestConfig, ParsedDocument};
use reqwest::Client;

/// Parses one document and, only if parsing succeeded, persists it. A parse
/// failure never touches the store.
pub async fn ingest_document(
    text: &str,
    dialect: &Dialect,
    store: &dyn UpsertAdapter,
) -> Result<(ParsedDocument, PersistSummary), IngestError> {
    let document = parse_document(text, dialect)?;
    let summary = persist_document(&document, store).await?;
    Ok((document, summary))
}

/// Runs every document of the batch independently; one document failing
/// does not stop the others.
pub async fn ingest_batch(
    client: &Client,
    config: &IngestConfig,
    registry: &DialectRegistry,
    store: &dyn UpsertAdapter,
) -> Result<BatchReport, IngestError> {
    let dialect = registry.get(&config.dialect)?;
    let target = config.callback();

    report_event(
        client,
        target.as_ref(),
        &IngestEvent::BatchStarted {
            dialect: &dialect.name,
            documents: config.documents.len(),
        },
    )
    .await;

    let mut report = BatchReport::default();
    for entry in &config.documents {
        let document_report = ingest_entry(client, target.as_ref(), entry, dialect, store).await;
        if let Some(target) = target.as_ref() {
            post_document_progress(client, target, &document_report).await;
        }
        report.documents.push(document_report);
    }

    report_event(
        client,
        target.as_ref(),
        &IngestEvent::BatchFinished {
            completed: report.completed(),
            failed: report.failed(),
        },
    )
    .await;
    Ok(report)
}

async fn ingest_entry(
    client: &Client,
    target: Option<&CallbackTarget>,
    entry: &DocumentEntry,
    dialect: &Dialect,
    store: &dyn UpsertAdapter,
) -> DocumentReport {
    match ingest_document(&entry.text, dialect, store).await {
        Ok((document, summary)) => {
            let division = document.division.number.as_str();
            for warning in &document.warnings {
                let event = IngestEvent::DocumentWarning {
                    document: &entry.name,
                    division,
                    warning,
                };
                report_event(client, target, &event).await;
            }
            let event = IngestEvent::DocumentStored {
                document: &entry.name,
                division,
                summary: &summary,
            };
            report_event(client, target, &event).await;
            DocumentReport {
                name: entry.name.clone(),
                status: DocumentStatus::Completed,
                division: Some(document.division.number.clone()),
                summary: Some(summary),
                warnings: document.warnings.iter().map(ToString::to_string).collect(),
                error: None,
                error_kind: None,
            }
        }
        Err(err) => {
            let event = IngestEvent::DocumentFailed {
                document: &entry.name,
                error: &err,
            };
            report_event(client, target, &event).await;
            DocumentReport {
                name: entry.name.clone(),
                status: DocumentStatus::Failed,
                division: None,
                summary: None,
                warnings: Vec::new(),
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
            }
        }
    }
}
