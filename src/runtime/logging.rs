use crate::error::{IngestError, ParseWarning};
use crate::runtime::callbacks::post_debug_log;
use crate::runtime::types::PersistSummary;
use crate::types::CallbackTarget;
use reqwest::Client;
use reqwest::Url;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Something that happened while ingesting a batch, with the structural
/// context (document, division, section) it concerns.
#[derive(Debug)]
pub enum IngestEvent<'a> {
    BatchStarted {
        dialect: &'a str,
        documents: usize,
    },
    DocumentStored {
        document: &'a str,
        division: &'a str,
        summary: &'a PersistSummary,
    },
    DocumentWarning {
        document: &'a str,
        division: &'a str,
        warning: &'a ParseWarning,
    },
    DocumentFailed {
        document: &'a str,
        error: &'a IngestError,
    },
    BatchFinished {
        completed: usize,
        failed: usize,
    },
    BatchAborted {
        error: &'a IngestError,
    },
}

impl IngestEvent<'_> {
    pub fn level(&self) -> LogLevel {
        match self {
            IngestEvent::BatchStarted { .. }
            | IngestEvent::DocumentStored { .. }
            | IngestEvent::BatchFinished { .. } => LogLevel::Info,
            IngestEvent::DocumentWarning { .. } => LogLevel::Warn,
            IngestEvent::DocumentFailed { .. } | IngestEvent::BatchAborted { .. } => {
                LogLevel::Error
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IngestEvent::BatchStarted { .. } => "batch_started",
            IngestEvent::DocumentStored { .. } => "document_stored",
            IngestEvent::DocumentWarning { .. } => "document_warning",
            IngestEvent::DocumentFailed { .. } => "document_failed",
            IngestEvent::BatchFinished { .. } => "batch_finished",
            IngestEvent::BatchAborted { .. } => "batch_aborted",
        }
    }

    pub fn message(&self) -> String {
        match self {
            IngestEvent::BatchStarted { dialect, documents } => {
                format!("Starting ingest of {documents} document(s) with dialect {dialect}")
            }
            IngestEvent::DocumentStored {
                document,
                division,
                summary,
            } => format!(
                "{document}: division {division} stored ({} sections, {} paragraphs, {} supplementary units)",
                summary.sections, summary.paragraphs, summary.supplementary_units
            ),
            IngestEvent::DocumentWarning {
                document,
                division,
                warning,
            } => format!("{document}: division {division}: {warning}"),
            IngestEvent::DocumentFailed { document, error } => {
                format!("{document} failed ({}): {error}", error.kind())
            }
            IngestEvent::BatchFinished { completed, failed } => {
                format!("Ingest complete: {completed} completed, {failed} failed")
            }
            IngestEvent::BatchAborted { error } => format!("Ingest aborted: {error}"),
        }
    }

    pub fn context(&self) -> Value {
        let mut context = match self {
            IngestEvent::BatchStarted { dialect, documents } => {
                json!({ "dialect": dialect, "documents": documents })
            }
            IngestEvent::DocumentStored {
                document,
                division,
                summary,
            } => json!({ "document": document, "division": division, "summary": summary }),
            IngestEvent::DocumentWarning {
                document,
                division,
                warning,
            } => json!({ "document": document, "division": division, "warning": warning }),
            IngestEvent::DocumentFailed { document, error } => {
                json!({ "document": document, "errorKind": error.kind(), "error": error.to_string() })
            }
            IngestEvent::BatchFinished { completed, failed } => {
                json!({ "completed": completed, "failed": failed })
            }
            IngestEvent::BatchAborted { error } => {
                json!({ "errorKind": error.kind(), "error": error.to_string() })
            }
        };
        if let Some(object) = context.as_object_mut() {
            object.insert("event".to_string(), json!(self.name()));
        }
        context
    }
}

pub fn is_local_callback_base(callback_base: &str) -> bool {
    let host = match Url::parse(callback_base) {
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(_) => callback_base.to_string(),
    };

    host == "localhost" || host == "127.0.0.1" || host == "host.docker.internal"
}

/// Emits through `tracing` and, for a callback host on this machine, mirrors
/// the event with its context to the log endpoint.
pub async fn report_event(client: &Client, target: Option<&CallbackTarget>, event: &IngestEvent<'_>) {
    let level = event.level();
    let message = event.message();
    match level {
        LogLevel::Debug => tracing::debug!("[regtree] {}", message),
        LogLevel::Info => tracing::info!("[regtree] {}", message),
        LogLevel::Warn => tracing::warn!("[regtree] {}", message),
        LogLevel::Error => tracing::error!("[regtree] {}", message),
    }

    let Some(target) = target else {
        return;
    };
    if is_local_callback_base(&target.base) {
        post_debug_log(
            client,
            &target.base,
            &target.token,
            level.as_str(),
            &message,
            Some(event.context()),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_local_callback_hosts() {
        assert!(is_local_callback_base("http://localhost:8787"));
        assert!(is_local_callback_base("http://127.0.0.1:3000/api"));
        assert!(is_local_callback_base("http://host.docker.internal"));
        assert!(!is_local_callback_base("https://ingest.example.com"));
    }

    #[test]
    fn warning_event_carries_section_context() {
        let warning = ParseWarning::DuplicateSection {
            subdivision: "A".to_string(),
            number: "9.1".to_string(),
        };
        let event = IngestEvent::DocumentWarning {
            document: "part-9",
            division: "9",
            warning: &warning,
        };

        assert_eq!(event.level(), LogLevel::Warn);
        assert!(event.message().starts_with("part-9: division 9: section 9.1"));
        let context = event.context();
        assert_eq!(context["event"], "document_warning");
        assert_eq!(context["division"], "9");
        assert_eq!(context["warning"]["kind"], "duplicate_section");
        assert_eq!(context["warning"]["subdivision"], "A");
        assert_eq!(context["warning"]["number"], "9.1");
    }

    #[test]
    fn failure_event_reports_error_kind() {
        let error = IngestError::StructureNotFound {
            dialect: "cfr".to_string(),
        };
        let event = IngestEvent::DocumentFailed {
            document: "broken",
            error: &error,
        };
        assert_eq!(event.level(), LogLevel::Error);
        assert_eq!(event.context()["errorKind"], "structure_not_found");
    }
}
