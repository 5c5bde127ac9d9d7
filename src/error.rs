use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no division header found (dialect {dialect})")]
    StructureNotFound { dialect: String },
    #[error("ambiguous division header (dialect {dialect}): candidates {candidates:?}")]
    AmbiguousHeader {
        dialect: String,
        candidates: Vec<String>,
    },
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),
    #[error("store failure: {0}")]
    Store(String),
    #[error("invalid {field} pattern in dialect {dialect}: {source}")]
    InvalidGrammar {
        dialect: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),
    #[error("config error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::StructureNotFound { .. } => "structure_not_found",
            IngestError::AmbiguousHeader { .. } => "ambiguous_header",
            IngestError::PersistenceConflict(_) => "persistence_conflict",
            IngestError::Store(_) => "store",
            IngestError::InvalidGrammar { .. } => "invalid_grammar",
            IngestError::UnknownDialect(_) => "unknown_dialect",
            IngestError::Config(_) => "config",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => IngestError::PersistenceConflict(message),
            StoreError::Backend(message) => IngestError::Store(message),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Non-fatal findings recorded while parsing. The affected node is skipped
/// (or replaced) and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    EmptySection {
        subdivision: String,
        number: String,
    },
    EmptySupplementaryUnit {
        number: String,
    },
    DuplicateSection {
        subdivision: String,
        number: String,
    },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::EmptySection {
                subdivision,
                number,
            } => write!(f, "section {number} in subdivision {subdivision} has no body"),
            ParseWarning::EmptySupplementaryUnit { number } => {
                write!(f, "supplementary unit .{number} has no body")
            }
            ParseWarning::DuplicateSection {
                subdivision,
                number,
            } => write!(
                f,
                "section {number} repeated in subdivision {subdivision}, keeping the later one"
            ),
        }
    }
}
