use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DivisionRef(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubDivisionRef(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParagraphRef(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplementaryUnitRef(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionFields {
    pub title: String,
    pub authority: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDivisionFields {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFields {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphFields {
    pub body: String,
    /// Document order within the section.
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryUnitFields {
    pub title: String,
    pub body: String,
}

/// Natural key of a paragraph inside its section. `occurrence` tells apart
/// siblings that share parent, label and level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParagraphKey {
    pub label: String,
    pub level: u8,
    pub parent: Option<ParagraphRef>,
    pub occurrence: u32,
}

/// Record form of one adapter call. This is what the callback store sends
/// and what `MemoryStore` journals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpsertOp {
    Division {
        number: String,
        #[serde(flatten)]
        fields: DivisionFields,
    },
    #[serde(rename = "subdivision")]
    SubDivision {
        division: DivisionRef,
        code: String,
        #[serde(flatten)]
        fields: SubDivisionFields,
    },
    Section {
        subdivision: SubDivisionRef,
        number: String,
        #[serde(flatten)]
        fields: SectionFields,
    },
    Paragraph {
        section: SectionRef,
        #[serde(flatten)]
        key: ParagraphKey,
        #[serde(flatten)]
        fields: ParagraphFields,
    },
    SupplementaryUnit {
        division: DivisionRef,
        number: String,
        #[serde(flatten)]
        fields: SupplementaryUnitFields,
    },
}

impl UpsertOp {
    pub fn kind(&self) -> &'static str {
        match self {
            UpsertOp::Division { .. } => "division",
            UpsertOp::SubDivision { .. } => "subdivision",
            UpsertOp::Section { .. } => "section",
            UpsertOp::Paragraph { .. } => "paragraph",
            UpsertOp::SupplementaryUnit { .. } => "supplementary_unit",
        }
    }
}

/// Entity counts, either written by one persist call or held by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistSummary {
    pub divisions: usize,
    pub subdivisions: usize,
    pub sections: usize,
    pub paragraphs: usize,
    pub supplementary_units: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub name: String,
    pub status: DocumentStatus,
    pub division: Option<String>,
    pub summary: Option<PersistSummary>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.documents
            .iter()
            .filter(|report| report.status == DocumentStatus::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.completed()
    }
}
