use crate::error::ParseWarning;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    Cfr,
    Finra,
}

impl DialectKind {
    pub const ALL: [DialectKind; 2] = [DialectKind::Cfr, DialectKind::Finra];

    pub fn as_str(self) -> &'static str {
        match self {
            DialectKind::Cfr => "cfr",
            DialectKind::Finra => "finra",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Label given to the single section synthesized for a span without section headers.
pub const SENTINEL_SECTION_NUMBER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub number: String,
    pub title: String,
    pub authority: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDivision {
    pub code: String,
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub number: String,
    pub title: String,
    pub body: String,
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn is_sentinel(&self) -> bool {
        self.number == SENTINEL_SECTION_NUMBER
    }
}

/// One labeled node of a paragraph forest. `parent` indexes into the owning
/// list; parents always precede their children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub label: String,
    pub level: u8,
    pub body: String,
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryUnit {
    pub number: String,
    pub title: String,
    pub body: String,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub division: Division,
    pub subdivisions: Vec<SubDivision>,
    pub supplementary_units: Vec<SupplementaryUnit>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedDocument {
    pub fn sections(&self) -> impl Iterator<Item = (&SubDivision, &Section)> {
        self.subdivisions
            .iter()
            .flat_map(|sub| sub.sections.iter().map(move |section| (sub, section)))
    }

    pub fn section(&self, number: &str) -> Option<&Section> {
        self.sections()
            .map(|(_, section)| section)
            .find(|section| section.number == number)
    }

    pub fn section_count(&self) -> usize {
        self.sections().count()
    }

    pub fn paragraph_count(&self) -> usize {
        self.sections()
            .map(|(_, section)| section.paragraphs.len())
            .sum()
    }
}

/// Paragraphs of `paragraphs` whose parent is `parent` (`None` for roots), in document order.
pub fn children_of(
    paragraphs: &[Paragraph],
    parent: Option<usize>,
) -> impl Iterator<Item = (usize, &Paragraph)> {
    paragraphs
        .iter()
        .enumerate()
        .filter(move |(_, paragraph)| paragraph.parent == parent)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestConfig {
    pub dialect: String,
    pub documents: Vec<DocumentEntry>,
    pub callback_base: Option<String>,
    pub callback_token: Option<String>,
}

impl IngestConfig {
    pub fn callback(&self) -> Option<CallbackTarget> {
        match (&self.callback_base, &self.callback_token) {
            (Some(base), Some(token)) => Some(CallbackTarget {
                base: base.trim_end_matches('/').to_string(),
                token: token.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTarget {
    pub base: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub dialect: String,
    pub text: String,
}
