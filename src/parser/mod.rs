pub mod division;
pub mod normalize;
pub mod paragraph;
pub mod section;

use crate::dialect::Dialect;
use crate::error::IngestError;
use crate::types::{ParsedDocument, Section, SubDivision, SupplementaryUnit};
use regex::Regex;
use std::sync::LazyLock;

pub use division::{segment_divisions, DivisionSegments, SubDivisionSpan};
pub use normalize::normalize;
pub use paragraph::{build_paragraphs, classify, ParagraphTreeBuilder};
pub use section::{segment_sections, segment_supplementary, RawSection, RawSupplementaryUnit};

static CAMEL_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

const TITLE_SEPARATORS: [char; 5] = ['—', '–', '-', ':', '.'];

/// Trims whitespace and leading separator punctuation from a header title,
/// optionally splitting run-together words ("CommercialHonor").
pub(crate) fn clean_title(raw: &str, split_camel_case: bool) -> String {
    let title = raw
        .trim_start_matches(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c))
        .trim_end();
    if split_camel_case {
        CAMEL_BOUNDARY_RE.replace_all(title, "$1 $2").into_owned()
    } else {
        title.to_string()
    }
}

/// Runs the full pipeline on one raw document: normalize, find the division
/// and its sub-divisions, split sections and supplementary units, and build
/// each paragraph forest. Nothing is persisted.
pub fn parse_document(raw: &str, dialect: &Dialect) -> Result<ParsedDocument, IngestError> {
    let text = normalize(raw);
    let segments = segment_divisions(&text, dialect)?;

    let mut warnings = Vec::new();
    let mut subdivisions = Vec::with_capacity(segments.subdivisions.len());
    let mut supplementary_units: Vec<SupplementaryUnit> = Vec::new();

    for span in &segments.subdivisions {
        let out = segment_sections(&text, span.start..span.end, &span.code, dialect);
        warnings.extend(out.warnings);

        let sections = out
            .sections
            .into_iter()
            .map(|raw| Section {
                paragraphs: build_paragraphs(&raw.body, dialect),
                number: raw.number,
                title: raw.title,
                body: raw.body,
            })
            .collect();

        if let Some(block) = out.supplementary {
            let (units, unit_warnings) = segment_supplementary(&text[block], dialect);
            warnings.extend(unit_warnings);
            for unit in units {
                let unit = SupplementaryUnit {
                    paragraphs: build_paragraphs(&unit.body, dialect),
                    number: unit.number,
                    title: unit.title,
                    body: unit.body,
                };
                match supplementary_units
                    .iter_mut()
                    .find(|existing| existing.number == unit.number)
                {
                    Some(existing) => *existing = unit,
                    None => supplementary_units.push(unit),
                }
            }
        }

        subdivisions.push(SubDivision {
            code: span.code.clone(),
            title: span.title.clone(),
            sections,
        });
    }

    let document = ParsedDocument {
        division: segments.division,
        subdivisions,
        supplementary_units,
        warnings,
    };

    tracing::debug!(
        "[regtree] Parsed division {} ({}): {} subdivisions, {} sections, {} paragraphs, {} supplementary units",
        document.division.number,
        dialect.name,
        document.subdivisions.len(),
        document.section_count(),
        document.paragraph_count(),
        document.supplementary_units.len()
    );

    Ok(document)
}
