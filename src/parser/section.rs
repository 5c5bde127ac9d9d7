use crate::dialect::{is_lower_roman, Dialect};
use crate::error::ParseWarning;
use crate::parser::clean_title;
use crate::types::SENTINEL_SECTION_NUMBER;
use regex::Regex;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub number: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSupplementaryUnit {
    pub number: String,
    pub title: String,
    pub body: String,
}

/// Sections of one sub-division span plus the byte range (into the same
/// text) of its supplementary block, if the dialect declares one and the
/// span contains it.
#[derive(Debug, Default)]
pub struct SpanSections {
    pub sections: Vec<RawSection>,
    pub supplementary: Option<Range<usize>>,
    pub warnings: Vec<ParseWarning>,
}

pub fn segment_sections(
    text: &str,
    span: Range<usize>,
    subdivision: &str,
    dialect: &Dialect,
) -> SpanSections {
    let span_text = &text[span.clone()];
    let mut out = SpanSections::default();

    let main_end = match dialect
        .supplementary_boundary
        .as_ref()
        .and_then(|re| re.find(span_text))
    {
        Some(boundary) => {
            let tail = &span_text[boundary.end()..];
            let block_end = boundary.end() + earliest_block_end(tail, dialect).unwrap_or(tail.len());
            out.supplementary = Some(span.start + boundary.end()..span.start + block_end);
            boundary.start()
        }
        None => earliest_trailer(span_text, dialect).unwrap_or(span_text.len()),
    };
    let main = &span_text[..main_end];

    let headers: Vec<(usize, usize, String)> = dialect
        .section_header
        .captures_iter(main)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let number = captures.get(1)?.as_str().trim().to_string();
            if dialect.exclude_roman_sections && is_lower_roman(&number) {
                return None;
            }
            Some((whole.start(), whole.end(), number))
        })
        .collect();

    if headers.is_empty() {
        out.sections.push(RawSection {
            number: SENTINEL_SECTION_NUMBER.to_string(),
            title: String::new(),
            body: main.trim().to_string(),
        });
        return out;
    }

    for (index, (_, end, number)) in headers.iter().enumerate() {
        let next = headers
            .get(index + 1)
            .map_or(main.len(), |(next_start, ..)| *next_start);
        let raw = &main[*end..next];
        if raw.trim().is_empty() {
            tracing::warn!(
                "[regtree] Section {} in subdivision {} has no body, skipping",
                number,
                subdivision
            );
            out.warnings.push(ParseWarning::EmptySection {
                subdivision: subdivision.to_string(),
                number: number.clone(),
            });
            continue;
        }

        let (title, body) = split_title(raw, &dialect.paragraph_label);
        let section = RawSection {
            number: number.clone(),
            title: clean_title(&title, dialect.split_camel_case_titles),
            body,
        };

        if let Some(position) = out.sections.iter().position(|s| s.number == section.number) {
            tracing::warn!(
                "[regtree] Section {} repeated in subdivision {}, keeping the later one",
                section.number,
                subdivision
            );
            out.sections.remove(position);
            out.warnings.push(ParseWarning::DuplicateSection {
                subdivision: subdivision.to_string(),
                number: section.number.clone(),
            });
        }
        out.sections.push(section);
    }

    out
}

/// The title is the rest of the header line. When the header line carries
/// nothing, the next non-empty line is the title unless it opens a labeled
/// paragraph.
fn split_title(raw: &str, label_re: &Regex) -> (String, String) {
    let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));
    if !first.trim().is_empty() {
        return (first.to_string(), rest.trim().to_string());
    }

    let rest = rest.trim_start();
    let (candidate, remainder) = rest.split_once('\n').unwrap_or((rest, ""));
    if label_re.is_match(candidate.trim()) {
        return (String::new(), rest.trim_end().to_string());
    }
    (candidate.to_string(), remainder.trim().to_string())
}

fn earliest_trailer(text: &str, dialect: &Dialect) -> Option<usize> {
    earliest_match(text, &dialect.trailer_markers)
}

fn earliest_block_end(text: &str, dialect: &Dialect) -> Option<usize> {
    let trailer = earliest_trailer(text, dialect);
    let end = earliest_match(text, &dialect.supplementary_end_markers);
    trailer.into_iter().chain(end).min()
}

fn earliest_match(text: &str, markers: &[Regex]) -> Option<usize> {
    markers
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min()
}

pub fn segment_supplementary(
    block: &str,
    dialect: &Dialect,
) -> (Vec<RawSupplementaryUnit>, Vec<ParseWarning>) {
    let Some(unit_re) = dialect.supplementary_unit.as_ref() else {
        return (Vec::new(), Vec::new());
    };

    let headers: Vec<(usize, usize, String, String)> = unit_re
        .captures_iter(block)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let number = captures.get(1)?.as_str().trim().to_string();
            let title = captures.get(2).map_or("", |m| m.as_str());
            Some((
                whole.start(),
                whole.end(),
                number,
                clean_title(title, dialect.split_camel_case_titles),
            ))
        })
        .collect();

    let mut units = Vec::new();
    let mut warnings = Vec::new();
    for (index, (_, end, number, title)) in headers.iter().enumerate() {
        let next = headers
            .get(index + 1)
            .map_or(block.len(), |(next_start, ..)| *next_start);
        let body = block[*end..next].trim();
        if body.is_empty() {
            tracing::warn!("[regtree] Supplementary unit .{} has no body, skipping", number);
            warnings.push(ParseWarning::EmptySupplementaryUnit {
                number: number.clone(),
            });
            continue;
        }
        units.push(RawSupplementaryUnit {
            number: number.clone(),
            title: title.clone(),
            body: body.to_string(),
        });
    }

    (units, warnings)
}
