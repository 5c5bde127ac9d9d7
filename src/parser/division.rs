use crate::dialect::Dialect;
use crate::error::IngestError;
use crate::parser::clean_title;
use crate::types::Division;
use regex::{Captures, Regex};

/// A sub-division header and the `[start, end)` byte range of its body in
/// the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubDivisionSpan {
    pub code: String,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionSegments {
    pub division: Division,
    pub subdivisions: Vec<SubDivisionSpan>,
}

pub fn segment_divisions(text: &str, dialect: &Dialect) -> Result<DivisionSegments, IngestError> {
    let (header, body_start) = find_division_header(text, dialect)?;

    let division = Division {
        number: header.0,
        title: header.1,
        authority: capture_metadata(dialect.authority.as_ref(), text),
        source: capture_metadata(dialect.source.as_ref(), text),
    };

    let mut subdivisions = match dialect.subdivision_header.as_ref() {
        Some(re) => find_subdivisions(text, body_start, re, dialect),
        None => Vec::new(),
    };

    if subdivisions.is_empty() {
        subdivisions.push(SubDivisionSpan {
            code: dialect.default_subdivision_code.clone(),
            title: dialect.default_subdivision_title.clone(),
            start: body_start,
            end: text.len(),
        });
    }

    Ok(DivisionSegments {
        division,
        subdivisions,
    })
}

/// Each grammar alternative contributes its first match that captures an
/// identifier. Alternatives that disagree on the identifier make the header
/// ambiguous; otherwise the earliest-listed alternative wins.
fn find_division_header(
    text: &str,
    dialect: &Dialect,
) -> Result<((String, String), usize), IngestError> {
    let found: Vec<(Captures, String)> = dialect
        .division_headers
        .iter()
        .filter_map(|re| {
            re.captures_iter(text).find_map(|captures| {
                let number = captures.get(1)?.as_str().trim().to_string();
                (!number.is_empty()).then_some((captures, number))
            })
        })
        .collect();

    let Some((first, number)) = found.first() else {
        return Err(IngestError::StructureNotFound {
            dialect: dialect.name.clone(),
        });
    };

    let mut candidates: Vec<String> = found
        .iter()
        .map(|(_, number)| number.clone())
        .collect();
    candidates.sort();
    candidates.dedup();
    if candidates.len() > 1 {
        return Err(IngestError::AmbiguousHeader {
            dialect: dialect.name.clone(),
            candidates,
        });
    }

    let number = number.clone();
    let title = first
        .get(2)
        .map(|m| clean_title(m.as_str(), dialect.split_camel_case_titles))
        .unwrap_or_default();
    let end = first.get(0).map_or(0, |m| m.end());
    Ok(((number, title), end))
}

fn find_subdivisions(
    text: &str,
    body_start: usize,
    re: &Regex,
    dialect: &Dialect,
) -> Vec<SubDivisionSpan> {
    let body = &text[body_start..];
    let headers: Vec<(usize, usize, String, String)> = re
        .captures_iter(body)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let code = captures.get(1)?.as_str().trim().to_string();
            let title = captures
                .get(2)
                .map(|m| clean_title(m.as_str(), dialect.split_camel_case_titles))
                .unwrap_or_default();
            Some((
                body_start + whole.start(),
                body_start + whole.end(),
                code,
                title,
            ))
        })
        .collect();

    headers
        .iter()
        .enumerate()
        .map(|(index, (_, end, code, title))| SubDivisionSpan {
            code: code.clone(),
            title: title.clone(),
            start: *end,
            end: headers
                .get(index + 1)
                .map_or(text.len(), |(next_start, ..)| *next_start),
        })
        .collect()
}

fn capture_metadata(re: Option<&Regex>, text: &str) -> Option<String> {
    re?.captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{dialect_for, DialectKind};

    #[test]
    fn finds_division_and_subdivision_spans() {
        let text = "PART 9\nSubpart A Intro\nbody a\nSubpart B—Other\nbody b\n";
        let segments = segment_divisions(text, dialect_for(DialectKind::Cfr)).unwrap();

        assert_eq!(segments.division.number, "9");
        assert_eq!(segments.division.title, "");
        assert_eq!(segments.subdivisions.len(), 2);
        assert_eq!(segments.subdivisions[0].code, "A");
        assert_eq!(segments.subdivisions[0].title, "Intro");
        assert_eq!(
            &text[segments.subdivisions[0].start..segments.subdivisions[0].end],
            "\nbody a\n"
        );
        assert_eq!(segments.subdivisions[1].code, "B");
        assert_eq!(segments.subdivisions[1].title, "Other");
        assert_eq!(segments.subdivisions[1].end, text.len());
    }

    #[test]
    fn synthesizes_default_subdivision() {
        let text = "# PART 312—ELECTRONIC RECORDS\n§ 312.1 Scope.\n";
        let segments = segment_divisions(text, dialect_for(DialectKind::Cfr)).unwrap();

        assert_eq!(segments.division.title, "ELECTRONIC RECORDS");
        assert_eq!(segments.subdivisions.len(), 1);
        let span = &segments.subdivisions[0];
        assert_eq!(span.code, "General");
        assert_eq!(span.title, "General Provisions");
        assert_eq!(&text[span.start..span.end], "\n§ 312.1 Scope.\n");
    }

    #[test]
    fn missing_header_is_structure_not_found() {
        let err = segment_divisions("no header here", dialect_for(DialectKind::Cfr)).unwrap_err();
        assert!(matches!(err, IngestError::StructureNotFound { .. }));
    }

    #[test]
    fn disagreeing_alternatives_are_ambiguous() {
        let text = "2010. Standards of Commercial Honor\n## 3110. Supervision\n";
        let err = segment_divisions(text, dialect_for(DialectKind::Finra)).unwrap_err();
        match err {
            IngestError::AmbiguousHeader { candidates, .. } => {
                assert_eq!(candidates, vec!["2010".to_string(), "3110".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn alternative_without_identifier_is_not_a_header() {
        let mut spec = crate::sources::cfr::spec();
        spec.name = "optional-part".to_string();
        spec.division_headers = vec![r"(?m)^(?:PART (\d+)|RULE)".to_string()];
        let dialect = Dialect::compile(&spec).unwrap();

        let err = segment_divisions("RULE\n§ 1 x\n", &dialect).unwrap_err();
        assert!(matches!(err, IngestError::StructureNotFound { .. }));

        let segments = segment_divisions("RULE\nPART 7\n§ 7.1 x\n", &dialect).unwrap();
        assert_eq!(segments.division.number, "7");
    }

    #[test]
    fn captures_authority_and_source() {
        let text = "PART 248—REGULATIONS S-P\nAuthority: 15 U.S.C. 78q.\nSource: 65 FR 40362.\n";
        let segments = segment_divisions(text, dialect_for(DialectKind::Cfr)).unwrap();
        assert_eq!(segments.division.authority.as_deref(), Some("15 U.S.C. 78q."));
        assert_eq!(segments.division.source.as_deref(), Some("65 FR 40362."));
    }
}
