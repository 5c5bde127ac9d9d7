use crate::dialect::{Dialect, DialectSpec, LabelScheme};
use crate::dialect::{DEFAULT_PARAGRAPH_LABEL, DEFAULT_SUBDIVISION_CODE, DEFAULT_SUBDIVISION_TITLE};
use std::sync::LazyLock;

/// Rulebook pages rendered to markdown: "# 2010. Title" rule headings, "#(a)"
/// section markers, a "• • • Supplementary Material:" block of ".01 Title."
/// units, and amendment/notice/version trailers that carry no rule text.
pub fn spec() -> DialectSpec {
    DialectSpec {
        name: "finra".to_string(),
        division_headers: vec![
            r"(?m)^#[ \t]+(\d+)\.[ \t]*(.*)$".to_string(),
            r"(?m)^##[ \t]+(\d+)\.[ \t]*(.*)$".to_string(),
            r"(?m)^(\d{4})\.[ \t]*(.*)$".to_string(),
        ],
        subdivision_header: None,
        section_header: r"(?m)^#+[ \t]*\(([a-z])\)".to_string(),
        exclude_roman_sections: true,
        supplementary_boundary: Some(
            r"(?i)•[ \t]*•[ \t]*•[ \t]*Supplementary Material:?".to_string(),
        ),
        supplementary_unit: Some(r"(?m)^[ \t#*>•\-]*\.(\d{2})[ \t]+([A-Z][^\n.]*)\.".to_string()),
        trailer_markers: vec![
            r"(?i)Amended by SR-FINRA".to_string(),
            r"(?i)Selected Notices?:".to_string(),
            r"(?im)^[ \t#*]*VERSIONS\b".to_string(),
            r"(?im)^[ \t#*]*Disclaimer:".to_string(),
        ],
        supplementary_end_markers: vec![r"(?m)^[ \t]*\[".to_string()],
        paragraph_label: DEFAULT_PARAGRAPH_LABEL.to_string(),
        label_levels: LabelScheme::default().rules().to_vec(),
        authority: None,
        source: None,
        default_subdivision_code: DEFAULT_SUBDIVISION_CODE.to_string(),
        default_subdivision_title: DEFAULT_SUBDIVISION_TITLE.to_string(),
        split_camel_case_titles: true,
    }
}

pub static FINRA_DIALECT: LazyLock<Dialect> =
    LazyLock::new(|| Dialect::compile(&spec()).unwrap());
