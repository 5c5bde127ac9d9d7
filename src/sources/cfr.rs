use crate::dialect::{Dialect, DialectSpec, LabelScheme};
use crate::dialect::{DEFAULT_PARAGRAPH_LABEL, DEFAULT_SUBDIVISION_CODE, DEFAULT_SUBDIVISION_TITLE};
use std::sync::LazyLock;

/// eCFR-style parts: "PART 248—TITLE", "Subpart A—Title", "§ 248.1 Title.",
/// with "Authority:" and "Source:" notes under the part heading.
pub fn spec() -> DialectSpec {
    DialectSpec {
        name: "cfr".to_string(),
        division_headers: vec![
            r"(?m)^[ \t#*]*PART[ \t]+(\d+[A-Za-z]?)\b[ \t]*[—–\-:.]?[ \t]*(.*)$".to_string(),
        ],
        // A title must open like a heading, so a wrapped "Subpart B of this
        // part" cross-reference is not a header.
        subdivision_header: Some(
            r#"(?m)^[ \t#*]*Subpart[ \t]+([A-Z])\b[ \t]*(?:[—–\-:.][ \t]*)?((?:[A-Z0-9(\[“"§].*)?)$"#
                .to_string(),
        ),
        section_header: r"(?m)^[ \t#*>•\-]*§+[ \t]*(\d+[A-Za-z]?(?:\.\d+[A-Za-z]?)*)".to_string(),
        exclude_roman_sections: false,
        supplementary_boundary: None,
        supplementary_unit: None,
        trailer_markers: Vec::new(),
        supplementary_end_markers: Vec::new(),
        paragraph_label: DEFAULT_PARAGRAPH_LABEL.to_string(),
        label_levels: LabelScheme::default().rules().to_vec(),
        authority: Some(r"(?m)^[ \t#*]*Authority:[ \t]*(.+)$".to_string()),
        source: Some(r"(?m)^[ \t#*]*Source:[ \t]*(.+)$".to_string()),
        default_subdivision_code: DEFAULT_SUBDIVISION_CODE.to_string(),
        default_subdivision_title: DEFAULT_SUBDIVISION_TITLE.to_string(),
        split_camel_case_titles: false,
    }
}

pub static CFR_DIALECT: LazyLock<Dialect> = LazyLock::new(|| Dialect::compile(&spec()).unwrap());
