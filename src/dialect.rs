use crate::error::IngestError;
use regex::Regex;
use serde::{Deserialize, Serialize};

const LOWER_ROMAN: [&str; 20] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii", "xiv", "xv",
    "xvi", "xvii", "xviii", "xix", "xx",
];

const MAX_LABEL_LEVEL: u8 = 9;

pub const DEFAULT_SUBDIVISION_CODE: &str = "General";
pub const DEFAULT_SUBDIVISION_TITLE: &str = "General Provisions";
pub const DEFAULT_PARAGRAPH_LABEL: &str = r"^[ \t#*>•\-]*\(([A-Za-z0-9]+)\)[ \t]*(.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelClass {
    Digits,
    LowerRoman,
    LowerLetter,
    UpperLetter,
    UpperRoman,
}

impl LabelClass {
    pub fn matches(self, token: &str) -> bool {
        match self {
            LabelClass::Digits => !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()),
            LabelClass::LowerRoman => is_lower_roman(token),
            LabelClass::LowerLetter => single_char(token).is_some_and(|c| c.is_ascii_lowercase()),
            LabelClass::UpperLetter => single_char(token).is_some_and(|c| c.is_ascii_uppercase()),
            LabelClass::UpperRoman => {
                token.bytes().all(|b| b.is_ascii_uppercase())
                    && is_lower_roman(&token.to_ascii_lowercase())
            }
        }
    }
}

pub fn is_lower_roman(token: &str) -> bool {
    LOWER_ROMAN.contains(&token)
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub class: LabelClass,
    pub level: u8,
}

/// Ordered label-level table. The first rule whose class matches decides the
/// level; a token no rule claims is level 0 (continuation text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelScheme {
    rules: Vec<LabelRule>,
}

impl LabelScheme {
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, token: &str) -> u8 {
        self.rules
            .iter()
            .find(|rule| rule.class.matches(token))
            .map_or(0, |rule| rule.level)
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }
}

impl Default for LabelScheme {
    /// (a) -> (1) -> (i) -> (A). Roman numerals are checked before letters so
    /// "i", "v" and "x" always resolve to level 3.
    fn default() -> Self {
        Self::new(default_label_levels())
    }
}

fn default_label_levels() -> Vec<LabelRule> {
    vec![
        LabelRule {
            class: LabelClass::Digits,
            level: 2,
        },
        LabelRule {
            class: LabelClass::LowerRoman,
            level: 3,
        },
        LabelRule {
            class: LabelClass::LowerLetter,
            level: 1,
        },
        LabelRule {
            class: LabelClass::UpperLetter,
            level: 4,
        },
    ]
}

fn default_paragraph_label() -> String {
    DEFAULT_PARAGRAPH_LABEL.to_string()
}

fn default_subdivision_code() -> String {
    DEFAULT_SUBDIVISION_CODE.to_string()
}

fn default_subdivision_title() -> String {
    DEFAULT_SUBDIVISION_TITLE.to_string()
}

/// Serializable description of one legal-corpus format. Every grammar is a
/// regular expression; see `Dialect::compile` for the capture-group contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialectSpec {
    pub name: String,
    pub division_headers: Vec<String>,
    #[serde(default)]
    pub subdivision_header: Option<String>,
    pub section_header: String,
    #[serde(default)]
    pub exclude_roman_sections: bool,
    #[serde(default)]
    pub supplementary_boundary: Option<String>,
    #[serde(default)]
    pub supplementary_unit: Option<String>,
    #[serde(default)]
    pub trailer_markers: Vec<String>,
    /// Markers that end only the supplementary block, in addition to the trailers.
    #[serde(default)]
    pub supplementary_end_markers: Vec<String>,
    #[serde(default = "default_paragraph_label")]
    pub paragraph_label: String,
    #[serde(default = "default_label_levels")]
    pub label_levels: Vec<LabelRule>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_subdivision_code")]
    pub default_subdivision_code: String,
    #[serde(default = "default_subdivision_title")]
    pub default_subdivision_title: String,
    #[serde(default)]
    pub split_camel_case_titles: bool,
}

#[derive(Debug, Clone)]
pub struct Dialect {
    pub name: String,
    /// Group 1: identifier, optional group 2: title.
    pub division_headers: Vec<Regex>,
    /// Group 1: code, optional group 2: title.
    pub subdivision_header: Option<Regex>,
    /// Group 1: identifier. The title is the first line after the match.
    pub section_header: Regex,
    pub exclude_roman_sections: bool,
    pub supplementary_boundary: Option<Regex>,
    /// Group 1: number, group 2: title.
    pub supplementary_unit: Option<Regex>,
    pub trailer_markers: Vec<Regex>,
    pub supplementary_end_markers: Vec<Regex>,
    /// Group 1: label, group 2: rest of line. Applied to single lines.
    pub paragraph_label: Regex,
    pub labels: LabelScheme,
    /// Group 1: the metadata value.
    pub authority: Option<Regex>,
    pub source: Option<Regex>,
    pub default_subdivision_code: String,
    pub default_subdivision_title: String,
    pub split_camel_case_titles: bool,
}

impl Dialect {
    pub fn compile(spec: &DialectSpec) -> Result<Self, IngestError> {
        let name = spec.name.as_str();
        if spec.division_headers.is_empty() {
            return Err(IngestError::Config(format!(
                "dialect {name} declares no division header grammar"
            )));
        }

        let division_headers = spec
            .division_headers
            .iter()
            .map(|pattern| compile_grouped(name, "division_headers", pattern, 1))
            .collect::<Result<Vec<_>, _>>()?;
        let subdivision_header = spec
            .subdivision_header
            .as_deref()
            .map(|pattern| compile_grouped(name, "subdivision_header", pattern, 1))
            .transpose()?;
        let section_header = compile_grouped(name, "section_header", &spec.section_header, 1)?;
        let supplementary_boundary = spec
            .supplementary_boundary
            .as_deref()
            .map(|pattern| compile_pattern(name, "supplementary_boundary", pattern))
            .transpose()?;
        let supplementary_unit = spec
            .supplementary_unit
            .as_deref()
            .map(|pattern| compile_grouped(name, "supplementary_unit", pattern, 2))
            .transpose()?;
        let trailer_markers = spec
            .trailer_markers
            .iter()
            .map(|pattern| compile_pattern(name, "trailer_markers", pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let supplementary_end_markers = spec
            .supplementary_end_markers
            .iter()
            .map(|pattern| compile_pattern(name, "supplementary_end_markers", pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let paragraph_label = compile_grouped(name, "paragraph_label", &spec.paragraph_label, 2)?;
        let authority = spec
            .authority
            .as_deref()
            .map(|pattern| compile_grouped(name, "authority", pattern, 1))
            .transpose()?;
        let source = spec
            .source
            .as_deref()
            .map(|pattern| compile_grouped(name, "source", pattern, 1))
            .transpose()?;

        if let Some(rule) = spec
            .label_levels
            .iter()
            .find(|rule| rule.level == 0 || rule.level > MAX_LABEL_LEVEL)
        {
            return Err(IngestError::Config(format!(
                "dialect {name}: label level {} for {:?} is outside 1..={MAX_LABEL_LEVEL}",
                rule.level, rule.class
            )));
        }

        Ok(Self {
            name: spec.name.clone(),
            division_headers,
            subdivision_header,
            section_header,
            exclude_roman_sections: spec.exclude_roman_sections,
            supplementary_boundary,
            supplementary_unit,
            trailer_markers,
            supplementary_end_markers,
            paragraph_label,
            labels: LabelScheme::new(spec.label_levels.clone()),
            authority,
            source,
            default_subdivision_code: spec.default_subdivision_code.clone(),
            default_subdivision_title: spec.default_subdivision_title.clone(),
            split_camel_case_titles: spec.split_camel_case_titles,
        })
    }
}

fn compile_pattern(dialect: &str, field: &'static str, pattern: &str) -> Result<Regex, IngestError> {
    Regex::new(pattern).map_err(|source| IngestError::InvalidGrammar {
        dialect: dialect.to_string(),
        field,
        source,
    })
}

fn compile_grouped(
    dialect: &str,
    field: &'static str,
    pattern: &str,
    min_groups: usize,
) -> Result<Regex, IngestError> {
    let regex = compile_pattern(dialect, field, pattern)?;
    // captures_len counts the implicit whole-match group
    if regex.captures_len() <= min_groups {
        return Err(IngestError::Config(format!(
            "dialect {dialect}: {field} needs at least {min_groups} capture group(s)"
        )));
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_label_family() {
        let scheme = LabelScheme::default();
        for letter in 'a'..='z' {
            let token = letter.to_string();
            let level = scheme.classify(&token);
            if matches!(letter, 'i' | 'v' | 'x') {
                assert_eq!(level, 3, "{token}");
            } else {
                assert_eq!(level, 1, "{token}");
            }
        }
        for letter in 'A'..='Z' {
            assert_eq!(scheme.classify(&letter.to_string()), 4);
        }
        for number in 1..=999 {
            assert_eq!(scheme.classify(&number.to_string()), 2);
        }
        for roman in LOWER_ROMAN {
            assert_eq!(scheme.classify(roman), 3, "{roman}");
        }
    }

    #[test]
    fn unknown_tokens_are_level_zero() {
        let scheme = LabelScheme::default();
        for token in ["", "aa", "xxi", "1a", "AB", "iiii", "é", "a1"] {
            assert_eq!(scheme.classify(token), 0, "{token:?}");
        }
    }

    #[test]
    fn roman_takes_precedence_over_letters() {
        let scheme = LabelScheme::default();
        assert_eq!(scheme.classify("i"), 3);
        assert_eq!(scheme.classify("v"), 3);
        assert_eq!(scheme.classify("x"), 3);
        assert_eq!(scheme.classify("b"), 1);
        assert_eq!(scheme.classify("ii"), 3);
    }

    #[test]
    fn custom_table_order_changes_precedence() {
        let scheme = LabelScheme::new(vec![
            LabelRule {
                class: LabelClass::LowerLetter,
                level: 1,
            },
            LabelRule {
                class: LabelClass::LowerRoman,
                level: 3,
            },
        ]);
        assert_eq!(scheme.classify("i"), 1);
        assert_eq!(scheme.classify("ii"), 3);
        assert_eq!(scheme.classify("1"), 0);
    }

    #[test]
    fn upper_roman_class_requires_uppercase() {
        assert!(LabelClass::UpperRoman.matches("IV"));
        assert!(!LabelClass::UpperRoman.matches("iv"));
        assert!(!LabelClass::UpperRoman.matches("IIII"));
    }

    #[test]
    fn rejects_invalid_patterns() {
        let spec = DialectSpec {
            name: "broken".to_string(),
            division_headers: vec![r"PART (\d+".to_string()],
            subdivision_header: None,
            section_header: r"§\s*(\d+)".to_string(),
            exclude_roman_sections: false,
            supplementary_boundary: None,
            supplementary_unit: None,
            trailer_markers: Vec::new(),
            supplementary_end_markers: Vec::new(),
            paragraph_label: default_paragraph_label(),
            label_levels: default_label_levels(),
            authority: None,
            source: None,
            default_subdivision_code: default_subdivision_code(),
            default_subdivision_title: default_subdivision_title(),
            split_camel_case_titles: false,
        };
        let err = Dialect::compile(&spec).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidGrammar {
                field: "division_headers",
                ..
            }
        ));
    }

    #[test]
    fn rejects_header_without_capture_group() {
        let spec: DialectSpec = serde_json::from_value(serde_json::json!({
            "name": "nogroups",
            "division_headers": ["PART \\d+"],
            "section_header": "§\\s*(\\d+)"
        }))
        .unwrap();
        assert!(matches!(
            Dialect::compile(&spec),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_levels() {
        let spec: DialectSpec = serde_json::from_value(serde_json::json!({
            "name": "deep",
            "division_headers": ["PART (\\d+)"],
            "section_header": "§\\s*(\\d+)",
            "label_levels": [{ "class": "digits", "level": 0 }]
        }))
        .unwrap();
        assert!(matches!(
            Dialect::compile(&spec),
            Err(IngestError::Config(_))
        ));
    }
}
