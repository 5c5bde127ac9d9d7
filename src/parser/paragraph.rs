use crate::dialect::{Dialect, LabelScheme};
use crate::types::Paragraph;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DEFAULT_SCHEME: LazyLock<LabelScheme> = LazyLock::new(LabelScheme::default);

/// Level of a label token under the default (a) -> (1) -> (i) -> (A) scheme.
pub fn classify(label: &str) -> u8 {
    DEFAULT_SCHEME.classify(label)
}

pub fn build_paragraphs(body: &str, dialect: &Dialect) -> Vec<Paragraph> {
    let mut builder = ParagraphTreeBuilder::new(&dialect.paragraph_label, &dialect.labels);
    for line in body.lines() {
        builder.push_line(line);
    }
    builder.finish()
}

/// Line-driven state machine. Keeps, per level, the most recent open
/// paragraph of the current section; the table is local to one builder so
/// no state leaks between sections.
pub struct ParagraphTreeBuilder<'a> {
    label_re: &'a Regex,
    scheme: &'a LabelScheme,
    nodes: Vec<PendingParagraph>,
    open: BTreeMap<u8, usize>,
}

struct PendingParagraph {
    label: String,
    level: u8,
    parent: Option<usize>,
    lines: Vec<String>,
}

impl<'a> ParagraphTreeBuilder<'a> {
    pub fn new(label_re: &'a Regex, scheme: &'a LabelScheme) -> Self {
        Self {
            label_re,
            scheme,
            nodes: Vec::new(),
            open: BTreeMap::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let labeled = self.label_re.captures(line).and_then(|captures| {
            let label = captures.get(1)?.as_str();
            let rest = captures.get(2).map_or("", |m| m.as_str().trim());
            Some((label, rest))
        });
        if let Some((label, rest)) = labeled {
            let level = self.scheme.classify(label);
            if level > 0 {
                self.open_paragraph(label.to_string(), level, rest);
                return;
            }
        }

        // Unlabeled text continues the deepest open paragraph.
        let Some((_, &index)) = self.open.iter().next_back() else {
            return;
        };
        self.nodes[index].lines.push(line.to_string());
    }

    fn open_paragraph(&mut self, label: String, level: u8, rest: &str) {
        let parent = self
            .open
            .get(&(level - 1))
            .or_else(|| level.checked_sub(2).and_then(|up| self.open.get(&up)))
            .copied();

        let index = self.nodes.len();
        self.nodes.push(PendingParagraph {
            label,
            level,
            parent,
            lines: vec![rest.to_string()],
        });
        self.open.insert(level, index);
        self.open.retain(|open_level, _| *open_level <= level);
    }

    pub fn finish(self) -> Vec<Paragraph> {
        self.nodes
            .into_iter()
            .map(|node| Paragraph {
                label: node.label,
                level: node.level,
                body: node.lines.join("\n").trim().to_string(),
                parent: node.parent,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{dialect_for, DialectKind};

    fn build(body: &str) -> Vec<Paragraph> {
        build_paragraphs(body, dialect_for(DialectKind::Cfr))
    }

    fn shape(paragraphs: &[Paragraph]) -> Vec<(&str, u8, Option<&str>)> {
        paragraphs
            .iter()
            .map(|p| {
                (
                    p.label.as_str(),
                    p.level,
                    p.parent.map(|parent| paragraphs[parent].label.as_str()),
                )
            })
            .collect()
    }

    #[test]
    fn classify_uses_default_scheme() {
        assert_eq!(classify("a"), 1);
        assert_eq!(classify("12"), 2);
        assert_eq!(classify("iv"), 3);
        assert_eq!(classify("B"), 4);
        assert_eq!(classify("aa"), 0);
    }

    #[test]
    fn nests_by_level() {
        let paragraphs = build("(a) First.\n(1) Detail.\n(i) Deeper.\n(A) Deepest.\n(2) Next.\n(b) Second.");
        assert_eq!(
            shape(&paragraphs),
            vec![
                ("a", 1, None),
                ("1", 2, Some("a")),
                ("i", 3, Some("1")),
                ("A", 4, Some("i")),
                ("2", 2, Some("a")),
                ("b", 1, None),
            ]
        );
        assert_eq!(paragraphs[0].body, "First.");
    }

    #[test]
    fn skipped_level_falls_back_two_levels() {
        let paragraphs = build("(a) Top.\n(i) Skips a level.");
        assert_eq!(shape(&paragraphs), vec![("a", 1, None), ("i", 3, Some("a"))]);
    }

    #[test]
    fn shallower_paragraph_closes_deeper_ones() {
        let paragraphs = build("(a) Top.\n(1) Mid.\n(i) Low.\n(b) Next.\n(ii) Orphan.");
        // (ii) cannot see (i) or (1) once (b) closed them; level 1 is two up.
        assert_eq!(paragraphs[4].parent, Some(3));
    }

    #[test]
    fn deep_label_without_ancestors_is_a_root() {
        let paragraphs = build("(A) Alone.");
        assert_eq!(shape(&paragraphs), vec![("A", 4, None)]);
    }

    #[test]
    fn continuation_lines_append_to_deepest_open() {
        let paragraphs = build("(a) First line\nsecond line\n\n(1) Detail\nmore detail");
        assert_eq!(paragraphs[0].body, "First line\nsecond line");
        assert_eq!(paragraphs[1].body, "Detail\nmore detail");
    }

    #[test]
    fn text_before_first_label_is_dropped() {
        let paragraphs = build("Preamble text.\n(a) First.");
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].body, "First.");
    }

    #[test]
    fn unknown_label_tokens_are_continuations() {
        let paragraphs = build("(a) First.\n(aa) not a label");
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].body, "First.\n(aa) not a label");
    }

    #[test]
    fn label_on_its_own_line_takes_following_text() {
        let paragraphs = build("(a)\nBody on the next line.");
        assert_eq!(paragraphs[0].body, "Body on the next line.");
    }

    #[test]
    fn decorated_labels_are_recognized() {
        let paragraphs = build("# (a) Heading style\n• (1) Bullet style\n- (2) Dash style");
        assert_eq!(
            shape(&paragraphs),
            vec![("a", 1, None), ("1", 2, Some("a")), ("2", 2, Some("a"))]
        );
    }

    #[test]
    fn parents_always_precede_children() {
        let paragraphs = build("(A) x\n(i) y\n(1) z\n(a) w\n(B) v\n(2) u");
        for (index, paragraph) in paragraphs.iter().enumerate() {
            if let Some(parent) = paragraph.parent {
                assert!(parent < index);
                assert!(paragraphs[parent].level < paragraph.level);
            }
        }
    }

    #[test]
    fn label_pattern_without_a_label_group_match_is_continuation() {
        let label_re = Regex::new(r"^(?:\(([a-z0-9]+)\)|NOTE:)[ \t]*(.*)$").unwrap();
        let scheme = LabelScheme::default();
        let mut builder = ParagraphTreeBuilder::new(&label_re, &scheme);
        for line in ["(a) First.", "NOTE: see above.", "(b) Second."] {
            builder.push_line(line);
        }
        let paragraphs = builder.finish();

        assert_eq!(shape(&paragraphs), vec![("a", 1, None), ("b", 1, None)]);
        assert_eq!(paragraphs[0].body, "First.\nNOTE: see above.");
    }
}
