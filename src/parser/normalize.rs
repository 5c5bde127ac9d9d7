use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</?[A-Za-z][A-Za-z0-9\-]*(?:\s[^<>]*)?/?>|<!--.*?-->").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[([^\[\]\n]*)\]\((?:[^()\s]|\([^()\s]*\))*(?:\s+[^()]*)?\)").unwrap()
});
static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__|~~").unwrap());
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^\s*](?:[^*\n]*[^\s*])?)\*").unwrap());
static ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([\\`*_{}\[\]()#+\-.!|>~])").unwrap());

// Decoded forms must never read as markup: `&lt;`, `&gt;` and `&amp;` stay escaped.
const ENTITIES: [(&str, &str); 11] = [
    ("&nbsp;", " "),
    ("&sect;", "§"),
    ("&mdash;", "—"),
    ("&ndash;", "–"),
    ("&quot;", "\""),
    ("&ldquo;", "“"),
    ("&rdquo;", "”"),
    ("&lsquo;", "‘"),
    ("&rsquo;", "’"),
    ("&#39;", "'"),
    ("&#x27;", "'"),
];

/// Strips decorative markup while leaving heading markers, `§`, bullets and
/// parenthetical labels in place. Rules are reapplied until nothing changes;
/// every rule shortens the text, so the loop terminates and the result is a
/// fixed point (normalizing twice is a no-op).
pub fn normalize(raw: &str) -> String {
    let mut text = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace(['\u{a0}', '\u{202f}'], " ");

    loop {
        let next = normalize_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let mut out = TAG_RE.replace_all(text, "").into_owned();
    out = LINK_RE.replace_all(&out, "$1").into_owned();
    out = STRONG_RE.replace_all(&out, "").into_owned();
    out = EMPHASIS_RE.replace_all(&out, "$1").into_owned();
    for (entity, replacement) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    ESCAPE_RE.replace_all(&out, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_links_to_their_text() {
        assert_eq!(
            normalize("See [§ 248.3](https://www.ecfr.gov/current/title-17/section-248.3) here."),
            "See § 248.3 here."
        );
        assert_eq!(
            normalize("[(a)](#p-248.1(a)) Scope."),
            "(a) Scope."
        );
    }

    #[test]
    fn removes_emphasis_but_keeps_bullets() {
        assert_eq!(normalize("**§ 9.1** *Title.*"), "§ 9.1 Title.");
        assert_eq!(normalize("* (a) first * second"), "* (a) first * second");
        assert_eq!(normalize("- (1) __item__"), "- (1) item");
    }

    #[test]
    fn strips_tags_and_decodes_entities() {
        assert_eq!(
            normalize("<span id=\"p-1\">(a)</span>&nbsp;Scope &mdash; purpose &sect; 1"),
            "(a) Scope — purpose § 1"
        );
    }

    #[test]
    fn escaped_markup_is_kept_as_text() {
        assert_eq!(
            normalize("Use the &lt;i&gt; element and 3 &lt; 4."),
            "Use the &lt;i&gt; element and 3 &lt; 4."
        );
        assert_eq!(normalize("literal &amp;sect; text"), "literal &amp;sect; text");
        assert_eq!(normalize("Smith &amp; Co. <b>Ltd</b>"), "Smith &amp; Co. Ltd");
    }

    #[test]
    fn keeps_structural_markers() {
        let text = "# PART 9—TEST\n## Subpart A Intro\n### § 9.1 Title\n(a) First.\n• (b) Second.";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn removes_markdown_escapes() {
        assert_eq!(normalize(r"\(a\) First\. 1\-2"), "(a) First. 1-2");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            r"\\(a\\) **bold** [link](http://x.y/(z)) <b>tag</b> &amp;amp;",
            "**[**§ 1**](u)**",
            "plain text\r\nwith CRLF",
            "&lt;b&gt;kept&lt;/b&gt;",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "{sample:?}");
        }
    }
}
