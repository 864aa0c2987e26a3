//! Cleanup of finished summaries.

use std::sync::LazyLock;

use regex::Regex;

/// `[12:34]` or `[1:02:03]`
static TIMESTAMP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d{1,2}:\d{2}(?::\d{2})?\]").expect("valid timestamp pattern"));

/// A line made only of 3+ `-`, `*` or `_` markers, optionally spaced.
static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:-(?:\s*-){2,}|\*(?:\s*\*){2,}|_(?:\s*_){2,})$").expect("valid rule pattern")
});

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));

/// Normalize a completed summary for display and caching.
///
/// Strips bracketed timestamp tokens, rewrites horizontal rules as `---`,
/// trims every line, collapses runs of blank lines to one and trims the
/// result. Idempotent: cleaning a cleaned summary changes nothing.
///
/// Only ever applied to the final text, never to partial chunks.
pub fn clean_markdown_summary(summary: &str) -> String {
    let mut text = summary.replace("\r\n", "\n");

    // Removing one token can join digits into a new one: "[1[0:00]2:34]"
    loop {
        let stripped = TIMESTAMP_TOKEN.replace_all(&text, "");
        if stripped == text {
            break;
        }
        text = stripped.into_owned();
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .map(|line| if HORIZONTAL_RULE.is_match(line) { "---" } else { line })
        .collect();
    let joined = lines.join("\n");

    EXCESS_NEWLINES.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Point one. Point two.",
        "## Summary [0:12]\n\n\n\n* point [1:02:03] one\n***\n___\n- - -\n\n\nEnd  ",
        "[1[0:00]2:34] nested",
        "  leading\r\n\r\n\r\n\r\ntrailing  \n",
        "--\n---\n----\n* * *\n_ _",
        "[12:34][1:00:00]",
        "text [123:45] keeps long minutes",
        "\n\n\n\n",
    ];

    #[test]
    fn test_strips_timestamps() {
        assert_eq!(clean_markdown_summary("Intro [0:12] and [1:02:03] more"), "Intro  and  more");
        assert_eq!(clean_markdown_summary("[12:34][1:00:00]"), "");
        assert_eq!(clean_markdown_summary("[1[0:00]2:34] nested"), "nested");
    }

    #[test]
    fn test_leaves_non_timestamp_brackets() {
        assert_eq!(clean_markdown_summary("[link](http://x) [a:bc]"), "[link](http://x) [a:bc]");
        assert_eq!(
            clean_markdown_summary("text [123:45] keeps long minutes"),
            "text [123:45] keeps long minutes"
        );
    }

    #[test]
    fn test_normalizes_horizontal_rules() {
        assert_eq!(
            clean_markdown_summary("a\n***\nb\n___\nc\n- - -\nd\n* * *"),
            "a\n---\nb\n---\nc\n---\nd\n---"
        );
        // Too short or mixed markers are not rules
        assert_eq!(clean_markdown_summary("--\n-*-"), "--\n-*-");
    }

    #[test]
    fn test_collapses_blank_lines_and_trims() {
        assert_eq!(clean_markdown_summary("  a  \n\n\n\n  b\n"), "a\n\nb");
        assert_eq!(clean_markdown_summary("a\n \n \n \nb"), "a\n\nb");
        assert_eq!(clean_markdown_summary("a\r\n\r\n\r\nb"), "a\n\nb");
    }

    #[test]
    fn test_plain_sentences_unchanged() {
        assert_eq!(clean_markdown_summary("Point one. Point two."), "Point one. Point two.");
    }

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = clean_markdown_summary(sample);
            let twice = clean_markdown_summary(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }
}
