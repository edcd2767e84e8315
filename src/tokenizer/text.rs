//! Markup-to-text reduction for the content channel
//!
//! Produces the readable text of a page the way a text-mode renderer would:
//! scripts, styles, images and tables are dropped, link targets are dropped
//! while their anchor text is kept, and block elements end a line.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node};

/// Maximum markup size considered (10 MB). Larger documents are cut.
pub const MAX_MARKUP_SIZE: usize = 10 * 1024 * 1024;

/// Recursion guard for pathological nesting.
const MAX_NESTING_DEPTH: usize = 512;

/// Elements whose whole subtree never contributes text.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "img", "picture", "svg", "canvas",
    "table", "iframe", "object", "video", "audio",
];

/// Elements after which the text continues on a new line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "ul",
];

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("SPACE_RUN: hardcoded regex is valid"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("SENTENCE_END: hardcoded regex is valid"));

/// Reduce raw markup to plain text.
#[must_use]
pub fn extract_text(markup: &str) -> String {
    let markup = truncate_at_char_boundary(markup, MAX_MARKUP_SIZE);
    let document = Html::parse_document(markup);

    let mut raw = String::with_capacity(markup.len() / 4);
    walk(document.tree.root(), &mut raw, 0);

    raw.lines()
        .map(|line| SPACE_RUN.replace_all(line.trim(), " "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn walk(node: NodeRef<'_, Node>, out: &mut String, depth: usize) {
    if depth > MAX_NESTING_DEPTH {
        tracing::debug!(depth, "markup nesting limit reached, truncating text");
        return;
    }

    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                walk(child, out, depth + 1);
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                } else if name == "td" || name == "th" {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Split text into sentence-like spans.
///
/// A span ends after `.`, `!` or `?` when followed by whitespace; the
/// punctuation stays with its sentence. Empty spans are omitted.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // punctuation is a single ASCII byte
        let end = m.start() + 1;
        push_span(&mut spans, &text[start..end]);
        start = m.end();
    }
    push_span(&mut spans, &text[start..]);

    spans
}

fn push_span<'a>(spans: &mut Vec<&'a str>, span: &'a str) {
    let span = span.trim();
    if !span.is_empty() {
        spans.push(span);
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_drops_non_text_elements() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head>
            <body><p>Sign in to <a href="https://evil.example/x">your account</a>.</p>
            <script>var a = 1;</script><img src="logo.png" alt="logo">
            <table><tr><td>cell</td></tr></table><div>Second block</div></body></html>"#;
        let text = extract_text(html);
        assert!(text.contains("Sign in to your account."));
        assert!(text.contains("Second block"));
        assert!(!text.contains("evil.example"));
        assert!(!text.contains("var a"));
        assert!(!text.contains("cell"));
        assert!(text.starts_with("Sign in"));
    }

    #[test]
    fn test_split_sentences_keeps_punctuation() {
        let spans = split_sentences("Verify your account now! Is this you? Click below.  Thanks");
        assert_eq!(
            spans,
            vec!["Verify your account now!", "Is this you?", "Click below.", "Thanks"]
        );
    }

    #[test]
    fn test_split_ignores_inline_dots() {
        let spans = split_sentences("Visit example.com today. Version 2.0 is out");
        assert_eq!(spans, vec!["Visit example.com today.", "Version 2.0 is out"]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_sentences("   ").is_empty());
    }
}
