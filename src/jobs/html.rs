// src/jobs/html.rs
//! Plain-text rendering of HTML job descriptions

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static LINE_BREAKING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(br\s*/?|/p|/div|/h[1-6]|/li|/tr|/ul|/ol)\s*>").expect("valid regex")
});

static LIST_ITEM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*li(\s[^>]*)?>").expect("valid regex"));

fn looks_like_html(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

/// Strip markup, keep paragraph and list structure as lines
pub fn html_to_text(input: &str) -> String {
    if !looks_like_html(input) {
        return clean_text(input);
    }

    let marked = LINE_BREAKING_TAG.replace_all(input, "$0\n");
    let marked = LIST_ITEM_TAG.replace_all(&marked, "\n$0- ");

    let fragment = Html::parse_fragment(&marked);
    let text: String = fragment.root_element().text().collect();
    clean_text(&text)
}

fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
